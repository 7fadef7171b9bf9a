//! Common test utilities for the resolver test suites
//!
//! Builds resolvers around the reference condition evaluator and writes
//! manifest files into temporary directories.

// Allow dead code because these utilities are used across different test files
// and not all utilities are used in every test file
#![allow(dead_code)]

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use scaffold_resolver::config::ResolverSettings;
use scaffold_resolver::macros::PortRegistry;
use scaffold_resolver::resolver::{ParameterInput, ParameterInputs, TemplateResolver};
use scaffold_resolver::test_utils::SimpleConditionEvaluator;

/// Shared evaluator instance; it is stateless.
pub static EVALUATOR: SimpleConditionEvaluator = SimpleConditionEvaluator;

/// Resolver with default settings and a fresh port registry.
pub fn resolver() -> TemplateResolver<'static> {
    resolver_with(ResolverSettings::default())
}

pub fn resolver_with(settings: ResolverSettings) -> TemplateResolver<'static> {
    TemplateResolver::new(&EVALUATOR, Arc::new(PortRegistry::new()), settings)
}

/// Lenient consistency checking.
pub fn lenient() -> ResolverSettings {
    ResolverSettings {
        strict_consistency: false,
        ..ResolverSettings::default()
    }
}

/// User inputs from name/value pairs.
pub fn inputs(pairs: &[(&str, Value)]) -> ParameterInputs {
    pairs.iter().map(|(name, value)| (name.to_string(), ParameterInput::user(value.clone()))).collect()
}

/// Temporary directory holding template manifest files.
pub struct TestTemplate {
    dir: TempDir,
}

impl TestTemplate {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new().context("Failed to create temp dir")?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `content` to `file_name` and return the full path.
    pub fn write(&self, file_name: &str, content: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(file_name);
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}
