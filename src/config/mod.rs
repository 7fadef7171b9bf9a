//! Template manifests and resolver settings.
//!
//! A [`TemplateManifest`] is the serialized form of a template's parameters
//! and generated symbols. It loads from JSON or TOML:
//!
//! ```toml
//! [[parameters]]
//! name = "Framework"
//! defaultValue = "net8"
//!
//! [[parameters]]
//! name = "UseHttps"
//! dataType = "bool"
//! isEnabled = "Framework != 'net6'"
//! isRequired = true
//!
//! [[symbols]]
//! name = "port"
//! generator = "port"
//! fallback = 5000
//! ```
//!
//! Parameter entries carry `isRequired`, `isEnabled` and `implicit`, which
//! [`ParameterSymbol::precedence`] folds into a validated [`PrecedenceRule`].
//!
//! [`ResolverSettings`] tunes the resolver itself and is usually loaded with
//! [`parse_config`].

pub mod parser;

pub use parser::{ConfigFormat, parse_config, parse_str};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

use crate::core::{ResolverError, Result};
use crate::macros::GeneratedSymbol;
use crate::parameters::{ParameterDefinition, PrecedenceDefinition, PrecedenceRule};

/// A literal flag or a condition expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagOrCondition {
    Flag(bool),
    Condition(String),
}

impl FlagOrCondition {
    /// Literal `"true"`/`"false"` strings count as flags; blank strings as
    /// absent.
    fn normalize(&self) -> Option<FlagOrCondition> {
        match self {
            FlagOrCondition::Flag(flag) => Some(FlagOrCondition::Flag(*flag)),
            FlagOrCondition::Condition(c) if c.trim().is_empty() => None,
            FlagOrCondition::Condition(c) if c.trim().eq_ignore_ascii_case("true") => {
                Some(FlagOrCondition::Flag(true))
            }
            FlagOrCondition::Condition(c) if c.trim().eq_ignore_ascii_case("false") => {
                Some(FlagOrCondition::Flag(false))
            }
            FlagOrCondition::Condition(c) => Some(FlagOrCondition::Condition(c.clone())),
        }
    }
}

/// A parameter entry of a template manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSymbol {
    pub name: String,
    #[serde(default = "default_data_type")]
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_required: Option<FlagOrCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<FlagOrCondition>,
    #[serde(default)]
    pub implicit: bool,
}

fn default_data_type() -> String {
    "string".to_string()
}

impl ParameterSymbol {
    /// Fold the `isEnabled`, `isRequired` and `implicit` fields into a rule.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::InvalidPrecedence`] when the combination is
    /// not a valid rule.
    pub fn precedence(&self) -> Result<PrecedenceRule> {
        let is_required = self.is_required.as_ref().and_then(FlagOrCondition::normalize);
        let is_enabled = self.is_enabled.as_ref().and_then(FlagOrCondition::normalize);

        let (required_condition, required_flag) = match is_required {
            Some(FlagOrCondition::Condition(c)) => (Some(c), false),
            Some(FlagOrCondition::Flag(flag)) => (None, flag),
            None => (None, false),
        };

        match is_enabled {
            Some(FlagOrCondition::Flag(false)) => {
                PrecedenceRule::unconditional(&self.name, PrecedenceDefinition::Disabled)
            }
            Some(FlagOrCondition::Condition(enabled)) => PrecedenceRule::new(
                &self.name,
                PrecedenceDefinition::ConditionallyDisabled,
                required_condition,
                Some(enabled),
                required_flag,
            ),
            Some(FlagOrCondition::Flag(true)) | None => {
                if required_condition.is_some() {
                    PrecedenceRule::new(
                        &self.name,
                        PrecedenceDefinition::ConditionallyRequired,
                        required_condition,
                        None,
                        false,
                    )
                } else if required_flag {
                    PrecedenceRule::unconditional(&self.name, PrecedenceDefinition::Required)
                } else if self.implicit {
                    PrecedenceRule::unconditional(&self.name, PrecedenceDefinition::Implicit)
                } else {
                    PrecedenceRule::unconditional(&self.name, PrecedenceDefinition::Optional)
                }
            }
        }
    }

    /// Build the immutable definition used during resolution.
    ///
    /// # Errors
    ///
    /// See [`precedence`](Self::precedence).
    pub fn to_definition(&self) -> Result<ParameterDefinition> {
        let mut definition = ParameterDefinition::new(&self.name, self.precedence()?)
            .with_data_type(&self.data_type)
            .with_choices(self.choices.iter().cloned());
        if let Some(default_value) = &self.default_value {
            definition = definition.with_default(default_value.clone());
        }
        Ok(definition)
    }
}

/// Parameters and generated symbols of one template.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateManifest {
    #[serde(default)]
    pub parameters: Vec<ParameterSymbol>,
    #[serde(default)]
    pub symbols: Vec<GeneratedSymbol>,
}

impl TemplateManifest {
    pub fn from_json_str(content: &str) -> anyhow::Result<Self> {
        parse_str(content, ConfigFormat::Json).context("Failed to parse template manifest JSON")
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        parse_str(content, ConfigFormat::Toml).context("Failed to parse template manifest TOML")
    }

    /// Load a manifest file; `.json` files are JSON, everything else TOML.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let manifest: Self = parse_config(path)?;
        tracing::debug!(
            "Loaded manifest {} with {} parameters and {} symbols",
            path.display(),
            manifest.parameters.len(),
            manifest.symbols.len()
        );
        Ok(manifest)
    }

    /// Check that names are unique and every parameter has a valid rule.
    ///
    /// # Errors
    ///
    /// - [`ResolverError::DuplicateName`] for a name used twice across
    ///   parameters and symbols
    /// - [`ResolverError::InvalidPrecedence`] for a bad parameter rule
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        let names = self
            .parameters
            .iter()
            .map(|p| p.name.as_str())
            .chain(self.symbols.iter().map(|s| s.name.as_str()));
        for name in names {
            if !seen.insert(name) {
                return Err(ResolverError::DuplicateName {
                    name: name.to_string(),
                });
            }
        }
        for parameter in &self.parameters {
            parameter.precedence()?;
        }
        Ok(())
    }

    /// Definitions of all parameters, in declared order.
    ///
    /// # Errors
    ///
    /// See [`ParameterSymbol::precedence`].
    pub fn parameter_definitions(&self) -> Result<Vec<ParameterDefinition>> {
        self.parameters.iter().map(ParameterSymbol::to_definition).collect()
    }
}

/// Tuning knobs of the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverSettings {
    /// Fail when supplied condition results disagree with the conditions.
    pub strict_consistency: bool,
    pub port_range_low: u16,
    pub port_range_high: u16,
    /// Random candidates tried per `port` symbol.
    pub port_attempts: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            strict_consistency: true,
            port_range_low: 1024,
            port_range_high: 65535,
            port_attempts: 64,
        }
    }
}
