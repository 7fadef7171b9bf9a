//! Integration test suite for the resolver
//!
//! End-to-end tests that drive [`TemplateResolver`] through manifests and
//! caller inputs, using the reference condition evaluator from
//! `scaffold_resolver::test_utils`.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **scenarios**: Disablement, cascades, symbol ordering and cycles, consistency
//! - **cascade**: Multi-level disablement cascades through the full resolver
//! - **consistency**: Supplied condition results in strict and lenient mode
//! - **manifest_loading**: JSON and TOML manifests on disk
//! - **ports**: Port symbols sharing one registry
//!
//! [`TemplateResolver`]: scaffold_resolver::resolver::TemplateResolver

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod cascade;
mod consistency;
mod manifest_loading;
mod ports;
mod scenarios;
