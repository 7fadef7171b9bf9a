//! Scaffold Resolver - parameter and generated-symbol resolution for templates
//!
//! A code-scaffolding template declares parameters and generated symbols
//! ("macros"). Parameters carry a precedence that may depend on conditions over
//! other parameters; symbols compute values from parameters and from each
//! other. This crate decides, for one invocation, which parameters are enabled
//! and required, and in which order the symbols can be evaluated.
//!
//! # Architecture Overview
//!
//! - Conditions are written in a host-owned expression language. The crate
//!   talks to it through [`expression::ExpressionEvaluator`] and discovers the
//!   variables a condition reads by tracing the evaluation.
//! - [`parameters`] evaluates `isEnabled` conditions with a disablement
//!   cascade, then `isRequired` conditions, and maps the results to a final
//!   [`parameters::EvaluatedPrecedence`].
//! - [`macros`] orders generated symbols by their references and computes
//!   their values.
//! - [`resolver`] ties both together behind [`resolver::TemplateResolver`].
//!
//! # Core Modules
//!
//! - [`config`] - Template manifests (JSON or TOML) and resolver settings
//! - [`core`] - Error types, error classes and user-facing error context
//! - [`expression`] - Evaluator seam, variable snapshots, reference tracing
//! - [`parameters`] - Precedence rules, evaluation records, condition phases
//! - [`macros`] - Generated symbol kinds, ordering, evaluation, port registry
//! - [`resolver`] - Dependency graph and the end-to-end resolver
//!
//! # Manifest Format
//!
//! ```json
//! {
//!   "parameters": [
//!     { "name": "Framework", "defaultValue": "net8" },
//!     { "name": "UseHttps", "isEnabled": "Framework != 'net6'", "isRequired": true }
//!   ],
//!   "symbols": [
//!     { "name": "safeName", "generator": "processValueForm",
//!       "source": "name", "form": "safeName" }
//!   ]
//! }
//! ```
//!
//! # Logging
//!
//! The crate logs through [`tracing`]; hosts install their own subscriber.
//! Cascade decisions are logged at `debug`, per-symbol values at `trace`, and
//! tolerated anomalies (lenient consistency mismatches, port fallbacks,
//! harmless condition cycles) at `warn`.

// Core functionality
pub mod config;
pub mod core;
pub mod expression;

// Resolution
pub mod macros;
pub mod parameters;
pub mod resolver;

// test_utils is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use crate::core::{ErrorClass, ResolverError, Result};
pub use crate::resolver::{ResolvedTemplate, TemplateResolver};
