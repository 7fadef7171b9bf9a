//! Test utilities for the resolver
//!
//! This module provides helpers shared by unit and integration tests:
//! - one-time tracing initialisation that cooperates with the test harness
//! - [`SimpleConditionEvaluator`], a small C-like condition language standing
//!   in for the host's expression evaluator
//! - record and symbol builders for concise test setup
//!
//! # Example
//!
//! ```rust,no_run
//! use scaffold_resolver::parameters::ParameterConditionEvaluator;
//! use scaffold_resolver::test_utils::{SimpleConditionEvaluator, init_test_logging};
//!
//! init_test_logging(None);
//! let evaluator = SimpleConditionEvaluator;
//! let conditions = ParameterConditionEvaluator::new(&evaluator);
//! ```

pub mod evaluator;
pub mod fixtures;

pub use evaluator::SimpleConditionEvaluator;
pub use fixtures::{disabled_when_not, record, record_without_value, symbol};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=scaffold_resolver=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
