//! Core types shared by every resolution stage
//!
//! The core module holds the error system used throughout the crate:
//! - [`ResolverError`] - typed errors, each belonging to one [`ErrorClass`]
//! - [`ErrorContext`] - user-friendly wrapper with details and suggestions
//! - [`user_friendly_error`] - convert any `anyhow` error for terminal display
//!
//! Every fallible engine operation returns [`Result`], so callers can match on
//! the error variant or simply check [`ResolverError::class`].

pub mod error;

pub use error::{ConditionMismatch, ErrorClass, ErrorContext, ResolverError, user_friendly_error};

/// Result alias for resolution operations.
pub type Result<T, E = ResolverError> = std::result::Result<T, E>;
