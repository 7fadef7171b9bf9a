//! Error handling for the resolver
//!
//! This module provides the typed error returned by every resolution operation and the
//! user-facing wrapper used to present those errors. The error system follows two rules:
//! 1. **Strongly-typed errors** so hosts can branch on the failure class
//! 2. **Named culprits** so every message identifies the offending parameters or symbols
//!
//! # Error Classes
//!
//! Every [`ResolverError`] variant belongs to exactly one [`ErrorClass`]:
//! - **Template authoring**: the template's declared configuration is at fault
//!   (unresolvable cycles, malformed conditions, macros that cannot be evaluated).
//! - **Configuration**: a precedence rule or manifest entry is structurally invalid.
//! - **Invalid input**: the caller supplied parameter data the template cannot accept.
//! - **Internal**: an invariant of the data model was violated by the caller or loader.
//!
//! Evaluation-consistency problems that are not fatal are logged through `tracing`
//! and never surface as errors.
//!
//! # Examples
//!
//! ```rust,no_run
//! use scaffold_resolver::core::{ErrorClass, ResolverError, user_friendly_error};
//!
//! let error = ResolverError::SymbolCircle {
//!     names: vec!["M1".to_string(), "M2".to_string()],
//! };
//! assert_eq!(error.class(), ErrorClass::TemplateAuthoring);
//!
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Classification of a [`ResolverError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The template's declared configuration is at fault.
    TemplateAuthoring,
    /// A precedence rule or manifest entry is structurally invalid.
    Configuration,
    /// The caller supplied parameter data the template cannot accept.
    InvalidInput,
    /// A data-model invariant was violated; indicates a programming error.
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorClass::TemplateAuthoring => "template authoring error",
            ErrorClass::Configuration => "configuration error",
            ErrorClass::InvalidInput => "invalid input",
            ErrorClass::Internal => "internal error",
        };
        f.write_str(label)
    }
}

/// One parameter whose supplied condition results disagree with recomputation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionMismatch {
    /// Parameter name
    pub parameter: String,
    /// Which condition disagreed (`isEnabled` or `isRequired`)
    pub condition: &'static str,
    /// Result supplied by the caller
    pub supplied: Option<bool>,
    /// Result produced by recomputation
    pub computed: Option<bool>,
}

impl fmt::Display for ConditionMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} (supplied {}, computed {})",
            self.parameter,
            self.condition,
            format_result(self.supplied),
            format_result(self.computed)
        )
    }
}

fn format_result(result: Option<bool>) -> &'static str {
    match result {
        Some(true) => "true",
        Some(false) => "false",
        None => "none",
    }
}

/// The main error type for resolution operations
///
/// # Error Categories
///
/// ## Template authoring
/// - [`CircularParameterDependency`] - enablement conditions form a cycle that must be recomputed
/// - [`SymbolCircle`] - generated symbols reference each other cyclically
/// - [`MalformedCondition`] - a condition expression could not be evaluated
/// - [`MacroEvaluation`] - a generated symbol could not produce a value
/// - [`ConditionResultsMismatch`] - supplied condition results disagree (strict mode)
///
/// ## Configuration
/// - [`InvalidPrecedence`] - condition strings do not match the precedence rule
/// - [`DuplicateName`] - two parameters or symbols share a name
/// - [`ConfigLoad`] - the template manifest could not be read or parsed
///
/// ## Invalid input
/// - [`MissingRequiredParameters`] - required parameters have no value
///
/// ## Internal
/// - [`ConditionResultPresence`] - condition result presence differs from condition presence
/// - [`InvalidInputState`] - input state and value disagree
/// - [`UnmappedPrecedence`] - a precedence rule could not be mapped to a final precedence
///
/// [`CircularParameterDependency`]: ResolverError::CircularParameterDependency
/// [`SymbolCircle`]: ResolverError::SymbolCircle
/// [`MalformedCondition`]: ResolverError::MalformedCondition
/// [`MacroEvaluation`]: ResolverError::MacroEvaluation
/// [`ConditionResultsMismatch`]: ResolverError::ConditionResultsMismatch
/// [`InvalidPrecedence`]: ResolverError::InvalidPrecedence
/// [`DuplicateName`]: ResolverError::DuplicateName
/// [`ConfigLoad`]: ResolverError::ConfigLoad
/// [`MissingRequiredParameters`]: ResolverError::MissingRequiredParameters
/// [`ConditionResultPresence`]: ResolverError::ConditionResultPresence
/// [`InvalidInputState`]: ResolverError::InvalidInputState
/// [`UnmappedPrecedence`]: ResolverError::UnmappedPrecedence
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolverError {
    /// Enablement conditions depend on each other cyclically and at least one
    /// parameter in the cycle has to be recomputed after a disablement.
    #[error(
        "Parameter conditions contain a cyclic dependency that prevents deterministic evaluation: {}",
        cycle.join(" -> ")
    )]
    CircularParameterDependency {
        /// Parameter names along the cycle, ending with the first name again
        cycle: Vec<String>,
    },

    /// Generated symbols reference each other cyclically.
    #[error("Generated symbols contain a circular reference: symbol circle: {}", names.join(", "))]
    SymbolCircle {
        /// Names of the symbols that could not be ordered
        names: Vec<String>,
    },

    /// A condition could not be evaluated.
    #[error("Failed to evaluate condition '{condition}' of parameter '{parameter}': {reason}")]
    MalformedCondition {
        /// Parameter (or symbol) owning the condition
        parameter: String,
        /// The condition text
        condition: String,
        /// Evaluator diagnostic
        reason: String,
    },

    /// A generated symbol could not produce a value.
    #[error("Failed to evaluate generated symbol '{symbol}': {reason}")]
    MacroEvaluation {
        /// Symbol name
        symbol: String,
        /// What went wrong
        reason: String,
    },

    /// Condition results supplied by the host disagree with recomputation.
    #[error(
        "Supplied condition results are inconsistent with the template conditions: {}",
        mismatches.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    )]
    ConditionResultsMismatch {
        /// Every disagreeing parameter condition
        mismatches: Vec<ConditionMismatch>,
    },

    /// Condition strings do not match the declared precedence rule.
    #[error("Invalid precedence for parameter '{parameter}': {reason}")]
    InvalidPrecedence {
        /// Parameter name
        parameter: String,
        /// Which rule was broken
        reason: String,
    },

    /// The template configuration could not be loaded.
    #[error("Failed to load template configuration: {message}")]
    ConfigLoad {
        /// Top-level failure message
        message: String,
    },

    /// Two entries of a template share a name.
    #[error("Name '{name}' is declared more than once in the template")]
    DuplicateName {
        /// The duplicated name
        name: String,
    },

    /// Required parameters have no value.
    #[error("Mandatory parameters are missing values: {}", names.join(", "))]
    MissingRequiredParameters {
        /// Parameter names without values
        names: Vec<String>,
    },

    /// Condition result presence does not mirror condition presence.
    #[error(
        "Parameter '{parameter}': {condition} result must be present exactly when the {condition} condition is present"
    )]
    ConditionResultPresence {
        /// Parameter name
        parameter: String,
        /// Which condition (`isEnabled` or `isRequired`)
        condition: &'static str,
    },

    /// Input state and value disagree.
    #[error("Parameter '{parameter}': input state '{state}' does not match the supplied value")]
    InvalidInputState {
        /// Parameter name
        parameter: String,
        /// The declared input state
        state: String,
    },

    /// Final precedence cannot be computed for the parameter.
    #[error("Parameter '{parameter}': precedence cannot be mapped ({reason})")]
    UnmappedPrecedence {
        /// Parameter name
        parameter: String,
        /// What was missing
        reason: String,
    },
}

impl ResolverError {
    /// The class this error belongs to.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            ResolverError::CircularParameterDependency {
                ..
            }
            | ResolverError::SymbolCircle {
                ..
            }
            | ResolverError::MalformedCondition {
                ..
            }
            | ResolverError::MacroEvaluation {
                ..
            }
            | ResolverError::ConditionResultsMismatch {
                ..
            } => ErrorClass::TemplateAuthoring,
            ResolverError::InvalidPrecedence {
                ..
            }
            | ResolverError::ConfigLoad {
                ..
            }
            | ResolverError::DuplicateName {
                ..
            } => ErrorClass::Configuration,
            ResolverError::MissingRequiredParameters {
                ..
            } => ErrorClass::InvalidInput,
            ResolverError::ConditionResultPresence {
                ..
            }
            | ResolverError::InvalidInputState {
                ..
            }
            | ResolverError::UnmappedPrecedence {
                ..
            } => ErrorClass::Internal,
        }
    }

    /// Whether the template author, rather than the caller, is at fault.
    #[must_use]
    pub const fn is_template_authoring(&self) -> bool {
        matches!(self.class(), ErrorClass::TemplateAuthoring)
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// Wraps a [`ResolverError`] with optional details and a suggestion, the way a host
/// would present it on a terminal.
///
/// ```rust,no_run
/// use scaffold_resolver::core::{ErrorContext, ResolverError};
///
/// let context = ErrorContext::new(ResolverError::DuplicateName { name: "Name".into() })
///     .with_suggestion("Rename one of the entries")
///     .with_details("Parameters and generated symbols share one namespace");
///
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: ResolverError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: ResolverError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// - Error message: Red and bold
    /// - Details: Yellow
    /// - Suggestion: Green
    pub fn display(&self) {
        eprintln!("{}: {}", self.error.class().to_string().red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`]
///
/// Resolver errors get class-specific suggestions. Anything else is wrapped as a
/// configuration error carrying the full error chain as details, which covers
/// manifest I/O and parse failures raised through `anyhow`.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(resolver_error) = error.downcast_ref::<ResolverError>() {
        return create_error_context(resolver_error.clone());
    }

    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
    let mut context = ErrorContext::new(ResolverError::ConfigLoad {
        message: error.to_string(),
    });
    if !chain.is_empty() {
        context = context.with_details(chain.join("\n"));
    }
    if error.downcast_ref::<toml::de::Error>().is_some()
        || error.downcast_ref::<serde_json::Error>().is_some()
    {
        context = context.with_suggestion(
            "Check the template manifest syntax: quotes, brackets and field names",
        );
    }
    context
}

fn create_error_context(error: ResolverError) -> ErrorContext {
    match &error {
        ResolverError::CircularParameterDependency {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Break the cycle between the 'isEnabled' conditions listed above")
            .with_details(
                "A disabled parameter forces its dependents to be recomputed, which is impossible when they depend on each other",
            ),
        ResolverError::SymbolCircle {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Remove one of the references between the listed generated symbols"),
        ResolverError::MalformedCondition {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Fix the condition expression in the template manifest"),
        ResolverError::ConditionResultsMismatch {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Recompute condition results instead of reusing stale ones")
            .with_details("Enable lenient consistency checking to trust the supplied results"),
        ResolverError::MissingRequiredParameters {
            ..
        } => ErrorContext::new(error).with_suggestion("Provide values for the listed parameters"),
        ResolverError::ConditionResultPresence {
            ..
        }
        | ResolverError::InvalidInputState {
            ..
        }
        | ResolverError::UnmappedPrecedence {
            ..
        } => ErrorContext::new(error)
            .with_details("This indicates a bug in the host that built the evaluation input"),
        _ => ErrorContext::new(error),
    }
}
