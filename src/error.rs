//! Error handling for the harness
//!
//! Errors fall into a small taxonomy:
//! - Configuration errors (malformed constructor parameters, arity mismatches,
//!   unknown properties, bad seeds) are fatal and never retried
//! - Unsupported types mean the caller has to register a value override
//! - Conversion and invocation errors come out of the dynamic value bridge
//!
//! Assertion failures and skips are not errors; they travel as
//! [`crate::outcome::Interrupt`] values inside a running check.

use thiserror::Error;

/// Result type for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors raised while describing, synthesizing or invoking
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HarnessError {
    /// Constructor parameter types and property names differ in length
    #[error(
        "malformed constructor parameters: {types} parameter types but {names} property names"
    )]
    MalformedConstructorParameters { types: usize, names: usize },

    /// Generic container carries the wrong number of type arguments
    #[error("{container} requires {expected} type argument(s), got {actual}")]
    ArityMismatch {
        container: String,
        expected: usize,
        actual: usize,
    },

    /// Enumeration descriptor without any variant
    #[error("enumeration '{name}' declares no variants")]
    EmptyEnumeration { name: String },

    /// No value can be synthesized for the type
    #[error("no test value available for type {ty}; register an override on the value factory")]
    UnsupportedType { ty: String },

    /// Property resolves to neither a field nor a getter
    #[error("property '{property}' not found as field or getter on {class}")]
    PropertyNotFound { class: String, property: String },

    /// No constructor with the requested signature was registered
    #[error("{class} has no constructor with parameter types {signature}")]
    NoSuchConstructor { class: String, signature: String },

    /// No method with the requested name and signature was registered
    #[error("{class} has no method {method}")]
    NoSuchMethod { class: String, method: String },

    /// Seed variable present but not an integer
    #[error("invalid seed in {variable}: '{value}' is not a 64-bit integer")]
    InvalidSeed { variable: String, value: String },

    /// Harness configuration rejected
    #[error("invalid harness configuration: {message}")]
    InvalidConfig { message: String },

    /// Dynamic value does not fit the requested static type
    #[error("cannot convert {found} into {expected}")]
    Conversion { expected: String, found: String },

    /// Registered accessor or constructor was called with unusable arguments
    #[error("invocation of {target} failed: {message}")]
    Invocation { target: String, message: String },
}

impl HarnessError {
    /// Configuration errors are fatal for the whole check, never a test verdict
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            HarnessError::MalformedConstructorParameters { .. }
                | HarnessError::ArityMismatch { .. }
                | HarnessError::EmptyEnumeration { .. }
                | HarnessError::PropertyNotFound { .. }
                | HarnessError::NoSuchConstructor { .. }
                | HarnessError::NoSuchMethod { .. }
                | HarnessError::InvalidSeed { .. }
                | HarnessError::InvalidConfig { .. }
        )
    }

    pub(crate) fn conversion(expected: impl Into<String>, found: impl Into<String>) -> Self {
        HarnessError::Conversion {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn invocation(target: impl Into<String>, message: impl Into<String>) -> Self {
        HarnessError::Invocation {
            target: target.into(),
            message: message.into(),
        }
    }
}
