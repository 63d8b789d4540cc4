//! Validation errors for candidate facts.

use thiserror::Error;

/// A candidate fact payload had a field that could not be coerced.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ValidationError {
    /// The payload itself was not a JSON object.
    #[error("fact payload must be an object, got {found}")]
    NotAnObject {
        /// JSON type that was found instead.
        found: &'static str,
    },

    /// A numeric field held something that is not a finite number.
    #[error("field `{field}` is not numeric: {value}")]
    NotNumeric {
        /// Field name.
        field: &'static str,
        /// Offending value, rendered as JSON.
        value: String,
    },

    /// A text field held a non-string value.
    #[error("field `{field}` must be a string, got {found}")]
    NotAString {
        /// Field name.
        field: &'static str,
        /// JSON type that was found instead.
        found: &'static str,
    },
}

/// Convenience type alias for validation results.
pub type Result<T> = std::result::Result<T, ValidationError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
