//! Umbrella error for the pipeline.

use loop_core::ValidationError;
use loop_extract::ExtractError;
use loop_settings::SettingsError;
use loop_store::StoreError;
use thiserror::Error;

/// Errors surfaced by [`crate::Pipeline`].
#[derive(Debug, Error)]
pub enum LoopError {
    /// A candidate fact field failed coercion.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The extraction service was unreachable, slow, or answered non-2xx.
    #[error("transport error: {message}")]
    Transport {
        /// Error description.
        message: String,
        /// HTTP status when the service answered.
        status: Option<u16>,
    },

    /// The extraction service answered with an unexpected shape.
    #[error("malformed response: {message}")]
    MalformedResponse {
        /// What was missing or unexpected.
        message: String,
    },

    /// The store rejected or failed a read or write.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// Settings could not be loaded or are incomplete.
    #[error("configuration error: {message}")]
    Config {
        /// What is wrong.
        message: String,
    },
}

impl LoopError {
    /// Whether retrying the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { status: None, .. } => true,
            Self::Transport {
                status: Some(code), ..
            } => *code == 429 || *code >= 500,
            _ => false,
        }
    }

    /// Error category string for logs.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Transport { .. } => "transport",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::Storage(_) => "storage",
            Self::Config { .. } => "config",
        }
    }
}

impl From<ExtractError> for LoopError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::Transport { message, status } => Self::Transport { message, status },
            ExtractError::MalformedResponse { message } => Self::MalformedResponse { message },
            ExtractError::Validation(e) => Self::Validation(e),
            ExtractError::Config { message } => Self::Config { message },
        }
    }
}

impl From<SettingsError> for LoopError {
    fn from(err: SettingsError) -> Self {
        Self::Config {
            message: err.to_string(),
        }
    }
}

/// Convenience type alias for pipeline results.
pub type Result<T> = std::result::Result<T, LoopError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
