//! Extraction error taxonomy.
//!
//! Callers branch on the variant: transport failures may be retried,
//! malformed responses and validation failures usually should not be.

use loop_core::ValidationError;
use thiserror::Error;

/// Errors returned by a [`crate::FactExtractor`].
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The service could not be reached, timed out, or answered non-2xx.
    #[error("transport error: {message}")]
    Transport {
        /// Error description (never contains the API key).
        message: String,
        /// HTTP status when the service answered.
        status: Option<u16>,
    },

    /// The service answered but the envelope or inner JSON had the wrong shape.
    #[error("malformed response: {message}")]
    MalformedResponse {
        /// What was missing or unexpected.
        message: String,
    },

    /// The shape was right but a fact field failed coercion.
    #[error("invalid fact: {0}")]
    Validation(#[from] ValidationError),

    /// The extractor is not configured (e.g. no API key).
    #[error("extractor configuration error: {message}")]
    Config {
        /// What is missing.
        message: String,
    },
}

impl ExtractError {
    /// Build a transport error from a `reqwest` failure, with the URL stripped.
    pub fn from_http(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else {
            err.without_url().to_string()
        };
        Self::Transport { message, status }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { status: None, .. } => true,
            Self::Transport {
                status: Some(code), ..
            } => *code == 429 || *code >= 500,
            Self::MalformedResponse { .. } | Self::Validation(_) | Self::Config { .. } => false,
        }
    }

    /// Error category string for logs.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::Validation(_) => "validation",
            Self::Config { .. } => "config",
        }
    }
}

/// Convenience type alias for extraction results.
pub type Result<T> = std::result::Result<T, ExtractError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
