//! Upstream capture events.
//!
//! A [`Capture`] is owned by the caller and never persisted by the store;
//! facts only keep a back-reference to it through [`CaptureId`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of the capture a fact was extracted from.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaptureId(String);

impl CaptureId {
    /// Create a new random ID (UUID v7, time-ordered).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Return the inner string as a slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume self and return the inner `String`.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Default for CaptureId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<str> for CaptureId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaptureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CaptureId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CaptureId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// An upstream event (e.g. a transcribed call) to be distilled into facts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Capture {
    /// Unique identifier.
    pub capture_id: CaptureId,
    /// Transcript text.
    pub transcript: String,
    /// Where the capture came from (`"call"`, `"voice-memo"`, ...).
    pub source: Option<String>,
    /// When the capture was recorded.
    pub created_at: Option<DateTime<Utc>>,
}

impl Capture {
    /// Create a capture with no source label or creation time.
    pub fn new(capture_id: impl Into<CaptureId>, transcript: impl Into<String>) -> Self {
        Self {
            capture_id: capture_id.into(),
            transcript: transcript.into(),
            source: None,
            created_at: None,
        }
    }

    /// Set the source label.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the creation timestamp.
    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
