//! Stored, versioned fact records.

use std::fmt;

use chrono::{DateTime, Utc};
use loop_core::{CaptureId, Category, FactIdentity};
use serde::{Deserialize, Serialize};

/// Auto-incrementing row identifier of a stored version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One version of a fact inside the store.
///
/// `valid_to == None` means the version is still open. Once `valid_to` is
/// set the record never changes again.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextFactRecord {
    /// Row identifier.
    pub id: RecordId,
    /// Category tag.
    pub category: Category,
    /// Free-text description.
    pub detail: String,
    /// Free-text time descriptor.
    pub time_range: Option<String>,
    /// Location.
    pub location: Option<String>,
    /// Extraction confidence.
    pub confidence: f64,
    /// Capture the version was extracted from.
    pub source_capture_id: CaptureId,
    /// Start of the validity window (inclusive).
    pub valid_from: DateTime<Utc>,
    /// End of the validity window (exclusive), `None` while open.
    pub valid_to: Option<DateTime<Utc>>,
}

impl ContextFactRecord {
    /// The identity tuple this record was versioned under.
    #[must_use]
    pub fn identity(&self) -> FactIdentity {
        FactIdentity {
            category: self.category.clone(),
            detail: self.detail.clone(),
            time_range: self.time_range.clone(),
            location: self.location.clone(),
        }
    }

    /// Whether the record has not been superseded yet.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.valid_to.is_none()
    }

    /// Whether `at` falls inside `[valid_from, valid_to)`.
    #[must_use]
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.valid_from <= at && self.valid_to.is_none_or(|end| end > at)
    }
}
