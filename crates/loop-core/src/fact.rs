//! Candidate context facts and their versioning identity.
//!
//! A [`ContextFact`] is what the extraction service hands back: a categorized
//! claim with a confidence score. It has no validity window yet; the store
//! assigns one when the fact is upserted.
//!
//! Versioning is keyed on [`FactIdentity`], the tuple
//! `(category, detail, time_range, location)`. Changing the wording of
//! `detail` therefore starts a new lineage instead of superseding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::capture::CaptureId;
use crate::category::Category;
use crate::errors::{Result, ValidationError};

/// A structured claim extracted from a capture.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextFact {
    /// Category tag.
    pub category: Category,
    /// Free-text description.
    pub detail: String,
    /// Free-text time descriptor (not a parsed interval).
    pub time_range: Option<String>,
    /// Where the fact applies.
    pub location: Option<String>,
    /// Extraction confidence, expected in `[0, 1]` but not clamped.
    pub confidence: f64,
    /// Capture this fact was extracted from.
    pub source_capture_id: CaptureId,
    /// Request time stamped by the extractor, if any.
    pub valid_from: Option<DateTime<Utc>>,
}

impl ContextFact {
    /// Create a fact with no time range, location, or timestamp and zero confidence.
    pub fn new(
        category: impl Into<Category>,
        detail: impl Into<String>,
        source_capture_id: impl Into<CaptureId>,
    ) -> Self {
        Self {
            category: category.into(),
            detail: detail.into(),
            time_range: None,
            location: None,
            confidence: 0.0,
            source_capture_id: source_capture_id.into(),
            valid_from: None,
        }
    }

    /// Set the time range.
    #[must_use]
    pub fn with_time_range(mut self, time_range: impl Into<String>) -> Self {
        self.time_range = Some(time_range.into());
        self
    }

    /// Set the location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the confidence.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Build a candidate from a loosely-typed payload.
    ///
    /// Missing `category` becomes `"unspecified"`, missing `detail` becomes
    /// `""`, missing `confidence` becomes `0.0`. `confidence` may be a JSON
    /// number or a numeric string; anything else, including `null` and
    /// non-finite values, is rejected.
    pub fn from_payload(
        payload: &Value,
        source_capture_id: &CaptureId,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let Value::Object(map) = payload else {
            return Err(ValidationError::NotAnObject {
                found: json_type_name(payload),
            });
        };

        let category = optional_string(map, "category")?
            .map_or_else(Category::unspecified, Category::from);
        let detail = optional_string(map, "detail")?.unwrap_or_default();
        let time_range = optional_string(map, "time_range")?;
        let location = optional_string(map, "location")?;
        let confidence = match map.get("confidence") {
            None => 0.0,
            Some(value) => coerce_f64("confidence", value)?,
        };

        Ok(Self {
            category,
            detail,
            time_range,
            location,
            confidence,
            source_capture_id: source_capture_id.clone(),
            valid_from: timestamp,
        })
    }

    /// The identity tuple this fact is versioned under.
    #[must_use]
    pub fn identity(&self) -> FactIdentity {
        FactIdentity {
            category: self.category.clone(),
            detail: self.detail.clone(),
            time_range: self.time_range.clone(),
            location: self.location.clone(),
        }
    }
}

/// The `(category, detail, time_range, location)` key deciding supersession.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactIdentity {
    /// Category tag.
    pub category: Category,
    /// Free-text description.
    pub detail: String,
    /// Optional time descriptor.
    pub time_range: Option<String>,
    /// Optional location.
    pub location: Option<String>,
}

impl FactIdentity {
    /// Field-wise equality where two absent optional fields are equal.
    ///
    /// This is exactly `==` on the Rust side; it is spelled out because the
    /// SQL side has to reproduce it with `IS` rather than `=`.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        self.category == other.category
            && self.detail == other.detail
            && self.time_range.as_deref() == other.time_range.as_deref()
            && self.location.as_deref() == other.location.as_deref()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Coercion helpers
// ─────────────────────────────────────────────────────────────────────────────

/// `None` for a missing or null key, the string for a string, error otherwise.
fn optional_string(map: &Map<String, Value>, field: &'static str) -> Result<Option<String>> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ValidationError::NotAString {
            field,
            found: json_type_name(other),
        }),
    }
}

fn coerce_f64(field: &'static str, value: &Value) -> Result<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| ValidationError::NotNumeric {
            field,
            value: value.to_string(),
        })
}

/// JSON type name for error messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
