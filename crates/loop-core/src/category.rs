//! Open-ended fact category tag.
//!
//! The extraction service may introduce categories we have never seen, so
//! [`Category`] wraps any string. The well-known tags are associated
//! constants; groupings of them live in the resolver.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category tag of a context fact (`"schedule"`, `"agenda"`, or anything else).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// Concrete scheduled events.
    pub const SCHEDULE: &'static str = "schedule";
    /// When the subject is or is not available.
    pub const AVAILABILITY: &'static str = "availability";
    /// Items to discuss or prepare.
    pub const AGENDA: &'static str = "agenda";
    /// Things to be reminded of.
    pub const REMINDER: &'static str = "reminder";
    /// Placeholder used when a payload carries no category.
    pub const UNSPECIFIED: &'static str = "unspecified";

    /// Create a category from any tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The `"unspecified"` sentinel.
    #[must_use]
    pub fn unspecified() -> Self {
        Self(Self::UNSPECIFIED.to_owned())
    }

    /// Return the tag as a slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is one of the given tags.
    #[must_use]
    pub fn is_any_of(&self, tags: &[&str]) -> bool {
        tags.contains(&self.0.as_str())
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::unspecified()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Category {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Category {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Category {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        Self(s)
    }
}
