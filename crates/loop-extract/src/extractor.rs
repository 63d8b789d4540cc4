//! The extraction adapter contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use loop_core::{Capture, ContextFact};

use crate::errors::Result;

/// Turns an unstructured capture into candidate facts.
///
/// Every returned fact carries `capture.capture_id` and `valid_from` equal to
/// the request time (default now). Implementations do not retry; the caller
/// owns retry policy, using [`crate::ExtractError::is_retryable`].
#[async_trait]
pub trait FactExtractor: Send + Sync {
    /// Extract facts from `capture`.
    async fn extract(
        &self,
        capture: &Capture,
        request_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<ContextFact>>;
}
