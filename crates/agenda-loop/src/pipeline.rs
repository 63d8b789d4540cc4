//! Capture ingestion and agenda queries.

use chrono::{DateTime, Utc};
use loop_core::logging::init_subscriber;
use loop_core::time::{is_storable, normalize, now};
use loop_core::{Capture, ContextFact};
use loop_extract::{FactExtractor, GeminiConfig, GeminiExtractor};
use loop_settings::LoopSettings;
use loop_store::{AgendaResolver, ContextFactStore, FactView, StoreError};
use tracing::{info, instrument, warn};

use crate::errors::Result;

/// Install the stderr `tracing` subscriber at the configured level.
///
/// `RUST_LOG` still takes precedence. Calling this more than once is a no-op.
pub fn init_logging(settings: &LoopSettings) {
    init_subscriber(&settings.logging.level);
}

/// Extraction adapter plus temporal store.
pub struct Pipeline<E> {
    store: ContextFactStore,
    extractor: E,
}

impl Pipeline<GeminiExtractor> {
    /// Open the configured store and build a Gemini extractor.
    pub fn from_settings(settings: &LoopSettings) -> Result<Self> {
        let config = GeminiConfig::from_settings(&settings.extractor)?;
        let store = ContextFactStore::from_settings(&settings.store)?;
        Ok(Self::new(store, GeminiExtractor::new(config)))
    }
}

impl<E: FactExtractor> Pipeline<E> {
    /// Combine an initialized store with an extractor.
    pub fn new(store: ContextFactStore, extractor: E) -> Self {
        Self { store, extractor }
    }

    /// The underlying store.
    pub fn store(&self) -> &ContextFactStore {
        &self.store
    }

    /// Category views over the store.
    pub fn resolver(&self) -> AgendaResolver<'_> {
        AgendaResolver::new(&self.store)
    }

    /// Extract facts from `capture` and version them into the store.
    ///
    /// Extraction and storage share one timestamp (default now), so every
    /// returned fact has `valid_from` equal to the time its version opened.
    /// A request time the store cannot encode fails before the service is
    /// called. Nothing is written when extraction fails. Storage is not atomic
    /// across the batch: facts before a failing one stay written.
    #[instrument(skip_all, fields(capture_id = %capture.capture_id))]
    pub async fn ingest(
        &self,
        capture: &Capture,
        request_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<ContextFact>> {
        let at = request_time.map_or_else(now, normalize);
        if !is_storable(at) {
            return Err(StoreError::TimestampOutOfRange { timestamp: at }.into());
        }

        let facts = self.extractor.extract(capture, Some(at)).await?;
        if let Err(e) = self.store.upsert_many(&facts, Some(at)) {
            warn!(error = %e, "storing extracted facts failed");
            return Err(e.into());
        }

        info!(count = facts.len(), "capture ingested");
        Ok(facts)
    }

    /// Agenda-relevant facts active at `reference_time`, ready for display.
    pub fn agenda(&self, reference_time: Option<DateTime<Utc>>) -> Result<Vec<FactView>> {
        let records = self.resolver().agenda_overview(reference_time)?;
        Ok(AgendaResolver::format_for_response(&records))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use loop_extract::ExtractError;

    use crate::LoopError;

    /// Returns fixed facts stamped like a real extractor would.
    struct Canned(Vec<(&'static str, &'static str)>);

    #[async_trait::async_trait]
    impl FactExtractor for Canned {
        async fn extract(
            &self,
            capture: &Capture,
            request_time: Option<DateTime<Utc>>,
        ) -> loop_extract::Result<Vec<ContextFact>> {
            Ok(self
                .0
                .iter()
                .map(|(category, detail)| {
                    let mut fact = ContextFact::new(*category, *detail, capture.capture_id.clone());
                    fact.valid_from = request_time;
                    fact
                })
                .collect())
        }
    }

    struct Failing;

    #[async_trait::async_trait]
    impl FactExtractor for Failing {
        async fn extract(
            &self,
            _capture: &Capture,
            _request_time: Option<DateTime<Utc>>,
        ) -> loop_extract::Result<Vec<ContextFact>> {
            Err(ExtractError::Transport {
                message: "connection refused".into(),
                status: None,
            })
        }
    }

    #[tokio::test]
    async fn ingest_stores_with_request_time() {
        let store = ContextFactStore::in_memory().unwrap();
        let pipeline = Pipeline::new(store, Canned(vec![("schedule", "Standup"), ("notes", "Lunch")]));
        let t = now();

        let facts = pipeline.ingest(&Capture::new("cap-1", "..."), Some(t)).await.unwrap();
        assert_eq!(facts.len(), 2);
        assert!(facts.iter().all(|f| f.valid_from == Some(t)));

        let active = pipeline.store().get_active_facts(Some(t)).unwrap();
        assert_eq!(active.len(), 2);
        assert!(active.iter().all(|r| r.valid_from == t));

        let agenda = pipeline.agenda(Some(t)).unwrap();
        assert_eq!(agenda.len(), 1);
        assert_eq!(agenda[0].detail, "Standup");
    }

    #[tokio::test]
    async fn failed_extraction_writes_nothing() {
        let pipeline = Pipeline::new(ContextFactStore::in_memory().unwrap(), Failing);
        let err = pipeline.ingest(&Capture::new("cap-1", "..."), None).await.unwrap_err();
        assert_matches!(err, LoopError::Transport { .. });
        assert_eq!(pipeline.store().count_records().unwrap(), 0);
    }

    #[tokio::test]
    async fn unstorable_request_time_skips_extraction() {
        let pipeline = Pipeline::new(ContextFactStore::in_memory().unwrap(), Failing);
        let far = chrono::TimeZone::with_ymd_and_hms(&Utc, 10_000, 1, 1, 0, 0, 0).unwrap();
        let err = pipeline.ingest(&Capture::new("cap-1", "..."), Some(far)).await.unwrap_err();
        assert_matches!(err, LoopError::Storage(StoreError::TimestampOutOfRange { .. }));
    }

    #[test]
    fn from_settings_requires_api_key() {
        let err = Pipeline::from_settings(&LoopSettings::default()).err().unwrap();
        assert_matches!(err, LoopError::Config { .. });
    }
}
