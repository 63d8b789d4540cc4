//! Read-side views over the active fact snapshot.
//!
//! Category groupings are named constants here. A consumer that needs a new
//! slice of the active facts gets a new grouping and a new view in this
//! module rather than filtering ad hoc.

use chrono::{DateTime, Utc};
use loop_core::Category;
use loop_core::time::format_timestamp;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::record::ContextFactRecord;
use crate::store::ContextFactStore;

/// Categories feeding the schedule view.
pub const SCHEDULE_CATEGORIES: &[&str] = &[Category::SCHEDULE];

/// Categories relevant to agenda and scheduling decisions.
pub const AGENDA_CATEGORIES: &[&str] = &[
    Category::SCHEDULE,
    Category::AVAILABILITY,
    Category::AGENDA,
    Category::REMINDER,
];

/// Categories feeding the availability view.
pub const AVAILABILITY_CATEGORIES: &[&str] = &[Category::AVAILABILITY];

/// Categories feeding the reminders view.
pub const REMINDER_CATEGORIES: &[&str] = &[Category::REMINDER];

/// Plain key-value projection of a stored fact for presentation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FactView {
    /// Category tag.
    pub category: String,
    /// Free-text description.
    pub detail: String,
    /// Time descriptor.
    pub time_range: Option<String>,
    /// Location.
    pub location: Option<String>,
    /// Extraction confidence.
    pub confidence: f64,
    /// Source capture.
    pub source_capture_id: String,
    /// Window start, RFC 3339.
    pub valid_from: Option<String>,
    /// Window end, RFC 3339, `None` while active.
    pub valid_to: Option<String>,
}

impl From<&ContextFactRecord> for FactView {
    fn from(record: &ContextFactRecord) -> Self {
        Self {
            category: record.category.to_string(),
            detail: record.detail.clone(),
            time_range: record.time_range.clone(),
            location: record.location.clone(),
            confidence: record.confidence,
            source_capture_id: record.source_capture_id.to_string(),
            valid_from: Some(format_timestamp(record.valid_from)),
            valid_to: record.valid_to.map(format_timestamp),
        }
    }
}

/// Agenda-oriented views over a [`ContextFactStore`].
pub struct AgendaResolver<'a> {
    store: &'a ContextFactStore,
}

impl<'a> AgendaResolver<'a> {
    /// Wrap a store.
    pub fn new(store: &'a ContextFactStore) -> Self {
        Self { store }
    }

    /// Active facts whose category is one of `categories`, in snapshot order.
    pub fn active_in(
        &self,
        categories: &[&str],
        reference_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<ContextFactRecord>> {
        Ok(self
            .store
            .get_active_facts(reference_time)?
            .into_iter()
            .filter(|fact| fact.category.is_any_of(categories))
            .collect())
    }

    /// Active facts with category `"schedule"`.
    pub fn active_schedule(&self, reference_time: Option<DateTime<Utc>>) -> Result<Vec<ContextFactRecord>> {
        self.active_in(SCHEDULE_CATEGORIES, reference_time)
    }

    /// Active facts in [`AGENDA_CATEGORIES`].
    pub fn agenda_overview(&self, reference_time: Option<DateTime<Utc>>) -> Result<Vec<ContextFactRecord>> {
        self.active_in(AGENDA_CATEGORIES, reference_time)
    }

    /// Active facts with category `"availability"`.
    pub fn availability(&self, reference_time: Option<DateTime<Utc>>) -> Result<Vec<ContextFactRecord>> {
        self.active_in(AVAILABILITY_CATEGORIES, reference_time)
    }

    /// Active facts with category `"reminder"`.
    pub fn reminders(&self, reference_time: Option<DateTime<Utc>>) -> Result<Vec<ContextFactRecord>> {
        self.active_in(REMINDER_CATEGORIES, reference_time)
    }

    /// Project records for presentation. Pure; no store access.
    pub fn format_for_response<'r, I>(facts: I) -> Vec<FactView>
    where
        I: IntoIterator<Item = &'r ContextFactRecord>,
    {
        facts.into_iter().map(FactView::from).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use loop_core::ContextFact;

    fn t1() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    fn seeded() -> ContextFactStore {
        let store = ContextFactStore::in_memory().unwrap();
        let facts = [
            ContextFact::new("agenda", "Prepare quarterly review", "cap-1")
                .with_time_range("Q1")
                .with_confidence(0.85),
            ContextFact::new("other", "Unrelated note", "cap-2").with_confidence(0.5),
            ContextFact::new("schedule", "Dentist", "cap-3").with_time_range("Tue 10am"),
            ContextFact::new("availability", "Out Monday", "cap-3"),
            ContextFact::new("reminder", "Renew passport", "cap-4"),
        ];
        store.upsert_many(facts.iter(), Some(t1())).unwrap();
        store
    }

    #[test]
    fn agenda_overview_excludes_other_categories() {
        let store = seeded();
        let resolver = AgendaResolver::new(&store);
        let agenda = resolver.agenda_overview(Some(t1() + Duration::minutes(1))).unwrap();
        assert_eq!(agenda.len(), 4);
        assert!(agenda.iter().all(|f| f.category != "other"));
    }

    #[test]
    fn agenda_is_subset_of_snapshot() {
        let store = seeded();
        let at = Some(t1() + Duration::minutes(1));
        let all = store.get_active_facts(at).unwrap();
        let agenda = AgendaResolver::new(&store).agenda_overview(at).unwrap();
        let expected: Vec<_> = all
            .into_iter()
            .filter(|f| f.category.is_any_of(AGENDA_CATEGORIES))
            .collect();
        assert_eq!(agenda, expected);
    }

    #[test]
    fn schedule_is_exact_match() {
        let store = seeded();
        let schedule = AgendaResolver::new(&store)
            .active_schedule(Some(t1() + Duration::minutes(1)))
            .unwrap();
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].detail, "Dentist");
    }

    #[test]
    fn named_views() {
        let store = seeded();
        let resolver = AgendaResolver::new(&store);
        let at = Some(t1());
        assert_eq!(resolver.availability(at).unwrap()[0].detail, "Out Monday");
        assert_eq!(resolver.reminders(at).unwrap()[0].detail, "Renew passport");
    }

    #[test]
    fn views_before_first_fact_are_empty() {
        let store = seeded();
        let resolver = AgendaResolver::new(&store);
        assert!(resolver.agenda_overview(Some(t1() - Duration::seconds(1))).unwrap().is_empty());
    }

    #[test]
    fn format_for_response_renders_timestamps() {
        let store = seeded();
        let resolver = AgendaResolver::new(&store);
        let agenda = resolver
            .active_in(&[Category::AGENDA], Some(t1() + Duration::minutes(1)))
            .unwrap();
        let formatted = AgendaResolver::format_for_response(&agenda);
        assert_eq!(formatted.len(), 1);
        assert_eq!(formatted[0].category, "agenda");
        assert_eq!(formatted[0].detail, "Prepare quarterly review");
        assert_eq!(formatted[0].time_range.as_deref(), Some("Q1"));
        assert_eq!(formatted[0].valid_from.as_deref(), Some("2024-01-01T09:00:00.000000Z"));
        assert!(formatted[0].valid_to.is_none());
    }

    #[test]
    fn format_for_response_serializes_nulls() {
        let store = seeded();
        let records = store.get_active_facts(Some(t1())).unwrap();
        let json = serde_json::to_value(AgendaResolver::format_for_response(&records)).unwrap();
        let note = json
            .as_array()
            .unwrap()
            .iter()
            .find(|v| v["category"] == "other")
            .unwrap();
        assert!(note["location"].is_null());
        assert!(note["valid_to"].is_null());
        assert_eq!(note["source_capture_id"], "cap-2");
    }
}
