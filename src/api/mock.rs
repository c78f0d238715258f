//! In-memory prescriptions backend used for development and tests.
//!
//! Serves a fixed set of prescriptions, simulates network latency and
//! evaluates refill eligibility locally. Refills are recorded in an audit
//! list but never change the remaining refill count.

use crate::api::PrescriptionsApi;
use crate::error::ApiError;
use crate::models::{Prescription, RefillRecord, RefillResponse};
use crate::utils::{self, Expiry};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use time::{Date, OffsetDateTime};

const FIXTURES: &str = include_str!("fixtures.json");

pub const NOT_FOUND_MESSAGE: &str = "Prescription not found";
pub const NO_REFILLS_MESSAGE: &str = "No refills remaining for this prescription";
pub const EXPIRED_MESSAGE: &str = "Cannot refill an expired prescription";
pub const UNKNOWN_EXPIRY_MESSAGE: &str = "Cannot verify the expiry date for this prescription";

/// Artificial delays applied before each mock operation completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latency {
    pub list: Duration,
    pub by_id: Duration,
    pub refill: Duration,
}

impl Latency {
    pub const fn none() -> Self {
        Self {
            list: Duration::ZERO,
            by_id: Duration::ZERO,
            refill: Duration::ZERO,
        }
    }
}

impl Default for Latency {
    fn default() -> Self {
        Self {
            list: Duration::from_millis(300),
            by_id: Duration::from_millis(200),
            refill: Duration::from_millis(1000),
        }
    }
}

pub struct MockPrescriptionsApi {
    prescriptions: Vec<Prescription>,
    latency: Latency,
    clock: fn() -> Date,
    refill_history: Mutex<Vec<RefillRecord>>,
}

impl MockPrescriptionsApi {
    pub fn new(prescriptions: Vec<Prescription>, latency: Latency) -> Self {
        Self {
            prescriptions,
            latency,
            clock: utils::today,
            refill_history: Mutex::new(Vec::new()),
        }
    }

    /// Loads the bundled fixture prescriptions.
    pub fn from_fixtures(latency: Latency) -> Result<Self, ApiError> {
        let prescriptions: Vec<Prescription> = serde_json::from_str(FIXTURES)?;
        Ok(Self::new(prescriptions, latency))
    }

    /// Replaces the source of "today" used for expiry checks.
    #[cfg(test)]
    pub fn with_clock(mut self, clock: fn() -> Date) -> Self {
        self.clock = clock;
        self
    }

    fn find(&self, id: &str) -> Option<&Prescription> {
        self.prescriptions.iter().find(|p| p.id == id)
    }

    fn record_refill(&self, id: &str) -> usize {
        let mut history = match self.refill_history.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let record = RefillRecord {
            prescription_id: id.to_string(),
            timestamp: OffsetDateTime::now_utc(),
        };
        tracing::debug!(
            prescription_id = %record.prescription_id,
            at = %record.timestamp,
            "Recorded refill"
        );
        history.push(record);
        history.len()
    }

    #[cfg(test)]
    pub fn refill_history(&self) -> Vec<RefillRecord> {
        self.refill_history.lock().unwrap().clone()
    }

    /// Applies the refill rules in order; the first failing check wins.
    fn evaluate_refill(&self, id: &str) -> RefillResponse {
        let Some(prescription) = self.find(id) else {
            tracing::warn!(prescription_id = id, "Refill rejected: prescription not found");
            return RefillResponse::rejected(NOT_FOUND_MESSAGE);
        };

        if prescription.remaining_refills == 0 {
            tracing::warn!(
                prescription_id = id,
                name = %prescription.name,
                "Refill rejected: no refills remaining"
            );
            return RefillResponse::rejected(NO_REFILLS_MESSAGE);
        }

        match prescription.expiry((self.clock)()) {
            Expiry::Expired => {
                tracing::warn!(
                    prescription_id = id,
                    name = %prescription.name,
                    expiry = %prescription.expiry_date,
                    "Refill rejected: prescription has expired"
                );
                return RefillResponse::rejected(EXPIRED_MESSAGE);
            }
            Expiry::Unknown => {
                tracing::warn!(
                    prescription_id = id,
                    expiry = %prescription.expiry_date,
                    "Refill rejected: unreadable expiry date"
                );
                return RefillResponse::rejected(UNKNOWN_EXPIRY_MESSAGE);
            }
            Expiry::Valid => {}
        }

        let total = self.record_refill(id);
        tracing::info!(prescription_id = id, name = %prescription.name, "Refill request accepted");
        tracing::debug!(refills_recorded = total, "Mock refill history updated");

        RefillResponse::accepted(format!(
            "Refill request for {} submitted successfully. Your pharmacy will be notified.",
            prescription.name
        ))
    }
}

async fn simulate_latency(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl PrescriptionsApi for MockPrescriptionsApi {
    async fn fetch_prescriptions(&self, search_term: &str) -> Result<Vec<Prescription>, ApiError> {
        simulate_latency(self.latency.list).await;

        if search_term.is_empty() {
            return Ok(self.prescriptions.clone());
        }

        let needle = search_term.to_lowercase();
        Ok(self
            .prescriptions
            .iter()
            .filter(|p| p.matches(&needle))
            .cloned()
            .collect())
    }

    async fn fetch_prescription_by_id(&self, id: &str) -> Result<Option<Prescription>, ApiError> {
        simulate_latency(self.latency.by_id).await;
        Ok(self.find(id).cloned())
    }

    async fn request_refill(&self, id: &str) -> Result<RefillResponse, ApiError> {
        tracing::info!(prescription_id = id, "Requesting refill");
        simulate_latency(self.latency.refill).await;
        Ok(self.evaluate_refill(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::prescription;
    use time::macros::date;

    fn pinned_today() -> Date {
        date!(2025 - 06 - 15)
    }

    fn fixture_api() -> MockPrescriptionsApi {
        MockPrescriptionsApi::from_fixtures(Latency::none())
            .unwrap()
            .with_clock(pinned_today)
    }

    fn api_with(prescriptions: Vec<Prescription>) -> MockPrescriptionsApi {
        MockPrescriptionsApi::new(prescriptions, Latency::none()).with_clock(pinned_today)
    }

    #[test]
    fn fixture_ids_are_unique() {
        let api = fixture_api();
        let mut ids: Vec<&str> = api.prescriptions.iter().map(|p| p.id.as_str()).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[tokio::test]
    async fn empty_search_returns_everything() {
        let api = fixture_api();
        let all = api.fetch_prescriptions("").await.unwrap();
        assert_eq!(all, api.prescriptions);
    }

    #[tokio::test]
    async fn search_matches_substrings_case_insensitively() {
        let api = fixture_api();
        for term in ["amox", "CITY", "dr. michael", "sert", "zzz-no-match"] {
            let needle = term.to_lowercase();
            let found = api.fetch_prescriptions(term).await.unwrap();
            let expected: Vec<Prescription> = api
                .prescriptions
                .iter()
                .filter(|p| {
                    p.name.to_lowercase().contains(&needle)
                        || p.prescribed_by.to_lowercase().contains(&needle)
                        || p.pharmacy.to_lowercase().contains(&needle)
                })
                .cloned()
                .collect();
            assert_eq!(found, expected, "term {term:?}");
        }
    }

    #[tokio::test]
    async fn search_does_not_match_other_fields() {
        let api = fixture_api();
        assert!(api.fetch_prescriptions("500mg").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lookup_by_id_is_identity() {
        let api = fixture_api();
        for rx in &api.prescriptions {
            let found = api.fetch_prescription_by_id(&rx.id).await.unwrap();
            assert_eq!(found.as_ref(), Some(rx));
        }
        assert_eq!(api.fetch_prescription_by_id("rx-missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let api = fixture_api();
        let response = api.request_refill("nope").await.unwrap();
        assert_eq!(response, RefillResponse::rejected(NOT_FOUND_MESSAGE));
        assert!(api.refill_history().is_empty());
    }

    #[tokio::test]
    async fn zero_refills_wins_over_expiry() {
        let api = api_with(vec![prescription("old", 0, "2020-01-01")]);
        let response = api.request_refill("old").await.unwrap();
        assert!(!response.success);
        assert_eq!(response.message, NO_REFILLS_MESSAGE);
    }

    #[tokio::test]
    async fn expired_prescription_is_rejected() {
        let api = api_with(vec![prescription("old", 3, "2025-06-14")]);
        let response = api.request_refill("old").await.unwrap();
        assert_eq!(response, RefillResponse::rejected(EXPIRED_MESSAGE));
    }

    #[tokio::test]
    async fn unreadable_expiry_is_rejected() {
        let api = api_with(vec![prescription("odd", 3, "someday")]);
        let response = api.request_refill("odd").await.unwrap();
        assert_eq!(response, RefillResponse::rejected(UNKNOWN_EXPIRY_MESSAGE));
    }

    #[tokio::test]
    async fn eligible_refill_succeeds_without_decrementing() {
        let api = api_with(vec![
            prescription("rx1", 2, "2099-01-01"),
            prescription("rx2", 0, "2099-01-01"),
        ]);

        let first = api.request_refill("rx1").await.unwrap();
        assert!(first.success);
        assert!(first.message.contains("Medication rx1"));

        let after = api.fetch_prescription_by_id("rx1").await.unwrap().unwrap();
        assert_eq!(after.remaining_refills, 2);

        let exhausted = api.request_refill("rx2").await.unwrap();
        assert_eq!(exhausted, RefillResponse::rejected(NO_REFILLS_MESSAGE));

        let history = api.refill_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].prescription_id, "rx1");
    }

    #[tokio::test(start_paused = true)]
    async fn latency_is_simulated() {
        let api = MockPrescriptionsApi::new(Vec::new(), Latency::default());
        let started = tokio::time::Instant::now();
        api.fetch_prescriptions("").await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(300));
    }
}
