//! Prescriptions API capability and its implementations.
//!
//! Callers depend only on [`PrescriptionsApi`]. [`prescriptions_api`] picks
//! the mock or HTTP implementation once, at startup, through the resolver.

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::models::{Prescription, RefillResponse};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub mod http;
pub mod mock;
pub mod resolver;

pub const PRESCRIPTIONS_SERVICE: &str = "PrescriptionsApi";

/// Shared handle the controllers hold.
pub type SharedPrescriptionsApi = Arc<dyn PrescriptionsApi>;

#[async_trait]
pub trait PrescriptionsApi: Send + Sync {
    /// Prescriptions whose name, prescriber or pharmacy contains
    /// `search_term` (case-insensitive). An empty term returns everything.
    async fn fetch_prescriptions(&self, search_term: &str) -> Result<Vec<Prescription>, ApiError>;

    /// `Ok(None)` when no prescription has this id.
    async fn fetch_prescription_by_id(&self, id: &str) -> Result<Option<Prescription>, ApiError>;

    /// Submits a refill. Eligibility rejections are `Ok` with `success == false`.
    async fn request_refill(&self, id: &str) -> Result<RefillResponse, ApiError>;
}

/// Builds the prescriptions capability selected by `config`.
pub fn prescriptions_api(config: &ApiConfig) -> Result<SharedPrescriptionsApi> {
    resolver::resolve(
        PRESCRIPTIONS_SERVICE,
        config,
        || -> Result<SharedPrescriptionsApi> {
            let api = mock::MockPrescriptionsApi::from_fixtures(config.mock_latency)?;
            Ok(Arc::new(api))
        },
        || -> Result<SharedPrescriptionsApi> {
            let api = http::HttpPrescriptionsApi::new(&config.base_url, config.timeout)?;
            Ok(Arc::new(api))
        },
    )
}
