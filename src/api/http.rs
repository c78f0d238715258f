//! HTTP-backed prescriptions API.
//!
//! Reads are retried with exponential backoff on transport failures and 5xx
//! responses. Refill submissions are sent exactly once.

use crate::api::PrescriptionsApi;
use crate::error::ApiError;
use crate::models::{Prescription, RefillResponse};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::future::Future;
use std::time::Duration;

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE: Duration = Duration::from_millis(200);

pub struct HttpPrescriptionsApi {
    client: Client,
    base_url: Url,
}

impl HttpPrescriptionsApi {
    /// Creates a client for the backend rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidUrl` if `base_url` is not an absolute
    /// http(s) URL, or `ApiError::Network` if the client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// Appends `segments` to the base path, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Only fails for cannot-be-a-base URLs, which `new` rejects.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn prescriptions_url(&self) -> Url {
        self.endpoint(&["prescriptions"])
    }

    fn prescription_url(&self, id: &str) -> Url {
        self.endpoint(&["prescriptions", id])
    }

    fn refill_url(&self, id: &str) -> Url {
        self.endpoint(&["prescriptions", id, "refill"])
    }
}

/// Delay before retry number `attempt` (1-based): 200ms, 400ms, ...
fn backoff(attempt: u32) -> Duration {
    BACKOFF_BASE * 2u32.saturating_pow(attempt.saturating_sub(1))
}

/// Runs `op` up to [`MAX_ATTEMPTS`] times while it fails with a retryable error.
async fn with_retry<T, F, Fut>(operation: &str, mut op: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < MAX_ATTEMPTS => {
                let delay = backoff(attempt);
                tracing::warn!(
                    operation,
                    attempt,
                    error = %err,
                    delay_ms = delay.as_millis() as u64,
                    "Request failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                tracing::error!(operation, attempt, error = %err, "Request failed");
                return Err(err);
            }
        }
    }
}

fn check_status(status: StatusCode) -> Result<(), ApiError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(ApiError::HttpStatus {
            status: status.as_u16(),
        })
    }
}

impl HttpPrescriptionsApi {
    async fn get_prescriptions(&self, search_term: &str) -> Result<Vec<Prescription>, ApiError> {
        let mut request = self.client.get(self.prescriptions_url());
        if !search_term.is_empty() {
            request = request.query(&[("search", search_term)]);
        }
        let response = request.send().await?;
        check_status(response.status())?;
        Ok(response.json::<Vec<Prescription>>().await?)
    }

    async fn get_prescription(&self, id: &str) -> Result<Option<Prescription>, ApiError> {
        let response = self.client.get(self.prescription_url(id)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        check_status(response.status())?;
        Ok(Some(response.json::<Prescription>().await?))
    }
}

#[async_trait]
impl PrescriptionsApi for HttpPrescriptionsApi {
    async fn fetch_prescriptions(&self, search_term: &str) -> Result<Vec<Prescription>, ApiError> {
        with_retry("fetch_prescriptions", move || self.get_prescriptions(search_term)).await
    }

    async fn fetch_prescription_by_id(&self, id: &str) -> Result<Option<Prescription>, ApiError> {
        with_retry("fetch_prescription_by_id", move || self.get_prescription(id)).await
    }

    async fn request_refill(&self, id: &str) -> Result<RefillResponse, ApiError> {
        tracing::info!(prescription_id = id, "Submitting refill request");
        let response = self.client.post(self.refill_url(id)).send().await?;
        check_status(response.status())?;
        Ok(response.json::<RefillResponse>().await?)
    }
}
