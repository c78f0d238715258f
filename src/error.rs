//! Errors raised by the prescriptions API layer.

/// Transport and data failures from a `PrescriptionsApi` implementation.
///
/// Business-rule rejections are not errors: they come back as a
/// `RefillResponse` with `success == false`, and a missing record is `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Server responded with status {status}")]
    HttpStatus { status: u16 },
    #[error("Unexpected response body: {0}")]
    Decode(String),
    #[error("Invalid fixture data: {0}")]
    Fixture(String),
    #[error("Invalid API base URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Whether an idempotent read may be attempted again.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::HttpStatus { status } => *status >= 500,
            ApiError::Decode(_) | ApiError::Fixture(_) | ApiError::InvalidUrl(_) => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            ApiError::HttpStatus {
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Fixture(err.to_string())
    }
}
