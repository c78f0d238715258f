//! Refill request lifecycle for a single prescription.

use crate::api::SharedPrescriptionsApi;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefillStatus {
    Idle,
    Requesting,
    Success(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefillSnapshot {
    pub loading: bool,
    pub success: bool,
    pub error: Option<String>,
    /// Message of the last completed request, success or failure.
    pub message: Option<String>,
}

struct RefillState {
    status: RefillStatus,
    last_id: Option<String>,
}

pub struct RefillController {
    api: SharedPrescriptionsApi,
    state: Arc<Mutex<RefillState>>,
}

impl RefillController {
    /// Creates an idle controller.
    pub fn new(api: SharedPrescriptionsApi) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(RefillState {
                status: RefillStatus::Idle,
                last_id: None,
            })),
        }
    }

    /// Current lifecycle state.
    pub fn status(&self) -> RefillStatus {
        lock(&self.state).status.clone()
    }

    pub fn snapshot(&self) -> RefillSnapshot {
        match self.status() {
            RefillStatus::Idle => RefillSnapshot {
                loading: false,
                success: false,
                error: None,
                message: None,
            },
            RefillStatus::Requesting => RefillSnapshot {
                loading: true,
                success: false,
                error: None,
                message: None,
            },
            RefillStatus::Success(message) => RefillSnapshot {
                loading: false,
                success: true,
                error: None,
                message: Some(message),
            },
            RefillStatus::Error(message) => RefillSnapshot {
                loading: false,
                success: false,
                error: Some(message.clone()),
                message: Some(message),
            },
        }
    }

    /// Submits a refill for `id`. Returns `false` when nothing was sent:
    /// a request is already in flight, or this id was already refilled.
    ///
    /// Must be called from within a tokio runtime.
    pub fn request_refill(&self, id: &str) -> bool {
        {
            let mut state = lock(&self.state);
            match &state.status {
                RefillStatus::Requesting => {
                    tracing::debug!(prescription_id = id, "Refill already in flight");
                    return false;
                }
                RefillStatus::Success(_) if state.last_id.as_deref() == Some(id) => {
                    tracing::debug!(prescription_id = id, "Refill already submitted");
                    return false;
                }
                _ => {}
            }
            state.status = RefillStatus::Requesting;
            state.last_id = Some(id.to_string());
        }

        let api = Arc::clone(&self.api);
        let state = Arc::clone(&self.state);
        let id = id.to_string();
        tokio::spawn(async move {
            let status = match api.request_refill(&id).await {
                Ok(response) if response.success => RefillStatus::Success(response.message),
                Ok(response) => RefillStatus::Error(response.message),
                Err(err) => {
                    tracing::error!(prescription_id = %id, error = %err, "Refill request failed");
                    RefillStatus::Error(format!("Refill request failed: {err}"))
                }
            };
            lock(&state).status = status;
        });
        true
    }

    /// Returns to `Idle`. Ignored while a request is in flight.
    pub fn reset(&self) {
        let mut state = lock(&self.state);
        if state.status != RefillStatus::Requesting {
            state.status = RefillStatus::Idle;
            state.last_id = None;
        }
    }
}

fn lock(state: &Mutex<RefillState>) -> MutexGuard<'_, RefillState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
