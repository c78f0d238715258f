//! Loads one prescription for the detail view.

use crate::api::SharedPrescriptionsApi;
use crate::models::Prescription;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailStatus {
    Loading,
    Found(Prescription),
    NotFound,
    Error(String),
}

pub struct DetailController {
    api: SharedPrescriptionsApi,
    id: String,
    status: Arc<Mutex<DetailStatus>>,
    task: Option<JoinHandle<()>>,
}

impl DetailController {
    /// Starts loading `id`. Must be called from within a tokio runtime.
    pub fn load(api: SharedPrescriptionsApi, id: &str) -> Self {
        let mut controller = Self {
            api,
            id: id.to_string(),
            status: Arc::new(Mutex::new(DetailStatus::Loading)),
            task: None,
        };
        controller.reload();
        controller
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current load state.
    pub fn status(&self) -> DetailStatus {
        match self.status.lock() {
            Ok(status) => status.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// The loaded record, if the lookup found one.
    pub fn prescription(&self) -> Option<Prescription> {
        match self.status() {
            DetailStatus::Found(prescription) => Some(prescription),
            _ => None,
        }
    }

    pub fn reload(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        set(&self.status, DetailStatus::Loading);

        let api = Arc::clone(&self.api);
        let status = Arc::clone(&self.status);
        let id = self.id.clone();
        self.task = Some(tokio::spawn(async move {
            let next = match api.fetch_prescription_by_id(&id).await {
                Ok(Some(prescription)) => DetailStatus::Found(prescription),
                Ok(None) => {
                    tracing::info!(prescription_id = %id, "Prescription not found");
                    DetailStatus::NotFound
                }
                Err(err) => {
                    tracing::warn!(prescription_id = %id, error = %err, "Failed to load prescription");
                    DetailStatus::Error(format!("Failed to load prescription: {err}"))
                }
            };
            set(&status, next);
        }));
    }
}

impl Drop for DetailController {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn set(status: &Mutex<DetailStatus>, next: DetailStatus) {
    match status.lock() {
        Ok(mut guard) => *guard = next,
        Err(poisoned) => *poisoned.into_inner() = next,
    }
}
