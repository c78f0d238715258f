//! Search/list controller.
//!
//! Owns the search term and the result set shown by the list view. Term
//! changes are applied immediately; the fetch behind them is debounced so
//! a burst of keystrokes produces one request for the final term.

use crate::api::SharedPrescriptionsApi;
use crate::controllers::debounce::Debouncer;
use crate::error::ApiError;
use crate::models::Prescription;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::AbortHandle;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    Idle,
    Loading,
    Loaded,
    Error,
}

/// What a view needs to render the list.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSnapshot {
    pub search_term: String,
    pub results: Vec<Prescription>,
    pub loading: bool,
    pub error: Option<String>,
    /// A fetch is scheduled but waiting for the quiet period.
    pub pending: bool,
    pub status: SearchStatus,
}

#[derive(Default)]
struct SearchState {
    results: Vec<Prescription>,
    loading: bool,
    error: Option<String>,
    loaded_once: bool,
    /// Bumped each time a fetch starts; completions from older fetches are dropped.
    generation: u64,
    closed: bool,
    in_flight: Option<AbortHandle>,
}

impl SearchState {
    fn status(&self) -> SearchStatus {
        if self.loading {
            SearchStatus::Loading
        } else if self.error.is_some() {
            SearchStatus::Error
        } else if self.loaded_once {
            SearchStatus::Loaded
        } else {
            SearchStatus::Idle
        }
    }
}

pub struct SearchController {
    api: SharedPrescriptionsApi,
    search_term: String,
    state: Arc<Mutex<SearchState>>,
    debouncer: Debouncer,
}

impl SearchController {
    /// Creates the controller and schedules the initial fetch for
    /// `initial_term`. Must be called from within a tokio runtime.
    pub fn mount(api: SharedPrescriptionsApi, initial_term: &str, debounce: Duration) -> Self {
        let state = SearchState {
            loading: true,
            ..SearchState::default()
        };
        let mut controller = Self {
            api,
            search_term: initial_term.to_string(),
            state: Arc::new(Mutex::new(state)),
            debouncer: Debouncer::new(debounce),
        };
        controller.schedule_fetch();
        controller
    }

    /// The term as typed, before the debounce window closes.
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Updates the term now and (re)starts the debounce window for its fetch.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        let term = term.into();
        if term == self.search_term {
            return;
        }
        self.search_term = term;
        self.schedule_fetch();
    }

    /// Fetches the current term again.
    pub fn refresh(&mut self) {
        self.schedule_fetch();
    }

    pub fn dismiss_error(&mut self) {
        lock(&self.state).error = None;
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        let state = lock(&self.state);
        SearchSnapshot {
            search_term: self.search_term.clone(),
            results: state.results.clone(),
            loading: state.loading,
            error: state.error.clone(),
            pending: self.debouncer.is_pending(),
            status: state.status(),
        }
    }

    /// Stops all pending and in-flight work. No state changes afterwards.
    pub fn close(&mut self) {
        self.debouncer.cancel();
        let mut state = lock(&self.state);
        state.closed = true;
        if let Some(handle) = state.in_flight.take() {
            handle.abort();
        }
    }

    fn schedule_fetch(&mut self) {
        let api = Arc::clone(&self.api);
        let state = Arc::clone(&self.state);
        let term = self.search_term.clone();
        self.debouncer.schedule(move || start_fetch(api, state, term));
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        self.close();
    }
}

/// Marks the state as loading and spawns the fetch for `term`.
fn start_fetch(api: SharedPrescriptionsApi, state: Arc<Mutex<SearchState>>, term: String) {
    let mut guard = lock(&state);
    if guard.closed {
        return;
    }
    guard.generation += 1;
    guard.loading = true;
    let generation = guard.generation;
    tracing::debug!(search_term = %term, generation, "Fetching prescriptions");

    let task_state = Arc::clone(&state);
    let handle = tokio::spawn(async move {
        let outcome = api.fetch_prescriptions(&term).await;
        apply_outcome(&task_state, generation, &term, outcome);
    });
    guard.in_flight = Some(handle.abort_handle());
}

fn apply_outcome(
    state: &Mutex<SearchState>,
    generation: u64,
    term: &str,
    outcome: Result<Vec<Prescription>, ApiError>,
) {
    let mut state = lock(state);
    if state.closed || state.generation != generation {
        tracing::debug!(search_term = term, generation, "Discarding stale search results");
        return;
    }

    state.loading = false;
    state.in_flight = None;
    match outcome {
        Ok(results) => {
            tracing::debug!(search_term = term, count = results.len(), "Search results loaded");
            state.results = results;
            state.error = None;
            state.loaded_once = true;
        }
        Err(err) => {
            tracing::warn!(search_term = term, error = %err, "Failed to fetch prescriptions");
            state.error = Some(format!("Failed to fetch prescriptions: {err}"));
        }
    }
}

fn lock(state: &Mutex<SearchState>) -> MutexGuard<'_, SearchState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
