//! Cancellable debounce timer.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Runs the most recently scheduled action once `delay` passes without a
/// newer call to [`Debouncer::schedule`].
///
/// Cancellation is synchronous: once `cancel` (or `schedule`) returns, an
/// earlier action can no longer start.
pub struct Debouncer {
    delay: Duration,
    ticket: Arc<Mutex<u64>>,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    /// Creates a debouncer with nothing scheduled.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ticket: Arc::new(Mutex::new(0)),
            pending: None,
        }
    }

    /// Cancels any pending action and schedules `action` after the delay.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mine = self.cancel();
        let ticket = Arc::clone(&self.ticket);
        let delay = self.delay;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Held while the action runs so `cancel` cannot interleave.
            let current = lock(&ticket);
            if *current == mine {
                action();
            }
        }));
    }

    /// Drops the pending action, if any. Returns the new ticket value.
    pub fn cancel(&mut self) -> u64 {
        let next = {
            let mut current = lock(&self.ticket);
            *current += 1;
            *current
        };
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        next
    }

    /// Whether an action is waiting for its delay to elapse.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn lock(ticket: &Mutex<u64>) -> std::sync::MutexGuard<'_, u64> {
    match ticket.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
