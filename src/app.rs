//! The main application state and logic for the prescription viewer.
//!
//! Owns the list view for the whole session and creates a detail view each
//! time a prescription is opened, dropping it (and its in-flight requests)
//! when the user goes back.

use crate::api::SharedPrescriptionsApi;
use crate::components::prescriptions::{details::PrescriptionDetails, list::PrescriptionList};
use crate::components::{Action, Component};
use crate::tui::{self, Tui};
use crate::utils;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use std::time::Duration;

/// Which screen is currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    List,
    Details,
}

/// Top-level application state.
///
/// Routes input to the active view and dispatches the actions it returns.
pub struct App {
    pub state: AppState,
    pub should_quit: bool,
    api: SharedPrescriptionsApi,
    list: PrescriptionList,
    /// Only exists while a prescription is open.
    details: Option<PrescriptionDetails>,
}

impl App {
    /// Creates the app and starts loading the prescription list.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(api: SharedPrescriptionsApi, search_debounce: Duration) -> Self {
        Self {
            state: AppState::List,
            should_quit: false,
            list: PrescriptionList::new(Arc::clone(&api), search_debounce, utils::today()),
            api,
            details: None,
        }
    }

    /// Runs the draw/input loop until the user quits.
    pub fn run(&mut self, tui: &mut Tui) -> Result<()> {
        while !self.should_quit {
            tui.draw(|frame| self.render_ui(frame))?;
            match tui.next_event()? {
                tui::Event::Key(key) => self.handle_key(key)?,
                tui::Event::Tick => self.on_tick(),
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Global keybinding: Ctrl+Q to quit
        if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return Ok(());
        }

        let action = match self.state {
            AppState::List => self.list.handle_input(key)?,
            AppState::Details => match &mut self.details {
                Some(details) => details.handle_input(key)?,
                None => Some(Action::BackToList),
            },
        };

        if let Some(action) = action {
            self.dispatch(action);
        }
        Ok(())
    }

    fn dispatch(&mut self, action: Action) {
        match action {
            Action::OpenDetails(id) => {
                tracing::info!(prescription_id = %id, "Opening prescription");
                self.details = Some(PrescriptionDetails::new(
                    Arc::clone(&self.api),
                    &id,
                    utils::today(),
                ));
                self.state = AppState::Details;
            }
            Action::BackToList => {
                if let Some(details) = self.details.take() {
                    tracing::debug!(prescription_id = details.prescription_id(), "Closing prescription");
                }
                self.state = AppState::List;
                // A refill may have changed the remaining count.
                self.list.refresh();
            }
            Action::Quit => self.should_quit = true,
        }
    }

    fn on_tick(&mut self) {
        match self.state {
            AppState::List => self.list.on_tick(),
            AppState::Details => {
                if let Some(details) = &mut self.details {
                    details.on_tick();
                }
            }
        }
    }

    fn render_ui(&self, frame: &mut tui::Frame<'_>) {
        match (self.state, &self.details) {
            (AppState::Details, Some(details)) => details.render(frame),
            _ => self.list.render(frame),
        }
    }
}
