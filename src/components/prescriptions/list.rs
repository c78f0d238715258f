//! Prescription list screen.
//!
//! Shows the patient's prescriptions in a table with a search field above
//! it. Typing updates the search term at once; the controller debounces the
//! fetch behind it. Supports:
//! - searching by medication, prescriber or pharmacy
//! - keyboard navigation of the results
//! - opening the detail view of the selected prescription
//! - a dismissible alert when loading fails

use super::{
    render_background, render_header, render_help, BORDER, DANGER, HIGHLIGHT, MUTED, PANEL, TEXT,
    TITLE,
};
use crate::api::SharedPrescriptionsApi;
use crate::components::{Action, Component};
use crate::controllers::search::{SearchController, SearchSnapshot, SearchStatus};
use crate::models::Prescription;
use crate::tui::Frame;
use crate::utils::format_date;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::*};
use std::time::Duration;
use time::Date;

/// UI focus indices
const SEARCH_FIELD: usize = 0;
const PRESCRIPTION_LIST: usize = 1;

/// Searchable table of the patient's prescriptions.
pub struct PrescriptionList {
    search: SearchController,
    /// Whether keystrokes go to the search field
    is_searching: bool,
    state: TableState,
    focus_index: usize,
    today: Date,
}

impl PrescriptionList {
    /// Creates the list view and starts loading all prescriptions.
    ///
    /// # Arguments
    ///
    /// * `api` - The prescriptions API the search controller fetches from.
    /// * `debounce` - Quiet period between the last keystroke and the fetch.
    /// * `today` - Date used to highlight expired prescriptions.
    pub fn new(api: SharedPrescriptionsApi, debounce: Duration, today: Date) -> Self {
        Self {
            search: SearchController::mount(api, "", debounce),
            is_searching: false,
            state: TableState::default(),
            focus_index: PRESCRIPTION_LIST,
            today,
        }
    }

    /// Fetches the current search term again.
    pub fn refresh(&mut self) {
        self.search.refresh();
    }

    /// Keeps the table selection inside the current result set.
    fn sync_selection(&mut self, len: usize) {
        if len == 0 {
            self.state.select(None);
        } else {
            let selection = self.state.selected().unwrap_or(0).min(len - 1);
            self.state.select(Some(selection));
        }
    }

    fn select_next(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    fn select_previous(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    fn activate_search(&mut self) {
        self.is_searching = true;
        self.focus_index = SEARCH_FIELD;
    }

    fn leave_search(&mut self) {
        self.is_searching = false;
        self.focus_index = PRESCRIPTION_LIST;
    }

    fn handle_search_input(&mut self, key: KeyEvent, snapshot: &SearchSnapshot) {
        match key.code {
            KeyCode::Char(c) => {
                let mut term = self.search.search_term().to_string();
                term.push(c);
                self.search.set_search_term(term);
            }
            KeyCode::Backspace => {
                let mut term = self.search.search_term().to_string();
                term.pop();
                self.search.set_search_term(term);
            }
            KeyCode::Enter | KeyCode::Down | KeyCode::Tab => {
                self.leave_search();
                if !snapshot.results.is_empty() {
                    self.state.select(Some(0));
                }
            }
            KeyCode::Esc => self.leave_search(),
            _ => {}
        }
    }

    fn selected<'a>(&self, snapshot: &'a SearchSnapshot) -> Option<&'a Prescription> {
        self.state.selected().and_then(|i| snapshot.results.get(i))
    }
}

impl Component for PrescriptionList {
    fn handle_input(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let snapshot = self.search.snapshot();
        let len = snapshot.results.len();

        if self.is_searching {
            self.handle_search_input(key, &snapshot);
            return Ok(None);
        }

        match key.code {
            KeyCode::Char('/') | KeyCode::Char('s') | KeyCode::Char('S') => self.activate_search(),
            KeyCode::Tab | KeyCode::BackTab => {
                if self.focus_index == SEARCH_FIELD {
                    self.leave_search();
                } else {
                    self.activate_search();
                }
            }
            KeyCode::Down => self.select_next(len),
            KeyCode::Up => self.select_previous(len),
            KeyCode::Enter => {
                if let Some(prescription) = self.selected(&snapshot) {
                    return Ok(Some(Action::OpenDetails(prescription.id.clone())));
                }
            }
            KeyCode::Char('r') | KeyCode::Char('R') => self.refresh(),
            KeyCode::Char('x') | KeyCode::Char('X') => self.search.dismiss_error(),
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => {
                return Ok(Some(Action::Quit));
            }
            _ => {}
        }
        Ok(None)
    }

    fn on_tick(&mut self) {
        let len = self.search.snapshot().results.len();
        self.sync_selection(len);
    }

    fn render(&self, frame: &mut Frame) {
        render_background(frame);
        let snapshot = self.search.snapshot();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Length(3), // Search input
                Constraint::Min(8),    // Table
                Constraint::Length(1), // Status line
                Constraint::Length(1), // Help text
                Constraint::Length(3), // Error alert
            ])
            .margin(1)
            .split(frame.area());

        render_header(frame, layout[0], "💊 MY PRESCRIPTIONS");
        self.render_search(frame, layout[1], &snapshot);
        self.render_table(frame, layout[2], &snapshot);
        self.render_status(frame, layout[3], &snapshot);

        let help_text = if self.is_searching {
            "Type to search | ↓/Enter: To results | Esc: Stop searching"
        } else {
            "/ or s: Search | ↑↓: Navigate | Enter: View Details | R: Refresh | Q: Quit"
        };
        render_help(frame, layout[4], help_text);

        if let Some(error) = &snapshot.error {
            let alert = Paragraph::new(error.as_str())
                .style(Style::default().fg(DANGER).add_modifier(Modifier::BOLD))
                .alignment(Alignment::Center)
                .block(
                    Block::default()
                        .title(" Error (x to dismiss) ")
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .border_style(Style::default().fg(DANGER)),
                )
                .wrap(Wrap { trim: true });
            frame.render_widget(alert, layout[5]);
        }
    }
}

impl PrescriptionList {
    fn render_search(&self, frame: &mut Frame, area: Rect, snapshot: &SearchSnapshot) {
        let search_block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(Span::styled(
                " Search medication, doctor or pharmacy ",
                Style::default().fg(TITLE).add_modifier(Modifier::BOLD),
            ))
            .border_style(if self.is_searching {
                Style::default().fg(HIGHLIGHT)
            } else {
                Style::default().fg(BORDER)
            })
            .style(Style::default().bg(PANEL));

        let mut text = snapshot.search_term.clone();
        if self.is_searching {
            text.push('▏');
        }
        let search_paragraph = Paragraph::new(text)
            .style(Style::default().fg(TEXT).bg(PANEL))
            .block(search_block);
        frame.render_widget(search_paragraph, area);
    }

    fn render_table(&self, frame: &mut Frame, area: Rect, snapshot: &SearchSnapshot) {
        let table_block = Block::default()
            .title(format!(" Prescriptions ({}) ", snapshot.results.len()))
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(BORDER))
            .style(Style::default().bg(PANEL));

        if snapshot.results.is_empty() {
            let message = if snapshot.loading || snapshot.pending {
                "Loading prescriptions..."
            } else if snapshot.error.is_some() {
                "Prescriptions could not be loaded"
            } else if snapshot.search_term.is_empty() {
                "You have no prescriptions"
            } else {
                "No prescriptions match your search"
            };
            let empty = Paragraph::new(message)
                .style(Style::default().fg(TEXT))
                .alignment(Alignment::Center)
                .block(table_block);
            frame.render_widget(empty, area);
            return;
        }

        let header_cells = ["Medication", "Dosage", "Type", "Expires", "Refills", "Pharmacy"]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().fg(TITLE)));
        let header = Row::new(header_cells)
            .style(Style::default().bg(Color::Rgb(80, 60, 130)))
            .height(1);

        let rows = snapshot.results.iter().map(|prescription| {
            let style = if prescription.is_expired(self.today) {
                Style::default().fg(DANGER)
            } else if prescription.remaining_refills == 0 {
                Style::default().fg(MUTED)
            } else {
                Style::default().fg(TEXT)
            };
            Row::new(vec![
                Cell::from(prescription.name.clone()),
                Cell::from(prescription.dosage.clone()),
                Cell::from(prescription.medication_type.to_string()),
                Cell::from(format_date(&prescription.expiry_date)),
                Cell::from(prescription.remaining_refills.to_string()),
                Cell::from(prescription.pharmacy.clone()),
            ])
            .style(style)
        });

        let table = Table::new(
            rows,
            [
                Constraint::Percentage(28),
                Constraint::Percentage(14),
                Constraint::Percentage(11),
                Constraint::Percentage(13),
                Constraint::Percentage(8),
                Constraint::Percentage(26),
            ],
        )
        .header(header)
        .block(table_block)
        .row_highlight_style(
            Style::default()
                .fg(HIGHLIGHT)
                .bg(Color::Rgb(40, 40, 60))
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(if self.focus_index == PRESCRIPTION_LIST {
            "► "
        } else {
            "  "
        });

        frame.render_stateful_widget(table, area, &mut self.state.clone());
    }

    fn render_status(&self, frame: &mut Frame, area: Rect, snapshot: &SearchSnapshot) {
        let count = snapshot.results.len();
        let (text, color) = match snapshot.status {
            _ if snapshot.pending => ("⏳ Searching...".to_string(), MUTED),
            SearchStatus::Loading => ("⏳ Searching...".to_string(), HIGHLIGHT),
            SearchStatus::Error => ("Showing last loaded results".to_string(), DANGER),
            SearchStatus::Idle => (String::new(), MUTED),
            SearchStatus::Loaded if snapshot.search_term.is_empty() => {
                (format!("{count} prescriptions"), MUTED)
            }
            SearchStatus::Loaded => (
                format!("{count} result(s) for \"{}\"", snapshot.search_term),
                MUTED,
            ),
        };
        let status = Paragraph::new(text)
            .style(Style::default().fg(color))
            .alignment(Alignment::Center);
        frame.render_widget(status, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{Latency, MockPrescriptionsApi};
    use crossterm::event::KeyModifiers;
    use std::sync::Arc;
    use time::macros::date;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn list() -> PrescriptionList {
        let api = Arc::new(MockPrescriptionsApi::from_fixtures(Latency::none()).unwrap());
        PrescriptionList::new(api, Duration::from_millis(300), date!(2025 - 06 - 15))
    }

    #[tokio::test(start_paused = true)]
    async fn typing_in_search_updates_term() {
        let mut view = list();
        view.handle_input(key(KeyCode::Char('/'))).unwrap();
        for c in "amo".chars() {
            view.handle_input(key(KeyCode::Char(c))).unwrap();
        }
        view.handle_input(key(KeyCode::Backspace)).unwrap();
        assert_eq!(view.search.search_term(), "am");
    }

    #[tokio::test(start_paused = true)]
    async fn enter_opens_selected_prescription() {
        let mut view = list();
        tokio::time::sleep(Duration::from_secs(1)).await;
        view.on_tick();

        view.handle_input(key(KeyCode::Down)).unwrap();
        let action = view.handle_input(key(KeyCode::Enter)).unwrap();
        let expected = view.search.snapshot().results[1].id.clone();
        assert_eq!(action, Some(Action::OpenDetails(expected)));
    }

    #[tokio::test(start_paused = true)]
    async fn selection_wraps_around() {
        let mut view = list();
        tokio::time::sleep(Duration::from_secs(1)).await;
        view.on_tick();
        let len = view.search.snapshot().results.len();

        view.handle_input(key(KeyCode::Up)).unwrap();
        assert_eq!(view.state.selected(), Some(len - 1));
        view.handle_input(key(KeyCode::Down)).unwrap();
        assert_eq!(view.state.selected(), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn escape_quits_from_list() {
        let mut view = list();
        let action = view.handle_input(key(KeyCode::Esc)).unwrap();
        assert_eq!(action, Some(Action::Quit));
    }

    #[tokio::test(start_paused = true)]
    async fn escape_in_search_only_leaves_search() {
        let mut view = list();
        view.handle_input(key(KeyCode::Char('s'))).unwrap();
        let action = view.handle_input(key(KeyCode::Esc)).unwrap();
        assert_eq!(action, None);
        assert!(!view.is_searching);
    }
}
