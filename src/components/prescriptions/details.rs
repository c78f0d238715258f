//! Detail view for one prescription, with the refill request flow.

use super::{
    centered, panel, render_background, render_header, render_help, DANGER, HIGHLIGHT, MUTED,
    SUCCESS, TEXT, TITLE,
};
use crate::api::SharedPrescriptionsApi;
use crate::components::{Action, Component};
use crate::controllers::detail::{DetailController, DetailStatus};
use crate::controllers::refill::{RefillController, RefillStatus};
use crate::models::{Eligibility, Prescription};
use crate::tui::Frame;
use crate::utils::format_date;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::*};
use std::sync::Arc;
use time::Date;

/// One prescription with its refill controls.
pub struct PrescriptionDetails {
    detail: DetailController,
    refill: RefillController,
    today: Date,
    show_confirmation: bool,
    confirmation_selected: usize, // 0 for Yes, 1 for No
}

impl PrescriptionDetails {
    /// Creates the detail view for `id` and starts loading the record.
    ///
    /// # Arguments
    ///
    /// * `api` - Shared by the detail and refill controllers.
    /// * `id` - The prescription to show.
    /// * `today` - Date used for the eligibility checks.
    pub fn new(api: SharedPrescriptionsApi, id: &str, today: Date) -> Self {
        Self {
            detail: DetailController::load(Arc::clone(&api), id),
            refill: RefillController::new(api),
            today,
            show_confirmation: false,
            confirmation_selected: 1, // Default to "No"
        }
    }

    /// The id this view was opened for.
    pub fn prescription_id(&self) -> &str {
        self.detail.id()
    }

    /// Whether the refill button is offered right now.
    fn refill_available(&self, prescription: &Prescription) -> bool {
        prescription.can_refill(self.today)
            && matches!(
                self.refill.status(),
                RefillStatus::Idle | RefillStatus::Error(_)
            )
    }

    fn handle_confirmation(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
                self.confirmation_selected = 1 - self.confirmation_selected;
            }
            KeyCode::Enter => {
                if self.confirmation_selected == 0 {
                    self.refill.request_refill(self.detail.id());
                }
                self.show_confirmation = false;
                self.confirmation_selected = 1;
            }
            KeyCode::Esc => {
                self.show_confirmation = false;
                self.confirmation_selected = 1;
            }
            _ => {}
        }
    }
}

impl Component for PrescriptionDetails {
    fn handle_input(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.show_confirmation {
            self.handle_confirmation(key);
            return Ok(None);
        }

        match key.code {
            KeyCode::Char('f') | KeyCode::Char('F') | KeyCode::Enter => {
                if let Some(prescription) = self.detail.prescription() {
                    if self.refill_available(&prescription) {
                        self.show_confirmation = true;
                    }
                }
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                if matches!(self.detail.status(), DetailStatus::Error(_)) {
                    self.detail.reload();
                }
            }
            KeyCode::Char('x') | KeyCode::Char('X') => {
                if matches!(self.refill.status(), RefillStatus::Error(_)) {
                    self.refill.reset();
                }
            }
            KeyCode::Esc | KeyCode::Char('b') | KeyCode::Char('B') | KeyCode::Backspace => {
                return Ok(Some(Action::BackToList));
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame) {
        render_background(frame);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(10),   // Body
                Constraint::Length(1), // Help text
            ])
            .margin(1)
            .split(frame.area());

        render_header(frame, layout[0], "💊 PRESCRIPTION DETAILS");

        let help_text = match self.detail.status() {
            DetailStatus::Found(ref prescription) if self.refill_available(prescription) => {
                "F: Request Refill | Esc/B: Back to list"
            }
            DetailStatus::Error(_) => "R: Retry | Esc/B: Back to list",
            _ => "Esc/B: Back to list",
        };
        render_help(frame, layout[2], help_text);

        match self.detail.status() {
            DetailStatus::Loading => {
                let loading = Paragraph::new("Loading prescription...")
                    .style(Style::default().fg(HIGHLIGHT))
                    .alignment(Alignment::Center)
                    .block(panel("Prescription"));
                frame.render_widget(loading, layout[1]);
            }
            DetailStatus::NotFound => {
                let missing = Paragraph::new(format!(
                    "Prescription \"{}\" was not found.",
                    self.detail.id()
                ))
                .style(Style::default().fg(TEXT))
                .alignment(Alignment::Center)
                .block(panel("Prescription"));
                frame.render_widget(missing, layout[1]);
            }
            DetailStatus::Error(message) => {
                let error = Paragraph::new(message)
                    .style(Style::default().fg(DANGER).add_modifier(Modifier::BOLD))
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true })
                    .block(panel("Prescription"));
                frame.render_widget(error, layout[1]);
            }
            DetailStatus::Found(prescription) => {
                self.render_prescription(frame, layout[1], &prescription);
            }
        }

        if self.show_confirmation {
            self.render_confirmation(frame);
        }
    }
}

fn field<'a>(label: &'a str, value: String) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{label:<14}"), Style::default().fg(MUTED)),
        Span::styled(value, Style::default().fg(TEXT)),
    ])
}

impl PrescriptionDetails {
    fn render_prescription(&self, frame: &mut Frame, area: Rect, prescription: &Prescription) {
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(8), // Medication
                Constraint::Length(8), // Prescription info
                Constraint::Min(4),    // Refill
            ])
            .split(area);

        let medication = Paragraph::new(vec![
            Line::from(Span::styled(
                prescription.name.clone(),
                Style::default().fg(TITLE).add_modifier(Modifier::BOLD),
            )),
            field("Dosage", prescription.dosage.clone()),
            field("Type", prescription.medication_type.to_string()),
            field("Frequency", prescription.frequency.clone()),
            field("Instructions", prescription.instructions.clone()),
        ])
        .wrap(Wrap { trim: true })
        .block(panel("Medication Details"));
        frame.render_widget(medication, sections[0]);

        let refills_style = if prescription.remaining_refills == 0 {
            Style::default().fg(DANGER)
        } else {
            Style::default().fg(TEXT)
        };
        let expiry_style = if prescription.is_expired(self.today) {
            Style::default().fg(DANGER)
        } else {
            Style::default().fg(TEXT)
        };
        let info = Paragraph::new(vec![
            field("Prescribed by", prescription.prescribed_by.clone()),
            field("Issued", format_date(&prescription.date_issued)),
            Line::from(vec![
                Span::styled(format!("{:<14}", "Expires"), Style::default().fg(MUTED)),
                Span::styled(format_date(&prescription.expiry_date), expiry_style),
            ]),
            Line::from(vec![
                Span::styled(format!("{:<14}", "Refills left"), Style::default().fg(MUTED)),
                Span::styled(prescription.remaining_refills.to_string(), refills_style),
            ]),
            field("Pharmacy", prescription.pharmacy.clone()),
        ])
        .block(panel("Prescription Information"));
        frame.render_widget(info, sections[1]);

        self.render_refill(frame, sections[2], prescription);
    }

    fn render_refill(&self, frame: &mut Frame, area: Rect, prescription: &Prescription) {
        let eligibility = prescription.eligibility(self.today);
        let eligibility_color = if eligibility == Eligibility::Eligible {
            SUCCESS
        } else {
            DANGER
        };

        let mut lines = vec![Line::from(Span::styled(
            eligibility.label(),
            Style::default()
                .fg(eligibility_color)
                .add_modifier(Modifier::BOLD),
        ))];

        let snapshot = self.refill.snapshot();
        if snapshot.loading {
            lines.push(Line::from(Span::styled(
                "⏳ Requesting refill...",
                Style::default().fg(HIGHLIGHT),
            )));
        } else if snapshot.success {
            if let Some(message) = snapshot.message {
                lines.push(Line::from(Span::styled(
                    format!("✓ {message}"),
                    Style::default().fg(SUCCESS),
                )));
            }
        } else if let Some(error) = snapshot.error {
            lines.push(Line::from(Span::styled(
                format!("✗ {error}"),
                Style::default().fg(DANGER),
            )));
            lines.push(Line::from(Span::styled(
                "Press F to try again or X to dismiss",
                Style::default().fg(MUTED),
            )));
        } else if self.refill_available(prescription) {
            lines.push(Line::from(Span::styled(
                "Press F to request a refill",
                Style::default().fg(MUTED),
            )));
        }

        let refill = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(panel("Refill"));
        frame.render_widget(refill, area);
    }

    fn render_confirmation(&self, frame: &mut Frame) {
        let dialog_area = centered(frame.area(), 56, 8);
        frame.render_widget(Clear, dialog_area);

        let name = self
            .detail
            .prescription()
            .map(|p| p.name)
            .unwrap_or_default();

        let dialog_block = Block::default()
            .title(" Request Refill ")
            .title_style(Style::default().fg(TITLE).add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Rgb(140, 140, 200)))
            .style(Style::default().bg(Color::Rgb(30, 30, 46)));
        frame.render_widget(dialog_block.clone(), dialog_area);

        let inner_area = dialog_block.inner(dialog_area);
        let content_layout = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(inner_area);

        let message = Paragraph::new(format!("Request a refill of {name}?"))
            .style(Style::default().fg(TEXT).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(message, content_layout[0]);

        let buttons_layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(content_layout[1]);

        let yes_style = if self.confirmation_selected == 0 {
            Style::default().fg(SUCCESS).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(MUTED)
        };
        let no_style = if self.confirmation_selected == 1 {
            Style::default().fg(DANGER).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(MUTED)
        };

        frame.render_widget(
            Paragraph::new(if self.confirmation_selected == 0 { "► Yes ◄" } else { "  Yes  " })
                .style(yes_style)
                .alignment(Alignment::Center),
            buttons_layout[0],
        );
        frame.render_widget(
            Paragraph::new(if self.confirmation_selected == 1 { "► No ◄" } else { "  No  " })
                .style(no_style)
                .alignment(Alignment::Center),
            buttons_layout[1],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::test_support::ScriptedApi;
    use crate::models::test_support::prescription;
    use crossterm::event::KeyModifiers;
    use std::time::Duration;
    use time::macros::date;

    const TODAY: Date = date!(2025 - 06 - 15);

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn api() -> Arc<ScriptedApi> {
        Arc::new(ScriptedApi::new(vec![
            prescription("rx1", 2, "2099-01-01"),
            prescription("rx2", 0, "2099-01-01"),
        ]))
    }

    async fn loaded(api: Arc<ScriptedApi>, id: &str) -> PrescriptionDetails {
        let view = PrescriptionDetails::new(api, id, TODAY);
        tokio::time::sleep(Duration::from_millis(100)).await;
        view
    }

    #[tokio::test(start_paused = true)]
    async fn confirming_yes_requests_refill() {
        let api = api();
        let mut view = loaded(Arc::clone(&api), "rx1").await;

        view.handle_input(key(KeyCode::Char('f'))).unwrap();
        assert!(view.show_confirmation);
        view.handle_input(key(KeyCode::Left)).unwrap();
        view.handle_input(key(KeyCode::Enter)).unwrap();

        assert!(!view.show_confirmation);
        assert_eq!(view.refill.status(), RefillStatus::Requesting);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(view.refill.snapshot().success);
        assert_eq!(api.refills(), vec!["rx1".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn dialog_defaults_to_no() {
        let api = api();
        let mut view = loaded(Arc::clone(&api), "rx1").await;

        view.handle_input(key(KeyCode::Char('f'))).unwrap();
        view.handle_input(key(KeyCode::Enter)).unwrap();

        assert_eq!(view.refill.status(), RefillStatus::Idle);
        assert!(api.refills().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn ineligible_prescription_offers_no_refill() {
        let mut view = loaded(api(), "rx2").await;
        view.handle_input(key(KeyCode::Char('f'))).unwrap();
        assert!(!view.show_confirmation);
    }

    #[tokio::test(start_paused = true)]
    async fn escape_in_dialog_does_not_leave_view() {
        let mut view = loaded(api(), "rx1").await;
        view.handle_input(key(KeyCode::Char('f'))).unwrap();

        assert_eq!(view.handle_input(key(KeyCode::Esc)).unwrap(), None);
        assert!(!view.show_confirmation);
        assert_eq!(
            view.handle_input(key(KeyCode::Esc)).unwrap(),
            Some(Action::BackToList)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refill_can_be_dismissed() {
        let api = Arc::new(
            ScriptedApi::new(vec![prescription("rx1", 2, "2099-01-01")])
                .with_refill_failure(crate::error::ApiError::HttpStatus { status: 503 }),
        );
        let mut view = loaded(api, "rx1").await;
        view.handle_input(key(KeyCode::Char('f'))).unwrap();
        view.handle_input(key(KeyCode::Left)).unwrap();
        view.handle_input(key(KeyCode::Enter)).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(matches!(view.refill.status(), RefillStatus::Error(_)));

        view.handle_input(key(KeyCode::Char('x'))).unwrap();
        assert_eq!(view.refill.status(), RefillStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_requested_id() {
        let view = loaded(api(), "rx9").await;
        assert_eq!(view.prescription_id(), "rx9");
        assert_eq!(view.detail.status(), DetailStatus::NotFound);
    }
}
