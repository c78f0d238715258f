//! Prescription screens: the searchable list and the per-prescription detail view.

use crate::tui::Frame;
use ratatui::{prelude::*, widgets::*};

pub mod details;
pub mod list;

pub(crate) const BACKGROUND: Color = Color::Rgb(16, 16, 28);
pub(crate) const PANEL: Color = Color::Rgb(22, 22, 35);
pub(crate) const BORDER: Color = Color::Rgb(75, 75, 120);
pub(crate) const TEXT: Color = Color::Rgb(220, 220, 240);
pub(crate) const TITLE: Color = Color::Rgb(230, 230, 250);
pub(crate) const MUTED: Color = Color::Rgb(140, 140, 170);
pub(crate) const SUCCESS: Color = Color::Rgb(140, 219, 140);
pub(crate) const DANGER: Color = Color::Rgb(240, 100, 100);
pub(crate) const HIGHLIGHT: Color = Color::Rgb(250, 250, 110);

/// Fills the whole frame with the background color.
pub(crate) fn render_background(frame: &mut Frame) {
    let area = frame.area();
    frame.render_widget(Block::default().style(Style::default().bg(BACKGROUND)), area);
}

/// Centered bold title over a bottom border.
pub(crate) fn render_header(frame: &mut Frame, area: Rect, title: &str) {
    let header_block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(BORDER))
        .style(Style::default().bg(BACKGROUND));
    frame.render_widget(header_block, area);

    let title = Paragraph::new(title)
        .style(
            Style::default()
                .fg(TITLE)
                .add_modifier(Modifier::BOLD)
                .bg(BACKGROUND),
        )
        .alignment(Alignment::Center);
    frame.render_widget(title, area);
}

pub(crate) fn panel(title: &str) -> Block<'static> {
    Block::default()
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(Color::Cyan),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER))
        .style(Style::default().bg(PANEL))
}

pub(crate) fn render_help(frame: &mut Frame, area: Rect, text: &str) {
    let help = Paragraph::new(text)
        .style(Style::default().fg(MUTED))
        .alignment(Alignment::Center);
    frame.render_widget(help, area);
}

/// Rectangle of `width` x `height` centered in `area`.
pub(crate) fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
