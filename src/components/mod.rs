use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::KeyEvent;

pub mod prescriptions;

/// What a view asks the application to do after handling input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    OpenDetails(String),
    BackToList,
    Quit,
}

pub trait Component {
    fn handle_input(&mut self, event: KeyEvent) -> Result<Option<Action>>;
    fn render(&self, frame: &mut Frame);
    /// Called once per frame without input, to pick up async state changes.
    fn on_tick(&mut self) {}
}
