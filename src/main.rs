mod api;
mod app;
mod components;
mod config;
mod controllers;
mod error;
mod models;
mod tui;
mod utils;

use anyhow::{Context, Result};
use app::App;
use config::Config;
use crossterm::{
    event::DisableMouseCapture,
    terminal::{self, LeaveAlternateScreen},
};
use ratatui::prelude::{CrosstermBackend, Terminal};
use std::fs::File;
use std::io;
use std::sync::Mutex;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;
use tui::Tui;

fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config)?;

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let api = api::prescriptions_api(&config.api)?;

    // The UI loop stays on this thread; controller tasks run on the workers.
    let runtime = build_runtime()?;
    let _runtime_guard = runtime.enter();

    let _guard = CleanupGuard;

    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.clear()?;

    let mut tui = Tui::new(terminal);
    tui.init()?;

    let mut app = App::new(api, config.search_debounce);
    let res = app.run(&mut tui);

    tui.exit()?;

    if let Err(e) = res {
        tracing::error!(error = %e, "Application error");
        eprintln!("Application Error: {e}");
    }
    tracing::info!("{} stopped", config::APP_NAME);
    Ok(())
}

fn build_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("rxrefill-worker")
        .build()
        .context("Failed to start the async runtime")
}

/// Logs go to a file; stdout belongs to the terminal UI.
fn init_tracing(config: &Config) -> Result<()> {
    let log_file = File::create(&config.log_file)
        .with_context(|| format!("Failed to create log file {}", config.log_file.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

struct CleanupGuard;

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        // Ignore errors during cleanup
        let _ = terminal::disable_raw_mode();
        let _ = crossterm::execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::Latency;
    use crate::config::{ApiConfig, ApiSource};
    use std::time::Duration;

    #[test]
    fn app_starts_from_sync_main_inside_entered_runtime() {
        let runtime = build_runtime().unwrap();
        let _runtime_guard = runtime.enter();

        let config = ApiConfig {
            source: ApiSource::Mock,
            logging: false,
            mock_latency: Latency::none(),
            ..ApiConfig::default()
        };
        let api = api::prescriptions_api(&config).unwrap();
        let app = App::new(api, Duration::from_millis(10));

        assert_eq!(app.state, app::AppState::List);
        assert!(!app.should_quit);
    }
}
