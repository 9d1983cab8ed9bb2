//! Logging configuration
//!
//! Provides configurable JSON/Pretty output for the one-shot commands. Logs
//! go to stderr so command output on stdout stays clean. The dashboard sets
//! up its own subscriber with [`crate::tui::TuiLayer`].
//!
//! # Environment Variables
//! - `LOG_FORMAT`: Output format - `json` (default), `pretty`, or `tui`
//! - `RUST_LOG`: Log level filter (default: `info`)

use tracing_subscriber::EnvFilter;

/// Output formats accepted in `LOG_FORMAT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
    Tui,
}

impl LogFormat {
    /// Case-sensitive; anything unknown is JSON
    pub fn parse(raw: &str) -> Self {
        match raw {
            "pretty" => LogFormat::Pretty,
            "tui" => LogFormat::Tui,
            _ => LogFormat::Json,
        }
    }

    pub fn from_env() -> Self {
        std::env::var("LOG_FORMAT")
            .map(|f| Self::parse(&f))
            .unwrap_or(LogFormat::Json)
    }
}

/// `RUST_LOG`, falling back to `info`
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Check if TUI mode is requested
pub fn is_tui_mode() -> bool {
    LogFormat::from_env() == LogFormat::Tui
}

/// Initialize logging with configurable format
///
/// In `tui` mode nothing is installed here; the dashboard installs the
/// capture layer itself and one-shot commands stay silent.
pub fn init_logging() {
    match LogFormat::from_env() {
        LogFormat::Pretty => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::io::stderr)
                .pretty()
                .init();
        }
        LogFormat::Tui => {}
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::io::stderr)
                .json()
                .init();
        }
    }
}
