//! Interactive dashboard
//!
//! Terminal rendition of the Home, Markets & Exchanges and Admin screens.
//!
//! # Usage
//! ```bash
//! arrow_signals dashboard
//! ```
//!
//! # Keyboard Controls
//! - `q`, `Esc` or `Ctrl+C`: Quit
//! - `1`/`2`/`3`, `Tab`: Switch screen
//! - `c`/`f`/`s`: Toggle Commodity / Forex / Stocks
//! - `b`: Cycle action (All, Buy, Sell)
//! - `w`: Cycle time window
//! - `r`: Refresh
//! - `j`/`k`: Scroll cards, `↑`/`↓`: Scroll logs
//! - `l`: Toggle DEBUG logs

pub mod app;
pub mod event;
pub mod logging;
pub mod runner;
pub mod ui;

pub use app::{
    ApplyOutcome, DashboardState, DashboardUpdate, FetchResult, LogEntry, Screen, MAX_LOG_ENTRIES,
};
pub use logging::TuiLayer;
pub use runner::run_dashboard;
