//! Arrow Signals terminal client
//!
//! Client for the trading-signals REST backend:
//! - Typed API client with an explicit session context
//! - Signal filtering and relative time labels
//! - Plain-text views and an interactive ratatui dashboard

pub mod api;
pub mod config;
pub mod core;
pub mod error;
pub mod tui;
pub mod view;

pub use error::AppError;
