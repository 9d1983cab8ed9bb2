//! Configuration module for client settings and YAML loading
//!
//! This module provides:
//! - Configuration types (`AppConfig`, `ApiConfig`, `DisplayConfig`, `SessionConfig`)
//! - YAML loading functionality (`load_config`, `load_config_or_default`)
//! - Logging configuration (`init_logging`)

mod loader;
pub mod logging;
mod types;

// Re-export types
pub use types::{
    ApiConfig, AppConfig, DisplayConfig, SessionConfig, DEFAULT_BASE_URL, DEFAULT_REFRESH_SECS,
    DEFAULT_SESSION_FILE, DEFAULT_TIMEOUT_MS,
};

// Re-export loader functions
pub use loader::{load_config, load_config_from_str, load_config_or_default};

// Re-export logging functions
pub use logging::{init_logging, is_tui_mode, LogFormat};
