//! Configuration types for the signals client
//!
//! Loaded from YAML; every section is optional and falls back to defaults.
//! Environment overrides are applied on top before validation.

use std::path::PathBuf;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::core::time_bucket::{zone_from_minutes, REFERENCE_OFFSET_MINUTES};
use crate::error::AppError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_REFRESH_SECS: u64 = 30;
pub const DEFAULT_SESSION_FILE: &str = ".arrow_signals/session.json";

/// Largest accepted UTC offset, in minutes (UTC±14:00)
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

pub const ENV_API_URL: &str = "SIGNALS_API_URL";
pub const ENV_TIMEZONE_OFFSET: &str = "SIGNALS_TIMEZONE_OFFSET_MINUTES";
pub const ENV_SESSION_FILE: &str = "SIGNALS_SESSION_FILE";

// ============================================================================
// Configuration Structs
// ============================================================================

/// REST backend settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL, e.g. `https://api.arrowsignals.in`
    pub base_url: String,
    /// Per-request timeout
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ApiConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "api.base_url must start with http:// or https:// (got '{}')",
                self.base_url
            )));
        }
        if self.timeout_ms == 0 {
            return Err(AppError::Config(
                "api.timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Rendering settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Reference zone for time labels, minutes east of UTC
    pub timezone_offset_minutes: i32,
    /// Dashboard auto-refresh interval, 0 disables it
    pub refresh_secs: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timezone_offset_minutes: REFERENCE_OFFSET_MINUTES,
            refresh_secs: DEFAULT_REFRESH_SECS,
        }
    }
}

impl DisplayConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.timezone_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(AppError::Config(format!(
                "display.timezone_offset_minutes must be within ±{} (got {})",
                MAX_OFFSET_MINUTES, self.timezone_offset_minutes
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_SESSION_FILE),
        }
    }
}

/// Root application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub display: DisplayConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    /// Validate all configuration rules
    pub fn validate(&self) -> Result<(), AppError> {
        self.api.validate()?;
        self.display.validate()?;

        if self.session.path.as_os_str().is_empty() {
            return Err(AppError::Config(
                "session.path cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Apply `SIGNALS_*` environment variables on top of the loaded values
    pub fn apply_env_overrides(&mut self) -> Result<(), AppError> {
        if let Ok(url) = std::env::var(ENV_API_URL) {
            if !url.trim().is_empty() {
                self.api.base_url = url.trim().to_string();
            }
        }

        if let Ok(raw) = std::env::var(ENV_TIMEZONE_OFFSET) {
            self.display.timezone_offset_minutes = raw.trim().parse().map_err(|_| {
                AppError::Config(format!(
                    "{} must be an integer number of minutes (got '{}')",
                    ENV_TIMEZONE_OFFSET, raw
                ))
            })?;
        }

        if let Ok(path) = std::env::var(ENV_SESSION_FILE) {
            if !path.trim().is_empty() {
                self.session.path = PathBuf::from(path.trim());
            }
        }

        Ok(())
    }

    /// Reference zone for time labels
    pub fn zone(&self) -> FixedOffset {
        zone_from_minutes(self.display.timezone_offset_minutes)
            .unwrap_or_else(crate::core::time_bucket::reference_zone)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api.base_url, "http://localhost:3000");
        assert_eq!(config.display.timezone_offset_minutes, 330);
        assert_eq!(config.zone().local_minus_utc(), 330 * 60);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
api:
  base_url: https://api.example.com
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.api.base_url, "https://api.example.com");
        assert_eq!(config.api.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(config.display, DisplayConfig::default());
        assert_eq!(config.session, SessionConfig::default());
    }

    #[test]
    fn test_bad_scheme_fails() {
        let mut config = AppConfig::default();
        config.api.base_url = "ftp://example.com".to_string();
        let result = config.validate();
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("must start with http:// or https://"));
    }

    #[test]
    fn test_zero_timeout_fails() {
        let mut config = AppConfig::default();
        config.api.timeout_ms = 0;
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("timeout_ms must be greater than 0"));
    }

    #[test]
    fn test_offset_out_of_range_fails() {
        let mut config = AppConfig::default();
        config.display.timezone_offset_minutes = 15 * 60;
        assert!(config.validate().is_err());

        config.display.timezone_offset_minutes = -14 * 60;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_session_path_fails() {
        let mut config = AppConfig::default();
        config.session.path = PathBuf::new();
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("session.path cannot be empty"));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var(ENV_API_URL, "https://override.example.com");
        std::env::set_var(ENV_TIMEZONE_OFFSET, "-300");
        std::env::set_var(ENV_SESSION_FILE, "/tmp/override-session.json");

        let mut config = AppConfig::default();
        let result = config.apply_env_overrides();

        std::env::remove_var(ENV_API_URL);
        std::env::remove_var(ENV_TIMEZONE_OFFSET);
        std::env::remove_var(ENV_SESSION_FILE);

        result.unwrap();
        assert_eq!(config.api.base_url, "https://override.example.com");
        assert_eq!(config.display.timezone_offset_minutes, -300);
        assert_eq!(config.session.path, PathBuf::from("/tmp/override-session.json"));
    }

    #[test]
    #[serial]
    fn test_env_offset_must_be_integer() {
        std::env::set_var(ENV_TIMEZONE_OFFSET, "five-thirty");
        let mut config = AppConfig::default();
        let result = config.apply_env_overrides();
        std::env::remove_var(ENV_TIMEZONE_OFFSET);

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("must be an integer number of minutes"));
    }
}
