//! Signals API error types
//!
//! Every failure talking to the backend is mapped onto ApiError. The
//! variants follow the three failure classes the dashboard distinguishes:
//! transport problems, backend-reported errors and authentication.

use thiserror::Error;

/// Errors returned by [`crate::api::SignalsApi`] operations
#[derive(Error, Debug)]
pub enum ApiError {
    /// Backend unreachable or the request could not be sent
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request exceeded the configured timeout
    #[error("Network timeout after {0}ms")]
    NetworkTimeout(u64),

    /// Body could not be decoded into the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Non-2xx status or an error flag in the JSON body
    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// Sign-in refused for the submitted credentials
    #[error("Sign-in rejected: {0}")]
    SignInRejected(String),

    /// Token no longer accepted on an authenticated request
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// HTTP client could not be constructed
    #[error("Client setup failed: {0}")]
    ClientSetup(String),

    /// Operation needs a session but none was supplied
    #[error("Not logged in")]
    NotLoggedIn,
}

impl ApiError {
    /// True for failures where the backend never produced an answer
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            ApiError::ConnectionFailed(_) | ApiError::NetworkTimeout(_)
        )
    }

    /// Short text suitable for a notification line
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Backend { message, .. } => message.clone(),
            ApiError::SignInRejected(_) => "User Doesn't Exists!".to_string(),
            ApiError::Unauthorized(_) => "Session expired, please log in again".to_string(),
            ApiError::NotLoggedIn => "Please log in first".to_string(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_failed_display() {
        let err = ApiError::ConnectionFailed("refused".to_string());
        assert_eq!(err.to_string(), "Connection failed: refused");
    }

    #[test]
    fn test_backend_display() {
        let err = ApiError::Backend {
            status: 400,
            message: "Script already exists".to_string(),
        };
        assert_eq!(err.to_string(), "Backend error (400): Script already exists");
        assert_eq!(err.user_message(), "Script already exists");
    }

    #[test]
    fn test_network_timeout_display() {
        let err = ApiError::NetworkTimeout(10_000);
        assert_eq!(err.to_string(), "Network timeout after 10000ms");
        assert!(err.is_network());
    }

    #[test]
    fn test_unauthorized_is_not_network() {
        let err = ApiError::Unauthorized("jwt expired".to_string());
        assert!(!err.is_network());
        assert_eq!(err.user_message(), "Session expired, please log in again");
    }

    #[test]
    fn test_sign_in_rejection_message() {
        let err = ApiError::SignInRejected("User not found".to_string());
        assert_eq!(err.to_string(), "Sign-in rejected: User not found");
        assert_eq!(err.user_message(), "User Doesn't Exists!");
    }
}
