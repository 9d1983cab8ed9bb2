//! Session context
//!
//! A [`Session`] is the bearer token and user id obtained at sign-in. It is
//! passed explicitly to the client that issues authenticated requests and
//! persisted between CLI invocations by [`SessionStore`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::types::AuthResponse;
use crate::error::{AppError, Result};

/// Authenticated session: created on successful login, cleared on logout
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    pub user_id: u64,
}

impl Session {
    pub fn new(access_token: impl Into<String>, user_id: u64) -> Self {
        Self {
            access_token: access_token.into(),
            user_id,
        }
    }

    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl From<&AuthResponse> for Session {
    fn from(resp: &AuthResponse) -> Self {
        Session::new(resp.token.clone(), resp.user_data.id)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// JSON file holding the current session
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored session, `Ok(None)` when nobody is logged in
    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No session file");
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.path)?;
        let session: Session = serde_json::from_str(&raw).map_err(|e| {
            AppError::Session(format!(
                "Corrupt session file '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        if session.access_token.trim().is_empty() {
            return Err(AppError::Session(format!(
                "Session file '{}' has an empty token",
                self.path.display()
            )));
        }

        Ok(Some(session))
    }

    /// Like [`load`](Self::load), but an unreadable file counts as logged out
    pub fn load_or_logged_out(&self) -> Option<Session> {
        match self.load() {
            Ok(session) => session,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable session, log in again");
                None
            }
        }
    }

    /// Persist the session, creating parent directories as needed
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let body = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, body)?;
        info!(user_id = session.user_id, path = %self.path.display(), "Session stored");
        Ok(())
    }

    /// Remove the stored session. Returns whether one existed.
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "Session cleared");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
