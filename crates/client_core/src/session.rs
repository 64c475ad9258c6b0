//! Locally persisted admin identity.
//!
//! The API has no token or cookie session; the admin id returned by login is
//! sent as a query parameter on the summary endpoint. Anyone who can write
//! this file can act as that admin.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::domain::AdminId;
use tracing::{info, warn};

use crate::error::{GatewayError, SessionError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub admin_id: AdminId,
    pub email: String,
    pub signed_in_at: DateTime<Utc>,
}

impl Session {
    pub fn new(admin_id: AdminId, email: impl Into<String>) -> Self {
        Self {
            admin_id,
            email: email.into(),
            signed_in_at: Utc::now(),
        }
    }
}

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

    pub fn load(&self) -> Result<Option<Session>, SessionError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| SessionError::Corrupt {
                path: self.path.display().to_string(),
                source,
            })
    }

    /// Loaded session, or [`GatewayError::NotSignedIn`] when there is none.
    pub fn require(&self) -> Result<Session, GatewayError> {
        match self.load() {
            Ok(Some(session)) => Ok(session),
            Ok(None) => Err(GatewayError::NotSignedIn),
            Err(err) => {
                warn!(path = %self.path.display(), "session: unreadable session file: {err}");
                Err(GatewayError::NotSignedIn)
            }
        }
    }

    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
            }
        }
        let raw = serde_json::to_string_pretty(session).map_err(|source| SessionError::Corrupt {
            path: self.path.display().to_string(),
            source,
        })?;
        fs::write(&self.path, raw).map_err(|source| self.io_error(source))?;
        info!(admin_id = session.admin_id.0, path = %self.path.display(), "session: saved");
        Ok(())
    }

    /// Removes the session file. Returns whether one existed.
    pub fn clear(&self) -> Result<bool, SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn io_error(&self, source: std::io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}
