//! Read-only access to login sessions.
//!
//! ARCHITECTURE
//! ============
//! Sessions are created and destroyed by the login and logout handlers,
//! which live outside this process. The welcome page only observes them, so
//! `SessionStore` exposes a single `load` operation and no write path.
//!
//! The file store reads PHP's default `files` save handler layout
//! (`<save_path>/sess_<id>`), which lets the page sit next to an existing
//! PHP login flow and share its sessions.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::RwLock;

use super::php_session::{self, DecodeError};
use crate::config::Config;

/// Session key written by the login handler.
pub const LOGGED_IN_KEY: &str = "loggedin";

/// Longest session id accepted before the store is consulted.
const MAX_SESSION_ID_LEN: usize = 256;

// =============================================================================
// SESSION
// =============================================================================

/// Authentication state observed for one client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    pub logged_in: bool,
}

impl Session {
    #[must_use]
    pub fn logged_in() -> Self {
        Self { logged_in: true }
    }
}

/// Errors produced while reading a session from backing storage.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session read failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session file {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
}

/// Whether `id` has the shape of a PHP session id (`[A-Za-z0-9,-]`).
///
/// Anything else is never passed to a store; for the file store this also
/// keeps ids from escaping the save directory.
#[must_use]
pub fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b',' || b == b'-')
}

// =============================================================================
// STORE TRAIT
// =============================================================================

/// Read access to a session backend. Implementations must not mutate state.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up the session identified by `id`.
    ///
    /// Returns `Ok(None)` when no live session exists for the id.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the backend could not be read or its
    /// contents could not be understood.
    async fn load(&self, id: &str) -> Result<Option<Session>, SessionError>;
}

/// Select the store named by configuration: the PHP save path when set,
/// otherwise an empty memory store that treats every client as logged out.
#[must_use]
pub fn store_from_config(config: &Config) -> Arc<dyn SessionStore> {
    match &config.session_save_path {
        Some(path) => Arc::new(FileSessionStore::new(path.clone(), config.session_max_lifetime)),
        None => Arc::new(MemorySessionStore::new()),
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

/// Sessions stored as `sess_<id>` files in a PHP `session.save_path`.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    save_path: PathBuf,
    max_lifetime: Duration,
}

impl FileSessionStore {
    #[must_use]
    pub fn new(save_path: impl Into<PathBuf>, max_lifetime: Duration) -> Self {
        Self { save_path: save_path.into(), max_lifetime }
    }

    fn session_path(&self, id: &str) -> PathBuf {
        self.save_path.join(format!("sess_{id}"))
    }

    /// A file untouched for longer than `max_lifetime` is garbage from PHP's
    /// point of view, even if the collector has not removed it yet.
    fn is_expired(&self, modified: SystemTime) -> bool {
        SystemTime::now()
            .duration_since(modified)
            .map(|age| age > self.max_lifetime)
            .unwrap_or(false)
    }
}

#[async_trait::async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self, id: &str) -> Result<Option<Session>, SessionError> {
        if !is_valid_session_id(id) {
            return Ok(None);
        }

        let path = self.session_path(id);
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(SessionError::Io { path, source }),
        };
        let modified = metadata
            .modified()
            .map_err(|source| SessionError::Io { path: path.clone(), source })?;
        if self.is_expired(modified) {
            tracing::debug!(path = %path.display(), "session file past max lifetime");
            return Ok(None);
        }

        let contents = match tokio::fs::read(&path).await {
            Ok(c) => c,
            // Removed by the collector or a logout between the two calls.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(SessionError::Io { path, source }),
        };

        let data = php_session::decode(&contents).map_err(|source| SessionError::Malformed { path, source })?;
        let logged_in = data.get(LOGGED_IN_KEY).is_some_and(php_session::PhpValue::is_truthy);
        Ok(Some(Session { logged_in }))
    }
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// Fixed in-process session table. Used when no save path is configured.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K: Into<String>> FromIterator<(K, Session)> for MemorySessionStore {
    fn from_iter<I: IntoIterator<Item = (K, Session)>>(iter: I) -> Self {
        let sessions = iter.into_iter().map(|(id, s)| (id.into(), s)).collect();
        Self { sessions: RwLock::new(sessions) }
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str) -> Result<Option<Session>, SessionError> {
        if !is_valid_session_id(id) {
            return Ok(None);
        }
        Ok(self.sessions.read().await.get(id).copied())
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
