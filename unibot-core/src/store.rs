//! Durable client-local state.
//!
//! Two keys survive restarts: the current session token, so monitoring can
//! resume after a reload, and the last account identifier used to start a
//! job. Secrets are never written here.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{UnibotError, UnibotResult};
use crate::models::SessionToken;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct PersistedState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    agent_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unix_email: Option<String>,
}

/// Session identity store backed by a small JSON file.
///
/// The token is never expired or deleted here; a stale token is resolved by
/// the first status poll, and a new start simply overwrites it.
#[derive(Debug)]
pub struct SessionStore {
    path: Option<PathBuf>,
    state: PersistedState,
}

impl SessionStore {
    /// Load the store from `path`. A missing or unreadable file yields an
    /// empty store rather than an error.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Ignoring corrupt session state at {}: {}", path.display(), e);
                PersistedState::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => PersistedState::default(),
            Err(e) => {
                warn!("Could not read session state at {}: {}", path.display(), e);
                PersistedState::default()
            }
        };

        Self {
            path: Some(path),
            state,
        }
    }

    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: PersistedState::default(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn current(&self) -> Option<SessionToken> {
        self.state
            .agent_session_id
            .as_deref()
            .and_then(SessionToken::new)
    }

    pub fn set_current(&mut self, token: &SessionToken) -> UnibotResult<()> {
        self.state.agent_session_id = Some(token.as_str().to_string());
        self.persist()
    }

    pub fn last_account(&self) -> Option<&str> {
        self.state.unix_email.as_deref().filter(|s| !s.is_empty())
    }

    pub fn set_last_account(&mut self, account: &str) -> UnibotResult<()> {
        self.state.unix_email = Some(account.to_string());
        self.persist()
    }

    fn persist(&self) -> UnibotResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let raw = serde_json::to_string_pretty(&self.state)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, path).map_err(|e| {
            UnibotError::Store(format!("Failed to write {}: {}", path.display(), e))
        })?;

        debug!("Persisted session state to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path().join("state.json"));
        assert!(store.current().is_none());
        assert!(store.last_account().is_none());
    }

    #[test]
    fn test_token_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let mut store = SessionStore::open(&path);
        store.set_current(&SessionToken::new("S1").unwrap()).unwrap();
        store.set_last_account("a@x.com").unwrap();

        let reopened = SessionStore::open(&path);
        assert_eq!(reopened.current().unwrap().as_str(), "S1");
        assert_eq!(reopened.last_account(), Some("a@x.com"));
    }

    #[test]
    fn test_new_token_supersedes_old() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut store = SessionStore::open(&path);
        store.set_current(&SessionToken::new("S1").unwrap()).unwrap();
        store.set_current(&SessionToken::new("S2").unwrap()).unwrap();

        assert_eq!(SessionStore::open(&path).current().unwrap().as_str(), "S2");
    }

    #[test]
    fn test_corrupt_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = SessionStore::open(&path);
        assert!(store.current().is_none());
    }

    #[test]
    fn test_file_never_contains_secret_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut store = SessionStore::open(&path);
        store.set_last_account("a@x.com").unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["unix_email"]);
    }

    #[test]
    fn test_in_memory_store() {
        let mut store = SessionStore::in_memory();
        store.set_current(&SessionToken::new("S9").unwrap()).unwrap();
        assert_eq!(store.current().unwrap().as_str(), "S9");
        assert!(store.path().is_none());
    }
}
