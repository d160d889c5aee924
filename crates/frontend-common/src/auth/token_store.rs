//! Token persistence over browser-style key-value stores
//!
//! Tokens live in one of two stores: a persistent one (`localStorage` in a
//! browser, a JSON file on native hosts) when the user asked to be
//! remembered, and a session-scoped one otherwise. Reads check the
//! persistent store first. Nothing in this module returns an error to the
//! caller: missing or malformed data simply means "no valid session".

use crate::config::StorageKeys;
use chrono::{DateTime, Utc};
use clinic_core::SessionTokens;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, warn};

/// Storage backend failure
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage IO failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage contents could not be encoded: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Synchronous string key-value store with browser `Storage` semantics
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// # Errors
    ///
    /// Returns an error if the backend rejects the write
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str);
}

/// In-process store; the session-scoped store on native hosts
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// JSON-file backed store; the persistent store on native hosts
///
/// Every write rewrites the whole file through a temporary sibling and a
/// rename, so a crash leaves either the old or the new contents.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`; an unreadable or malformed file reads as empty
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "Ignoring malformed key-value store");
                BTreeMap::new()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Cannot read key-value store");
                BTreeMap::new()
            }
        };

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, contents)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        // Memory only follows once the file has the new contents.
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if !entries.contains_key(key) {
            return;
        }
        let mut next = entries.clone();
        next.remove(key);
        match self.flush(&next) {
            Ok(()) => *entries = next,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "Failed to persist key removal");
            }
        }
    }
}

/// `localStorage` / `sessionStorage` in the browser
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserStore {
    Local,
    Session,
}

#[cfg(target_arch = "wasm32")]
impl BrowserStore {
    fn raw(self) -> web_sys::Storage {
        use gloo::storage::{LocalStorage, SessionStorage, Storage};
        match self {
            Self::Local => LocalStorage::raw(),
            Self::Session => SessionStorage::raw(),
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for BrowserStore {
    fn get(&self, key: &str) -> Option<String> {
        self.raw().get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.raw()
            .set_item(key, value)
            .map_err(|err| StorageError::Unavailable(format!("{err:?}")))
    }

    fn remove(&self, key: &str) {
        let _ = self.raw().remove_item(key);
    }
}

/// Owner of the access/refresh token pair
///
/// Constructed once at startup and shared by `Arc` with the request
/// interceptor, session restore and the auth flows.
pub struct TokenStore {
    local: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
    keys: StorageKeys,
}

impl TokenStore {
    pub fn new(
        local: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
        keys: StorageKeys,
    ) -> Self {
        Self {
            local,
            session,
            keys,
        }
    }

    /// Token store over two fresh in-memory stores
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            StorageKeys::default(),
        )
    }

    /// Write the pair to the persistent store if `persist`, else the
    /// session store, and drop any pair held by the other store.
    pub fn save(&self, tokens: &SessionTokens, persist: bool) {
        let (target, other) = if persist {
            (&self.local, &self.session)
        } else {
            (&self.session, &self.local)
        };

        let mut writes = vec![
            (self.keys.access.as_str(), tokens.access_token.clone()),
            (self.keys.refresh.as_str(), tokens.refresh_token.clone()),
        ];
        match tokens.expires_at.at() {
            Some(at) => {
                writes.push((self.keys.expiry.as_str(), at.timestamp_millis().to_string()));
            }
            None => target.remove(&self.keys.expiry),
        }

        for (key, value) in writes {
            if let Err(err) = target.set(key, &value) {
                warn!(key, error = %err, "Failed to store token value");
            }
        }
        for key in self.keys.all() {
            other.remove(key);
        }

        debug!(persist, "Saved session tokens");
    }

    fn read(&self, key: &str) -> Option<String> {
        self.local
            .get(key)
            .filter(|value| !value.is_empty())
            .or_else(|| self.session.get(key).filter(|value| !value.is_empty()))
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(&self.keys.access)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read(&self.keys.refresh)
    }

    /// Recorded expiry, if present and well-formed
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.read(&self.keys.expiry)?;
        raw.trim()
            .parse::<i64>()
            .ok()
            .and_then(DateTime::from_timestamp_millis)
    }

    /// True when no usable expiry is recorded or it has passed
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_none_or(|expires_at| now >= expires_at)
    }

    /// Access token present and not expired
    pub fn has_valid_auth(&self) -> bool {
        self.has_valid_auth_at(Utc::now())
    }

    pub fn has_valid_auth_at(&self, now: DateTime<Utc>) -> bool {
        self.access_token().is_some() && !self.is_expired_at(now)
    }

    /// Whether the current pair lives in the persistent store
    pub fn is_persistent(&self) -> bool {
        self.local
            .get(&self.keys.access)
            .is_some_and(|value| !value.is_empty())
    }

    /// Remove all token keys from both stores
    pub fn clear(&self) {
        for key in self.keys.all() {
            self.local.remove(key);
            self.session.remove(key);
        }
        debug!("Cleared session tokens");
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("keys", &self.keys)
            .field("has_access_token", &self.access_token().is_some())
            .finish_non_exhaustive()
    }
}
