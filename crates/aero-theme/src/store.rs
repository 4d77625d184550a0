//! Persisted settings store: a thin key-value persistence boundary.
//!
//! Persistence is best-effort by contract. The [`Settings`] facade never
//! returns an error and never panics: an unavailable backend, a quota
//! failure, or a corrupt value degrades to the caller-supplied fallback
//! (reads) or a logged warning (writes). A failed write leaves the UI in
//! an in-memory-only session; it must never break rendering.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use aero_theme::store::{MemoryStore, Settings};
//!
//! let settings = Settings::new(Arc::new(MemoryStore::new()));
//! settings.set_bool("darkMode", true);
//! assert!(settings.get_bool("darkMode", false));
//! assert_eq!(settings.get_string("missing", "fallback"), "fallback");
//! ```

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Error raised by a storage backend.
///
/// These never escape the [`Settings`] facade; they exist so backends can
/// report *why* persistence degraded and so tests can assert on it.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend is disabled or unreachable (private browsing, policy).
    #[error("storage backend unavailable")]
    Unavailable,
    /// The backend rejected the write for capacity reasons.
    #[error("storage quota exceeded writing key '{key}'")]
    QuotaExceeded { key: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Raw string-keyed storage backend.
///
/// Implementations hold strings only; typing and JSON framing live in
/// [`Settings`]. Must be object-safe so tabs, files, and fakes are
/// interchangeable behind `Arc<dyn SettingsStore>`.
pub trait SettingsStore: Send + Sync {
    /// Read the raw value for `key`, `None` if absent.
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write the raw value for `key`.
    fn set_raw(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key` if present.
    fn remove_raw(&self, key: &str) -> Result<(), StoreError>;
}

/// Typed, never-failing facade over a [`SettingsStore`] backend.
#[derive(Clone)]
pub struct Settings {
    backend: Arc<dyn SettingsStore>,
}

impl Settings {
    pub fn new(backend: Arc<dyn SettingsStore>) -> Self {
        Self { backend }
    }

    /// Read a raw string value, `None` if absent or the backend failed.
    pub fn get_opt(&self, key: &str) -> Option<String> {
        match self.backend.get_raw(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(store.key = key, error = %err, "Settings read failed, treating as absent");
                None
            }
        }
    }

    /// Read a string value, falling back on absence or backend failure.
    pub fn get_string(&self, key: &str, fallback: &str) -> String {
        self.get_opt(key).unwrap_or_else(|| fallback.to_string())
    }

    /// Write a string value, best-effort.
    pub fn set_string(&self, key: &str, value: &str) {
        if let Err(err) = self.backend.set_raw(key, value) {
            warn!(store.key = key, error = %err, "Settings write failed, value not persisted");
        } else {
            trace!(store.key = key, store.value = value, "Settings write");
        }
    }

    /// Read a boolean stored as `"true"` / `"false"`.
    ///
    /// Anything other than those two exact strings falls back.
    pub fn get_bool(&self, key: &str, fallback: bool) -> bool {
        match self.get_opt(key).as_deref() {
            Some("true") => true,
            Some("false") => false,
            Some(other) => {
                debug!(store.key = key, store.value = other, "Malformed boolean, using fallback");
                fallback
            }
            None => fallback,
        }
    }

    /// Write a boolean as `"true"` / `"false"`.
    pub fn set_bool(&self, key: &str, value: bool) {
        self.set_string(key, if value { "true" } else { "false" });
    }

    /// Read a JSON value, falling back on absence, backend failure, or a
    /// value that does not parse as `T`.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        let Some(raw) = self.get_opt(key) else {
            return fallback;
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                debug!(store.key = key, error = %err, "Corrupt JSON value, using fallback");
                fallback
            }
        }
    }

    /// Serialize and write a JSON value, best-effort.
    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.set_string(key, &raw),
            Err(err) => {
                warn!(store.key = key, error = %err, "JSON serialization failed, value not persisted");
            }
        }
    }

    /// Remove a key, best-effort.
    pub fn remove(&self, key: &str) {
        if let Err(err) = self.backend.remove_raw(key) {
            warn!(store.key = key, error = %err, "Settings remove failed");
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("backend", &"<dyn SettingsStore>")
            .finish()
    }
}

/// In-memory backend. Doubles as the degraded-persistence session store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.read().map_err(|_| StoreError::Unavailable)?;
        Ok(values.get(key).cloned())
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.write().map_err(|_| StoreError::Unavailable)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_raw(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self.values.write().map_err(|_| StoreError::Unavailable)?;
        values.remove(key);
        Ok(())
    }
}

/// Backend that always fails. Models storage disabled by browser policy;
/// wiring [`Settings`] over it exercises the degradation contract.
#[derive(Debug, Default)]
pub struct UnavailableStore;

impl SettingsStore for UnavailableStore {
    fn get_raw(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable)
    }

    fn set_raw(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }

    fn remove_raw(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }
}

/// Durable backend: one file per key under a directory.
///
/// The native analogue of browser local storage. Keys are fixed
/// identifiers owned by this crate, not arbitrary user input.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a file store rooted at `dir`.
    ///
    /// # Errors
    /// Returns `StoreError::Io` if the directory cannot be created.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys like "aero-hr-background" are already filename-safe.
        self.dir.join(key)
    }
}

impl SettingsStore for FileStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove_raw(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
