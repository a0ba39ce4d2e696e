//! Best-effort key/value persistence with a one-way fallback
//!
//! The adapter talks to a preferred user-data backend (the host's per-user
//! storage) until that backend fails once. From then on it uses the local
//! fallback backend for the rest of its life and never probes the preferred
//! one again. Failures are never surfaced: a failed read resolves to
//! "absent", a failed write is dropped.
//!
//! # Backend selection
//!
//! ```text
//! Preferred ──(any error, incl. Unsupported)──▶ Fallback   (never reversed)
//! ```
//!
//! An adapter built without a preferred backend starts in fallback mode; one
//! built without a fallback backend resolves everything to absent once the
//! preferred backend has failed.

use crate::error::StorageError;
use crate::scheduler::Scheduler;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use strum::Display;
use tracing::{debug, warn};

/// A persisted value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    Flag(bool),
    Text(String),
}

impl StoredValue {
    /// The boolean payload, if this is a flag
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(flag) => Some(*flag),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Flag(_) => None,
        }
    }

    /// Encode for string-only backends
    pub fn encode(&self) -> String {
        match self {
            Self::Flag(flag) => flag.to_string(),
            Self::Text(text) => serde_json::to_string(text).unwrap_or_else(|_| text.clone()),
        }
    }

    /// Decode a string written by [`StoredValue::encode`].
    ///
    /// Text that is not valid JSON is kept verbatim.
    pub fn decode(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_else(|_| Self::Text(raw.to_string()))
    }
}

impl From<bool> for StoredValue {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

impl From<&str> for StoredValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Completion callback for [`UserDataBackend::get_user_data`]
pub type UserDataCallback = Box<dyn FnOnce(Result<Option<StoredValue>, StorageError>)>;

/// The host's per-user data API (preferred backend)
pub trait UserDataBackend {
    /// Read `key` in `namespace`, reporting through `done` exactly once
    fn get_user_data(&self, namespace: &str, key: &str, done: UserDataCallback);

    /// Write `key` in `namespace`
    fn set_user_data(
        &self,
        namespace: &str,
        key: &str,
        value: &StoredValue,
    ) -> Result<(), StorageError>;
}

/// Local string storage (fallback backend)
pub trait LocalBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Which backend the adapter currently uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum BackendMode {
    Preferred,
    Fallback,
}

struct AdapterInner {
    namespace: String,
    preferred: Option<Box<dyn UserDataBackend>>,
    fallback: Option<Box<dyn LocalBackend>>,
    mode: Cell<BackendMode>,
}

/// Cloneable handle to a storage adapter; clones share the fallback flag
#[derive(Clone)]
pub struct StorageAdapter {
    inner: Rc<AdapterInner>,
}

impl StorageAdapter {
    /// Create an adapter over the given backends
    pub fn new(
        namespace: impl Into<String>,
        preferred: Option<Box<dyn UserDataBackend>>,
        fallback: Option<Box<dyn LocalBackend>>,
    ) -> Self {
        let mode = if preferred.is_some() {
            BackendMode::Preferred
        } else {
            BackendMode::Fallback
        };
        Self {
            inner: Rc::new(AdapterInner {
                namespace: namespace.into(),
                preferred,
                fallback,
                mode: Cell::new(mode),
            }),
        }
    }

    /// Adapter backed only by process memory
    pub fn in_memory() -> Self {
        Self::new(
            "guided-tour",
            Some(Box::new(MemoryUserData::new())),
            Some(Box::new(MemoryStorage::new())),
        )
    }

    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    pub fn mode(&self) -> BackendMode {
        self.inner.mode.get()
    }

    /// Read `key`, delivering the value (or `None`) to `done`.
    ///
    /// With the preferred backend active the reply may arrive later, on
    /// whatever schedule that backend uses.
    pub fn get(&self, key: &str, done: impl FnOnce(Option<StoredValue>) + 'static) {
        let preferred = match (self.mode(), self.inner.preferred.as_deref()) {
            (BackendMode::Preferred, Some(preferred)) => preferred,
            _ => {
                done(self.fallback_get(key));
                return;
            }
        };

        let adapter = self.clone();
        let owned_key = key.to_string();
        preferred.get_user_data(
            &self.inner.namespace,
            key,
            Box::new(move |result| match result {
                Ok(value) => done(value),
                Err(err) => {
                    adapter.enter_fallback(&err);
                    done(adapter.fallback_get(&owned_key));
                }
            }),
        );
    }

    /// Write `key`. Failures are logged and dropped.
    pub fn set(&self, key: &str, value: impl Into<StoredValue>) {
        let value = value.into();
        if self.mode() == BackendMode::Preferred {
            if let Some(preferred) = self.inner.preferred.as_deref() {
                match preferred.set_user_data(&self.inner.namespace, key, &value) {
                    Ok(()) => return,
                    Err(err) => self.enter_fallback(&err),
                }
            }
        }
        self.fallback_set(key, &value);
    }

    fn enter_fallback(&self, err: &StorageError) {
        if self.inner.mode.replace(BackendMode::Fallback) == BackendMode::Preferred {
            warn!(
                namespace = %self.inner.namespace,
                "preferred storage failed ({}), switching to fallback storage", err
            );
        }
    }

    fn fallback_get(&self, key: &str) -> Option<StoredValue> {
        let fallback = self.inner.fallback.as_deref()?;
        match fallback.get_item(key) {
            Ok(raw) => raw.map(|raw| StoredValue::decode(&raw)),
            Err(err) => {
                debug!(key, "fallback storage read failed: {}", err);
                None
            }
        }
    }

    fn fallback_set(&self, key: &str, value: &StoredValue) {
        let Some(fallback) = self.inner.fallback.as_deref() else {
            debug!(key, "no fallback storage, dropping write");
            return;
        };
        if let Err(err) = fallback.set_item(key, &value.encode()) {
            debug!(key, "fallback storage write failed: {}", err);
        }
    }
}

impl std::fmt::Debug for StorageAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageAdapter")
            .field("namespace", &self.inner.namespace)
            .field("mode", &self.mode())
            .field("has_fallback", &self.inner.fallback.is_some())
            .finish()
    }
}

// ============================================================================
// Built-in backends
// ============================================================================

/// In-memory user-data backend.
///
/// Replies immediately, or on the next tick when built with
/// [`MemoryUserData::deferred`].
#[derive(Default)]
pub struct MemoryUserData {
    values: Rc<RefCell<HashMap<(String, String), StoredValue>>>,
    scheduler: Option<Scheduler>,
}

impl MemoryUserData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver reads through `scheduler` instead of inline
    pub fn deferred(scheduler: Scheduler) -> Self {
        Self {
            values: Rc::default(),
            scheduler: Some(scheduler),
        }
    }
}

impl UserDataBackend for MemoryUserData {
    fn get_user_data(&self, namespace: &str, key: &str, done: UserDataCallback) {
        let value = self
            .values
            .borrow()
            .get(&(namespace.to_string(), key.to_string()))
            .cloned();
        match &self.scheduler {
            Some(scheduler) => scheduler.defer(move || done(Ok(value))),
            None => done(Ok(value)),
        }
    }

    fn set_user_data(
        &self,
        namespace: &str,
        key: &str,
        value: &StoredValue,
    ) -> Result<(), StorageError> {
        self.values
            .borrow_mut()
            .insert((namespace.to_string(), key.to_string()), value.clone());
        Ok(())
    }
}

/// User-data backend for hosts without a user-data API
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedUserData;

impl UserDataBackend for UnsupportedUserData {
    fn get_user_data(&self, _namespace: &str, _key: &str, done: UserDataCallback) {
        done(Err(StorageError::Unsupported));
    }

    fn set_user_data(
        &self,
        _namespace: &str,
        _key: &str,
        _value: &StoredValue,
    ) -> Result<(), StorageError> {
        Err(StorageError::Unsupported)
    }
}

/// In-memory local storage
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl LocalBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Local storage kept as a JSON object in a single file.
///
/// The file is read on every access; a missing file is an empty store.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(HashMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, items: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(items)?)?;
        Ok(())
    }
}

impl LocalBackend for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.load()?;
        items.insert(key.to_string(), value.to_string());
        self.save(&items)
    }
}
