//! The per-application [`NamespacedStore`].
//!
//! A store owns one application key inside a shared origin. Every accessor
//! is a read-modify-write of the single JSON object stored at that key:
//!
//! ```text
//! caller -> get/set/remove -> (cache?) -> engine.get_entry -> decode
//!        -> mutate in memory -> encode -> engine.set_entry -> (cache update)
//! ```
//!
//! The read-modify-write is not atomic with respect to other writers of the
//! same application key. Two stores interleaving a `set` can lose one of
//! the updates; the engine offers no primitive to prevent it.

use std::fmt;
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use nsstore_engine::StorageEngine;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};

/// The decoded contents of an application key: field name to JSON value.
pub type RootObject = Map<String, Value>;

/// A namespaced JSON object store over a shared [`StorageEngine`].
pub struct NamespacedStore {
    engine: Arc<dyn StorageEngine>,
    app_key: String,
    config: StoreConfig,
    cache: RwLock<Option<RootObject>>,
}

impl NamespacedStore {
    /// Create a store for `app_key` on `engine`.
    ///
    /// Fails with [`StoreError::InvalidArgument`] if `app_key` is empty.
    /// The engine is not touched until the first accessor call.
    pub fn new(
        engine: Arc<dyn StorageEngine>,
        app_key: impl Into<String>,
        config: StoreConfig,
    ) -> StoreResult<Self> {
        let app_key = app_key.into();
        if app_key.is_empty() {
            return Err(StoreError::invalid("application key must not be empty"));
        }
        Ok(Self {
            engine,
            app_key,
            config,
            cache: RwLock::new(None),
        })
    }

    /// The storage key holding this application's root object.
    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The engine this store reads and writes.
    pub fn engine(&self) -> &Arc<dyn StorageEngine> {
        &self.engine
    }

    // ---- Field accessors ----

    /// Read the value at `key`, or `None` if the field is absent.
    ///
    /// A stored `null` is returned as `Some(Value::Null)`.
    pub fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        validate_field_key(key)?;
        Ok(self.read_root().remove(key))
    }

    /// Read the value at `key`, falling back to `default` when absent.
    pub fn get_or(&self, key: &str, default: Value) -> StoreResult<Value> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Read the value at `key` decoded as `T`.
    ///
    /// Returns `None` when the field is absent or does not decode as `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let Some(value) = self.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_value(value) {
            Ok(decoded) => Ok(Some(decoded)),
            Err(e) => {
                warn!(app_key = %self.app_key, field = key, error = %e, "field has unexpected type");
                Ok(None)
            }
        }
    }

    /// Whether a value, possibly `null`, is stored at `key`.
    pub fn contains(&self, key: &str) -> StoreResult<bool> {
        validate_field_key(key)?;
        Ok(self.read_root().contains_key(key))
    }

    /// Store `value` at `key`, replacing any previous value.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> StoreResult<()> {
        validate_field_key(key)?;
        let mut root = self.read_root();
        root.insert(key.to_string(), value.into());
        self.write_root(root);
        Ok(())
    }

    /// Delete the field at `key`. Returns whether it was present.
    ///
    /// Removing an absent field performs no write.
    pub fn remove(&self, key: &str) -> StoreResult<bool> {
        validate_field_key(key)?;
        let mut root = self.read_root();
        if root.remove(key).is_none() {
            return Ok(false);
        }
        self.write_root(root);
        Ok(true)
    }

    // ---- Whole-object operations ----

    /// A snapshot of the root object. Mutating it does not persist anything.
    pub fn get_all(&self) -> RootObject {
        self.read_root()
    }

    /// Replace the whole root object.
    ///
    /// Anything other than a JSON object resets the root to an empty object.
    /// A write is always performed.
    pub fn set_all(&self, value: impl Into<Value>) {
        let root = match value.into() {
            Value::Object(map) => map,
            other => {
                warn!(
                    app_key = %self.app_key,
                    found = json_kind(&other),
                    "replacement is not an object; resetting to empty"
                );
                RootObject::new()
            }
        };
        self.write_root(root);
    }

    /// Whether the root object has no fields. Unreadable entries count as empty.
    pub fn is_empty(&self) -> bool {
        self.read_root().is_empty()
    }

    /// Number of fields in the root object.
    pub fn len(&self) -> usize {
        self.read_root().len()
    }

    /// Field names in the root object.
    pub fn keys(&self) -> Vec<String> {
        self.read_root().keys().cloned().collect()
    }

    /// Remove the root entry from the engine entirely.
    pub fn clear(&self) {
        match self.engine.remove_entry(&self.app_key) {
            Ok(existed) => debug!(app_key = %self.app_key, existed, "root entry cleared"),
            Err(e) => error!(app_key = %self.app_key, error = %e, "failed to clear root entry"),
        }
        if self.config.cache_reads {
            *self.cache_mut() = Some(RootObject::new());
        }
    }

    /// Drop the cached root object so the next access re-reads the engine.
    pub fn invalidate_cache(&self) {
        *self.cache_mut() = None;
    }

    /// The root object as a JSON value.
    pub fn to_json(&self) -> Value {
        Value::Object(self.get_all())
    }

    // ---- Root entry I/O ----

    fn read_root(&self) -> RootObject {
        if self.config.cache_reads {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(root) = cache.as_ref() {
                return root.clone();
            }
        }

        let root = self.try_read_root().unwrap_or_else(|e| {
            warn!(app_key = %self.app_key, error = %e, "unreadable root entry; treating as empty");
            RootObject::new()
        });

        if self.config.cache_reads {
            *self.cache_mut() = Some(root.clone());
        }
        root
    }

    fn try_read_root(&self) -> StoreResult<RootObject> {
        let read_error = |reason: String| StoreError::Read {
            key: self.app_key.clone(),
            reason,
        };

        let Some(text) = self
            .engine
            .get_entry(&self.app_key)
            .map_err(|e| read_error(e.to_string()))?
        else {
            return Ok(RootObject::new());
        };

        match serde_json::from_str::<Value>(&text).map_err(|e| read_error(e.to_string()))? {
            Value::Object(map) => Ok(map),
            other => Err(read_error(format!(
                "expected an object, found {}",
                json_kind(&other)
            ))),
        }
    }

    fn write_root(&self, root: RootObject) {
        match self.try_write_root(&root) {
            Ok(()) => debug!(app_key = %self.app_key, fields = root.len(), "root entry written"),
            Err(e) => error!(app_key = %self.app_key, error = %e, "dropping write"),
        }
        // The in-memory copy stays authoritative even when the write failed.
        if self.config.cache_reads {
            *self.cache_mut() = Some(root);
        }
    }

    fn try_write_root(&self, root: &RootObject) -> StoreResult<()> {
        let write_error = |reason: String| StoreError::Write {
            key: self.app_key.clone(),
            reason,
        };
        let text = serde_json::to_string(root).map_err(|e| write_error(e.to_string()))?;
        self.engine
            .set_entry(&self.app_key, &text)
            .map_err(|e| write_error(e.to_string()))
    }

    fn cache_mut(&self) -> RwLockWriteGuard<'_, Option<RootObject>> {
        // The cache only ever holds a complete copy, so a poisoned lock is still usable.
        self.cache.write().unwrap_or_else(|e| e.into_inner())
    }
}

pub(crate) fn validate_field_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(StoreError::invalid("field key must not be empty"));
    }
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Serialize for NamespacedStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.get_all().serialize(serializer)
    }
}

impl fmt::Display for NamespacedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl fmt::Debug for NamespacedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = self
            .cache
            .read()
            .map(|c| c.is_some())
            .unwrap_or(false);
        f.debug_struct("NamespacedStore")
            .field("app_key", &self.app_key)
            .field("cache_reads", &self.config.cache_reads)
            .field("cached", &cached)
            .finish()
    }
}
