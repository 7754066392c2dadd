use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::error::{EngineError, EngineResult};
use crate::quota::Quota;
use crate::traits::StorageEngine;

/// In-memory, HashMap-based storage engine.
///
/// Intended for tests and embedding. Entries are held behind a `RwLock`
/// and cloned on read. Unlimited by default; use [`with_quota`] to emulate
/// a capacity-limited origin.
///
/// [`with_quota`]: InMemoryEngine::with_quota
pub struct InMemoryEngine {
    entries: RwLock<HashMap<String, String>>,
    quota: Quota,
    writes: AtomicU64,
}

impl InMemoryEngine {
    /// Create a new empty engine with no capacity limit.
    pub fn new() -> Self {
        Self::with_quota(Quota::unlimited())
    }

    /// Create a new empty engine limited to `quota`.
    pub fn with_quota(quota: Quota) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            quota,
            writes: AtomicU64::new(0),
        }
    }

    /// Number of `set_entry` calls made so far, successful or not.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Returns `true` if the origin holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }

    /// Current usage in UTF-16 code units.
    pub fn usage_units(&self) -> usize {
        Quota::usage(&self.entries.read().expect("lock poisoned"))
    }

    /// Remove every entry in the origin.
    pub fn clear(&self) {
        self.entries.write().expect("lock poisoned").clear();
    }
}

impl Default for InMemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine for InMemoryEngine {
    fn get_entry(&self, key: &str) -> EngineResult<Option<String>> {
        let map = self
            .entries
            .read()
            .map_err(|e| EngineError::Poisoned(e.to_string()))?;
        Ok(map.get(key).cloned())
    }

    fn set_entry(&self, key: &str, value: &str) -> EngineResult<()> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        let mut map = self
            .entries
            .write()
            .map_err(|e| EngineError::Poisoned(e.to_string()))?;
        self.quota.check(&map, key, value)?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_entry(&self, key: &str) -> EngineResult<bool> {
        let mut map = self
            .entries
            .write()
            .map_err(|e| EngineError::Poisoned(e.to_string()))?;
        Ok(map.remove(key).is_some())
    }

    fn keys(&self) -> EngineResult<Vec<String>> {
        let map = self
            .entries
            .read()
            .map_err(|e| EngineError::Poisoned(e.to_string()))?;
        let mut keys: Vec<String> = map.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

impl std::fmt::Debug for InMemoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.entries.read().map(|m| m.len()).unwrap_or(0);
        f.debug_struct("InMemoryEngine")
            .field("entry_count", &count)
            .field("quota", &self.quota.limit())
            .finish()
    }
}
