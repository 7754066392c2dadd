use crate::error::EngineResult;

/// Flat, origin-scoped string key-value storage.
///
/// All implementations must satisfy these invariants:
/// - Keys and values are opaque strings; the engine never parses them.
/// - Every call completes synchronously.
/// - A failed `set_entry` leaves the previous value (or absence) intact.
/// - Errors are returned, never logged and dropped.
pub trait StorageEngine: Send + Sync {
    /// Read the entry stored at `key`.
    ///
    /// Returns `Ok(None)` if no entry exists.
    fn get_entry(&self, key: &str) -> EngineResult<Option<String>>;

    /// Create or replace the entry at `key`.
    ///
    /// Fails with [`EngineError::QuotaExceeded`](crate::EngineError::QuotaExceeded)
    /// when the new value does not fit.
    fn set_entry(&self, key: &str, value: &str) -> EngineResult<()>;

    /// Remove the entry at `key`. Returns `true` if it existed.
    fn remove_entry(&self, key: &str) -> EngineResult<bool>;

    /// Check whether an entry exists at `key`.
    fn contains_entry(&self, key: &str) -> EngineResult<bool> {
        Ok(self.get_entry(key)?.is_some())
    }

    /// All entry keys, sorted.
    fn keys(&self) -> EngineResult<Vec<String>>;

    /// Number of entries in the origin.
    fn len(&self) -> EngineResult<usize> {
        Ok(self.keys()?.len())
    }
}
