//! One-time migration of legacy storage keys.
//!
//! Before applications were namespaced, their values lived directly at flat
//! keys in the origin. These helpers move such entries into their new home
//! and always delete the legacy key afterwards, so running a migration twice
//! is harmless.
//!
//! All helpers follow the store's best-effort policy: engine failures are
//! logged and treated as absence (reads) or skipped (writes).

use serde_json::Value;
use tracing::{debug, warn};

use nsstore_engine::StorageEngine;

use crate::error::StoreResult;
use crate::store::{validate_field_key, NamespacedStore};

/// Result of [`migrate_rename_key`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenameOutcome {
    /// The old entry was copied to the new key and removed.
    Moved,
    /// The new key already held an entry; the old one was discarded.
    DestinationKept,
    /// Writing the new key failed; the old entry was discarded anyway.
    CopyFailed,
    /// No entry existed at the old key.
    NothingToMigrate,
    /// Old and new keys were identical; nothing was touched.
    SameKey,
}

/// Result of [`migrate_legacy_key`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LegacyOutcome {
    /// The legacy value was written into the store and the key removed.
    Migrated,
    /// The store already had a value at the field; the legacy key was discarded.
    AlreadyPresent,
    /// No entry existed at the legacy key.
    NothingToMigrate,
}

/// Move the raw entry at `old_key` to `new_key`.
///
/// The destination is never overwritten. The entry at `old_key` is removed
/// whether or not it was copied.
pub fn migrate_rename_key(engine: &dyn StorageEngine, old_key: &str, new_key: &str) -> RenameOutcome {
    if old_key == new_key {
        return RenameOutcome::SameKey;
    }

    let Some(text) = read_entry(engine, old_key) else {
        return RenameOutcome::NothingToMigrate;
    };

    let outcome = match engine.contains_entry(new_key) {
        Ok(true) => RenameOutcome::DestinationKept,
        Ok(false) => {
            match engine.set_entry(new_key, &text) {
                Ok(()) => RenameOutcome::Moved,
                Err(e) => {
                    warn!(old_key, new_key, error = %e, "failed to copy legacy entry");
                    RenameOutcome::CopyFailed
                }
            }
        }
        Err(e) => {
            warn!(new_key, error = %e, "cannot inspect destination; leaving it untouched");
            RenameOutcome::DestinationKept
        }
    };

    remove_entry(engine, old_key);
    debug!(old_key, new_key, ?outcome, "rename migration");
    outcome
}

/// Move the legacy flat entry at `old_key` into `store` under `sub_key`.
///
/// The legacy text is decoded as JSON, or kept as a plain string when it
/// does not parse. An existing field at `sub_key`, including a stored
/// `null`, wins over the legacy value. The legacy entry is removed whenever
/// it existed.
pub fn migrate_legacy_key(
    store: &NamespacedStore,
    old_key: &str,
    sub_key: &str,
) -> StoreResult<LegacyOutcome> {
    validate_field_key(sub_key)?;

    let engine = store.engine().as_ref();
    let Some(text) = read_entry(engine, old_key) else {
        return Ok(LegacyOutcome::NothingToMigrate);
    };

    let outcome = if store.contains(sub_key)? {
        LegacyOutcome::AlreadyPresent
    } else {
        store.set(sub_key, decode_lenient(text))?;
        LegacyOutcome::Migrated
    };

    remove_entry(engine, old_key);
    debug!(
        old_key,
        app_key = store.app_key(),
        sub_key,
        ?outcome,
        "legacy key migration"
    );
    Ok(outcome)
}

/// Remove the entry at `key` and return its decoded value.
///
/// Returns `None` when no entry existed, which is distinct from
/// `Some(Value::Null)` for a stored `null`. Text that is not valid JSON is
/// returned as a string.
pub fn read_and_remove_legacy_key(engine: &dyn StorageEngine, key: &str) -> Option<Value> {
    let text = read_entry(engine, key)?;
    remove_entry(engine, key);
    Some(decode_lenient(text))
}

fn decode_lenient(text: String) -> Value {
    serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text))
}

fn read_entry(engine: &dyn StorageEngine, key: &str) -> Option<String> {
    engine.get_entry(key).unwrap_or_else(|e| {
        warn!(key, error = %e, "failed to read legacy entry; treating as absent");
        None
    })
}

fn remove_entry(engine: &dyn StorageEngine, key: &str) {
    if let Err(e) = engine.remove_entry(key) {
        warn!(key, error = %e, "failed to remove legacy entry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::error::StoreError;
    use nsstore_engine::{InMemoryEngine, Quota};
    use serde_json::json;
    use std::sync::Arc;

    fn store_on(engine: &Arc<InMemoryEngine>, app_key: &str) -> NamespacedStore {
        NamespacedStore::new(engine.clone(), app_key, StoreConfig::default()).unwrap()
    }

    // -----------------------------------------------------------------------
    // migrate_rename_key
    // -----------------------------------------------------------------------

    #[test]
    fn rename_moves_entry() {
        let engine = InMemoryEngine::new();
        engine.set_entry("old", "{\"a\":1}").unwrap();

        let outcome = migrate_rename_key(&engine, "old", "new");
        assert_eq!(outcome, RenameOutcome::Moved);
        assert_eq!(engine.get_entry("new").unwrap().as_deref(), Some("{\"a\":1}"));
        assert!(engine.get_entry("old").unwrap().is_none());
    }

    #[test]
    fn rename_twice_is_noop() {
        let engine = InMemoryEngine::new();
        engine.set_entry("old", "payload").unwrap();
        migrate_rename_key(&engine, "old", "new");
        let writes = engine.write_count();

        assert_eq!(migrate_rename_key(&engine, "old", "new"), RenameOutcome::NothingToMigrate);
        assert_eq!(engine.get_entry("new").unwrap().as_deref(), Some("payload"));
        assert_eq!(engine.write_count(), writes);
    }

    #[test]
    fn rename_never_clobbers_destination() {
        let engine = InMemoryEngine::new();
        engine.set_entry("old", "stale").unwrap();
        engine.set_entry("new", "current").unwrap();

        assert_eq!(migrate_rename_key(&engine, "old", "new"), RenameOutcome::DestinationKept);
        assert_eq!(engine.get_entry("new").unwrap().as_deref(), Some("current"));
        assert!(engine.get_entry("old").unwrap().is_none());
    }

    #[test]
    fn rename_reports_failed_copy() {
        let engine = InMemoryEngine::with_quota(Quota::units(20));
        engine.set_entry("old", "0123456789").unwrap();

        assert_eq!(migrate_rename_key(&engine, "old", "new"), RenameOutcome::CopyFailed);
        assert!(engine.get_entry("new").unwrap().is_none());
        assert!(engine.get_entry("old").unwrap().is_none());
    }

    #[test]
    fn rename_same_key_is_untouched() {
        let engine = InMemoryEngine::new();
        engine.set_entry("k", "v").unwrap();
        assert_eq!(migrate_rename_key(&engine, "k", "k"), RenameOutcome::SameKey);
        assert_eq!(engine.get_entry("k").unwrap().as_deref(), Some("v"));
    }

    // -----------------------------------------------------------------------
    // migrate_legacy_key
    // -----------------------------------------------------------------------

    #[test]
    fn legacy_json_value_is_decoded() {
        let engine = Arc::new(InMemoryEngine::new());
        engine.set_entry("legacyTheme", "{\"mode\":\"dark\"}").unwrap();
        let store = store_on(&engine, "app");

        let outcome = migrate_legacy_key(&store, "legacyTheme", "theme").unwrap();
        assert_eq!(outcome, LegacyOutcome::Migrated);
        assert_eq!(store.get("theme").unwrap(), Some(json!({"mode": "dark"})));
        assert!(engine.get_entry("legacyTheme").unwrap().is_none());
    }

    #[test]
    fn legacy_raw_text_is_kept_as_string() {
        let engine = Arc::new(InMemoryEngine::new());
        engine.set_entry("legacyName", "plain words").unwrap();
        let store = store_on(&engine, "app");

        migrate_legacy_key(&store, "legacyName", "name").unwrap();
        assert_eq!(store.get("name").unwrap(), Some(json!("plain words")));
    }

    #[test]
    fn legacy_does_not_override_present_null() {
        let engine = Arc::new(InMemoryEngine::new());
        engine.set_entry("legacy", "5").unwrap();
        let store = store_on(&engine, "app");
        store.set("count", Value::Null).unwrap();

        let outcome = migrate_legacy_key(&store, "legacy", "count").unwrap();
        assert_eq!(outcome, LegacyOutcome::AlreadyPresent);
        assert_eq!(store.get("count").unwrap(), Some(Value::Null));
        assert!(engine.get_entry("legacy").unwrap().is_none());
    }

    #[test]
    fn legacy_missing_is_noop() {
        let engine = Arc::new(InMemoryEngine::new());
        let store = store_on(&engine, "app");
        let outcome = migrate_legacy_key(&store, "absent", "field").unwrap();
        assert_eq!(outcome, LegacyOutcome::NothingToMigrate);
        assert!(store.is_empty());
        assert_eq!(engine.write_count(), 0);
    }

    #[test]
    fn legacy_rejects_empty_sub_key() {
        let engine = Arc::new(InMemoryEngine::new());
        engine.set_entry("legacy", "1").unwrap();
        let store = store_on(&engine, "app");
        let err = migrate_legacy_key(&store, "legacy", "").unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument { .. }));
        // Nothing was consumed.
        assert!(engine.get_entry("legacy").unwrap().is_some());
    }

    // -----------------------------------------------------------------------
    // read_and_remove_legacy_key
    // -----------------------------------------------------------------------

    #[test]
    fn read_and_remove_distinguishes_null_from_absent() {
        let engine = InMemoryEngine::new();
        engine.set_entry("nullish", "null").unwrap();

        assert_eq!(read_and_remove_legacy_key(&engine, "nullish"), Some(Value::Null));
        assert_eq!(read_and_remove_legacy_key(&engine, "nullish"), None);
        assert_eq!(read_and_remove_legacy_key(&engine, "never"), None);
    }

    #[test]
    fn read_and_remove_falls_back_to_raw_text() {
        let engine = InMemoryEngine::new();
        engine.set_entry("raw", "{oops").unwrap();
        engine.set_entry("num", "12.5").unwrap();

        assert_eq!(read_and_remove_legacy_key(&engine, "raw"), Some(json!("{oops")));
        assert_eq!(read_and_remove_legacy_key(&engine, "num"), Some(json!(12.5)));
        assert!(engine.is_empty());
    }
}
