//! Namespaced JSON object storage.
//!
//! Several applications sharing one storage origin each get a single root
//! entry, keyed by their *application key*. The entry holds one JSON object
//! whose fields are that application's named values, so applications never
//! collide on raw storage keys.
//!
//! # Modules
//!
//! - [`store`] -- [`NamespacedStore`], the per-application accessor
//! - [`config`] -- [`StoreConfig`], including optional read caching
//! - [`migrate`] -- one-time helpers for moving legacy flat keys
//! - [`error`] -- [`StoreError`] and the result alias
//!
//! # Failure policy
//!
//! Only argument validation is surfaced to callers. Reads that fail
//! (missing, malformed or non-object entries) behave as if the root object
//! were empty; writes that fail (quota, I/O) are dropped. Both are reported
//! through `tracing`.
//!
//! ```
//! use std::sync::Arc;
//! use nsstore::{NamespacedStore, StoreConfig};
//! use nsstore_engine::InMemoryEngine;
//! use serde_json::json;
//!
//! let engine = Arc::new(InMemoryEngine::new());
//! let store = NamespacedStore::new(engine, "notes-app", StoreConfig::default()).unwrap();
//! store.set("theme", "dark").unwrap();
//! assert_eq!(store.get("theme").unwrap(), Some(json!("dark")));
//! assert_eq!(store.get_or("missing", json!("D")).unwrap(), json!("D"));
//! ```

pub mod config;
pub mod error;
pub mod migrate;
pub mod store;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use migrate::{
    migrate_legacy_key, migrate_rename_key, read_and_remove_legacy_key, LegacyOutcome,
    RenameOutcome,
};
pub use store::{NamespacedStore, RootObject};

pub use nsstore_engine::{FileEngine, InMemoryEngine, Quota, StorageEngine};
