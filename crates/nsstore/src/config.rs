use serde::{Deserialize, Serialize};

/// Configuration for a [`NamespacedStore`](crate::NamespacedStore).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Keep the decoded root object in memory after the first read.
    ///
    /// Repeated reads skip the engine entirely, but the store will not see
    /// writes made by other instances or processes to the same application
    /// key until [`invalidate_cache`](crate::NamespacedStore::invalidate_cache)
    /// is called.
    pub cache_reads: bool,
}

impl StoreConfig {
    /// A configuration with read caching enabled.
    pub fn cached() -> Self {
        Self { cache_reads: true }
    }
}
