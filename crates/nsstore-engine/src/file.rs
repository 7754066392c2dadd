//! File-backed storage engine.
//!
//! A [`FileEngine`] keeps one origin in one JSON file: a single object
//! mapping entry keys to their string values. The whole file is loaded on
//! open and kept in memory; every mutation rewrites it through a temporary
//! file in the same directory that is then renamed over the original, so a
//! crash mid-write leaves either the old or the new origin on disk, never a
//! torn one.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::quota::Quota;
use crate::traits::StorageEngine;

/// Persistent origin stored as one JSON file.
pub struct FileEngine {
    path: PathBuf,
    quota: Quota,
    entries: RwLock<HashMap<String, String>>,
}

impl FileEngine {
    /// Open (or create) the origin file at `path`.
    ///
    /// The file is not created until the first write. An existing file that
    /// is not a JSON object of strings fails with [`EngineError::Corrupt`].
    pub fn open(path: &Path, quota: Quota) -> EngineResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let entries = if path.exists() {
            let text = fs::read_to_string(path)?;
            if text.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str::<HashMap<String, String>>(&text).map_err(|e| {
                    EngineError::Corrupt {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    }
                })?
            }
        } else {
            HashMap::new()
        };

        debug!(path = %path.display(), entries = entries.len(), "opened storage file");

        Ok(Self {
            path: path.to_path_buf(),
            quota,
            entries: RwLock::new(entries),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The capacity limit applied to writes.
    pub fn quota(&self) -> Quota {
        self.quota
    }

    /// Current usage in UTF-16 code units.
    pub fn usage_units(&self) -> EngineResult<usize> {
        let map = self
            .entries
            .read()
            .map_err(|e| EngineError::Poisoned(e.to_string()))?;
        Ok(Quota::usage(&map))
    }

    /// Size of a single entry in code units, if it exists.
    pub fn entry_units(&self, key: &str) -> EngineResult<Option<usize>> {
        Ok(self
            .get_entry(key)?
            .map(|value| crate::quota::entry_units(key, &value)))
    }

    /// Write `entries` to disk atomically.
    fn flush(&self, entries: &HashMap<String, String>) -> EngineResult<()> {
        // Sorted on disk so diffs of the origin file stay readable.
        let sorted: BTreeMap<&String, &String> = entries.iter().collect();
        let bytes = serde_json::to_vec_pretty(&sorted)
            .map_err(|e| EngineError::Serialization(e.to_string()))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| EngineError::Io(e.error))?;

        debug!(path = %self.path.display(), bytes = bytes.len(), "storage file written");
        Ok(())
    }
}

impl StorageEngine for FileEngine {
    fn get_entry(&self, key: &str) -> EngineResult<Option<String>> {
        let map = self
            .entries
            .read()
            .map_err(|e| EngineError::Poisoned(e.to_string()))?;
        Ok(map.get(key).cloned())
    }

    fn set_entry(&self, key: &str, value: &str) -> EngineResult<()> {
        let mut map = self
            .entries
            .write()
            .map_err(|e| EngineError::Poisoned(e.to_string()))?;
        self.quota.check(&map, key, value)?;

        let previous = map.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush(&map) {
            // Roll back so memory never runs ahead of disk.
            match previous {
                Some(old) => map.insert(key.to_string(), old),
                None => map.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove_entry(&self, key: &str) -> EngineResult<bool> {
        let mut map = self
            .entries
            .write()
            .map_err(|e| EngineError::Poisoned(e.to_string()))?;
        let Some(previous) = map.remove(key) else {
            return Ok(false);
        };
        if let Err(e) = self.flush(&map) {
            map.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(true)
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

impl std::fmt::Debug for FileEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.entries.read().map(|m| m.len()).unwrap_or(0);
        f.debug_struct("FileEngine")
            .field("path", &self.path)
            .field("entry_count", &count)
            .finish()
    }
}
