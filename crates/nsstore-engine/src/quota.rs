//! Capacity accounting for storage origins.
//!
//! Browsers measure local storage usage in UTF-16 code units of every key
//! and value in the origin. Engines here account the same way so a quota
//! configured to mirror a browser rejects the same writes a browser would.

use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};

/// Default capacity of an origin: five mebi code units.
pub const DEFAULT_QUOTA_UNITS: usize = 5 * 1024 * 1024;

/// Size of one entry in UTF-16 code units.
pub fn entry_units(key: &str, value: &str) -> usize {
    key.encode_utf16().count() + value.encode_utf16().count()
}

/// Capacity limit for one origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quota {
    limit: Option<usize>,
}

impl Quota {
    /// A quota of `units` UTF-16 code units.
    pub fn units(units: usize) -> Self {
        Self { limit: Some(units) }
    }

    /// No capacity limit.
    pub fn unlimited() -> Self {
        Self { limit: None }
    }

    /// The configured limit, if any.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Total usage of `entries` in code units.
    pub fn usage(entries: &HashMap<String, String>) -> usize {
        entries.iter().map(|(k, v)| entry_units(k, v)).sum()
    }

    /// Verify that storing `value` at `key` keeps `entries` within the limit.
    ///
    /// The existing value at `key`, if any, is not counted since it would
    /// be replaced.
    pub fn check(&self, entries: &HashMap<String, String>, key: &str, value: &str) -> EngineResult<()> {
        let Some(quota) = self.limit else {
            return Ok(());
        };
        let replaced = entries.get(key).map(|old| entry_units(key, old)).unwrap_or(0);
        let required = Self::usage(entries) - replaced + entry_units(key, value);
        if required > quota {
            return Err(EngineError::QuotaExceeded {
                key: key.to_string(),
                required,
                quota,
            });
        }
        Ok(())
    }
}

impl Default for Quota {
    fn default() -> Self {
        Self::units(DEFAULT_QUOTA_UNITS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn units_count_utf16() {
        assert_eq!(entry_units("ab", "cd"), 4);
        // U+1F600 is a surrogate pair in UTF-16.
        assert_eq!(entry_units("k", "\u{1F600}"), 3);
        assert_eq!(entry_units("k", "é"), 2);
    }

    #[test]
    fn unlimited_never_rejects() {
        let q = Quota::unlimited();
        let big = "x".repeat(DEFAULT_QUOTA_UNITS * 2);
        assert!(q.check(&HashMap::new(), "k", &big).is_ok());
        assert_eq!(q.limit(), None);
    }

    #[test]
    fn rejects_when_over_limit() {
        let q = Quota::units(10);
        let e = entries(&[("a", "12345")]); // 6 units
        assert!(q.check(&e, "b", "12").is_ok()); // 6 + 3 = 9
        let err = q.check(&e, "b", "12345").unwrap_err(); // 6 + 6 = 12
        match err {
            EngineError::QuotaExceeded { key, required, quota } => {
                assert_eq!(key, "b");
                assert_eq!(required, 12);
                assert_eq!(quota, 10);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn replacement_does_not_double_count() {
        let q = Quota::units(10);
        let e = entries(&[("a", "123456789")]); // 10 units, exactly full
        assert!(q.check(&e, "a", "987654321").is_ok());
        assert!(q.check(&e, "a", "1234567890").is_err());
    }

    #[test]
    fn default_is_browser_sized() {
        assert_eq!(Quota::default().limit(), Some(DEFAULT_QUOTA_UNITS));
    }
}
