//! Memoized parsing for callers that see the same identifiers repeatedly.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::trace;

use crate::error::Result;
use crate::identifier::{Identifier, parse};
use crate::validate::ValidationReport;

/// Thread-safe parse cache keyed on the exact input text.
///
/// Successes and failures are both cached. Parsing is deterministic, so
/// racing writers always store the same value and the first insert wins.
/// Once `max_entries` is reached, new results are still returned but are no
/// longer stored.
///
/// # Examples
///
/// ```
/// use gts_core::ParseCache;
///
/// let cache = ParseCache::with_capacity(128);
/// let first = cache.parse("gts.x.core.events.type.v1~").unwrap();
/// let second = cache.parse("gts.x.core.events.type.v1~").unwrap();
/// assert_eq!(first, second);
/// assert_eq!(cache.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ParseCache {
    entries: RwLock<HashMap<String, Result<Identifier>>>,
    max_entries: Option<usize>,
}

impl ParseCache {
    /// Creates an unbounded cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache that stores at most `max_entries` results.
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: Some(max_entries),
        }
    }

    /// Parses `raw`, reusing a cached result when one exists.
    ///
    /// # Errors
    ///
    /// Same as [`parse`](crate::parse).
    pub fn parse(&self, raw: &str) -> Result<Identifier> {
        if let Some(hit) = self.read().get(raw) {
            trace!(input = raw, "parse cache hit");
            return hit.clone();
        }

        let result = parse(raw);
        let mut entries = self.write();
        let full = self
            .max_entries
            .is_some_and(|max| entries.len() >= max && !entries.contains_key(raw));
        if full {
            trace!(input = raw, "parse cache full, not storing");
            return result;
        }
        trace!(input = raw, "parse cache miss");
        entries
            .entry(raw.to_string())
            .or_insert_with(|| result.clone())
            .clone()
    }

    /// Cached counterpart of [`validate`](crate::validate).
    pub fn validate(&self, raw: &str) -> ValidationReport {
        ValidationReport::from_result(raw, &self.parse(raw))
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Result<Identifier>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Result<Identifier>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_caches_failures() {
        let cache = ParseCache::new();
        let err = cache.parse("gts.A.b.c.d.v1").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidSegmentFormat);
        assert_eq!(cache.parse("gts.A.b.c.d.v1").unwrap_err(), err);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_key_is_exact_input() {
        let cache = ParseCache::new();
        cache.parse("gts.a.b.c.d.v1").unwrap();
        cache.parse(" gts.a.b.c.d.v1").unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_capacity_limits_storage_but_not_results() {
        let cache = ParseCache::with_capacity(1);
        cache.parse("gts.a.b.c.d.v1").unwrap();
        let second = cache.parse("gts.a.b.c.d.v2").unwrap();
        assert_eq!(second.terminal().major().as_str(), "2");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear() {
        let cache = ParseCache::new();
        cache.parse("gts.a.b.c.d.v1").unwrap();
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_parses_agree() {
        let cache = Arc::new(ParseCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.parse("gts.x.core.events.type.v1~").unwrap())
            })
            .collect();

        let results: Vec<Identifier> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();
        assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cached_validate() {
        let cache = ParseCache::new();
        let report = cache.validate("gts.vendor.app.user.profile.v2.1");
        assert!(report.is_valid);
        assert_eq!(cache.len(), 1);
    }
}
