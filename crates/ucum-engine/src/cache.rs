//! Memoization of defined-unit canonical forms.
//!
//! A defined unit's definition never changes once the terminology is
//! loaded, so its canonical form is computed at most once per cache
//! lifetime. Concurrent callers may compute the same entry twice; the first
//! insert is kept and later ones return it.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;

use crate::canonical::Canonical;
use crate::config::CacheConfig;

/// Thread-safe LRU cache from defined-unit code to canonical form.
///
/// # Example
///
/// ```rust
/// use ucum_engine::{CacheConfig, Canonical, DefinitionCache};
/// use ucum_model::Decimal;
///
/// let cache = DefinitionCache::new(CacheConfig::default());
/// assert!(cache.get("[pi]").is_none());
///
/// cache.insert("[pi]", Canonical::dimensionless(Decimal::new(314159, -5).unwrap()));
/// assert_eq!(cache.get("[pi]").unwrap().magnitude.to_string(), "3.14159");
/// assert_eq!(cache.stats().hits, 1);
/// ```
pub struct DefinitionCache<'t> {
    inner: Mutex<LruCache<String, Canonical<'t>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<'t> DefinitionCache<'t> {
    /// Creates a cache holding at most `config.max_entries` units.
    pub fn new(config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Gets the canonical form of a defined unit, promoting it to most
    /// recently used.
    pub fn get(&self, code: &str) -> Option<Canonical<'t>> {
        let found = self.inner.lock().get(code).cloned();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(unit = %code, "definition cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(unit = %code, "definition cache miss");
        }
        found
    }

    /// Stores a canonical form unless another caller stored one first, and
    /// returns the stored value.
    pub fn insert(&self, code: &str, canonical: Canonical<'t>) -> Canonical<'t> {
        let mut cache = self.inner.lock();
        if let Some(existing) = cache.get(code) {
            return existing.clone();
        }
        cache.put(code.to_string(), canonical.clone());
        canonical
    }

    /// Returns the number of memoized units.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns true if nothing is memoized.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry and resets the counters.
    pub fn clear(&self) {
        self.inner.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let cache = self.inner.lock();
        CacheStats {
            entries: cache.len(),
            capacity: cache.cap().get(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for DefinitionCache<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("DefinitionCache")
            .field("entries", &stats.entries)
            .field("capacity", &stats.capacity)
            .finish()
    }
}

/// Statistics about the cache state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of memoized units.
    pub entries: usize,
    /// Maximum number of memoized units.
    pub capacity: usize,
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that had to compute the form.
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of lookups answered from the cache.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
