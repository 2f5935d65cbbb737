//! Bounded in-memory cache of per-tile sample results.
//!
//! Entries are uniform in size for a given provider configuration
//! (`grid_size^2 + mask_size^2` floats), so an entry-count bound is an
//! effective memory bound. Eviction is LRU.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// The cached result of sampling one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSamples {
    /// Elevation samples, `grid_size^2`, row-major.
    pub values: Vec<f32>,
    /// Mask weights, `mask_size^2`, row-major.
    pub mask: Vec<f32>,
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
}

impl CacheStats {
    /// Hit rate as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// LRU cache of sample results keyed by tile address string.
pub struct TileSampleCache {
    entries: Mutex<LruCache<String, std::sync::Arc<TileSamples>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
}

impl TileSampleCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            inserts: AtomicU64::new(0),
        }
    }

    /// Look up a tile's samples, updating LRU order and hit/miss counters.
    pub fn get(&self, key: &str) -> Option<std::sync::Arc<TileSamples>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(samples) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(std::sync::Arc::clone(samples))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a tile's samples, evicting the least recently used entry when
    /// the cache is full.
    pub fn insert(&self, key: String, samples: std::sync::Arc<TileSamples>) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.put(key, samples);
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn samples(tag: f32) -> Arc<TileSamples> {
        Arc::new(TileSamples {
            values: vec![tag; 4],
            mask: vec![1.0; 4],
        })
    }

    #[test]
    fn test_get_and_insert() {
        let cache = TileSampleCache::new(NonZeroUsize::new(4).unwrap());

        assert!(cache.get("0:0:10").is_none());
        cache.insert("0:0:10".to_string(), samples(1.0));
        let entry = cache.get("0:0:10").unwrap();
        assert_eq!(entry.values[0], 1.0);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.inserts, 1);
        assert_eq!(stats.hit_rate(), 50.0);
    }

    #[test]
    fn test_lru_eviction_at_capacity() {
        let cache = TileSampleCache::new(NonZeroUsize::new(2).unwrap());

        cache.insert("a".to_string(), samples(1.0));
        cache.insert("b".to_string(), samples(2.0));

        // Touch "a" so "b" becomes the eviction candidate
        cache.get("a");
        cache.insert("c".to_string(), samples(3.0));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
    }
}
