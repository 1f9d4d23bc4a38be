//! Cache statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics for cache operations.
///
/// All counters are atomic and can be read while the cache is in use.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Number of snapshots stored.
    captures: AtomicU64,
    /// Number of stores that replaced an existing snapshot.
    overwrites: AtomicU64,
    /// Number of captures skipped (no route or no region).
    captures_skipped: AtomicU64,
    /// Number of lookups that found a snapshot.
    lookup_hits: AtomicU64,
    /// Number of lookups that found nothing.
    lookup_misses: AtomicU64,
}

impl CacheStats {
    /// Create new cache statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stored snapshot.
    #[inline]
    pub fn record_capture(&self, replaced: bool) {
        self.captures.fetch_add(1, Ordering::Relaxed);
        if replaced {
            self.overwrites.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a capture that was skipped.
    #[inline]
    pub fn record_skip(&self) {
        self.captures_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a lookup hit.
    #[inline]
    pub fn record_hit(&self) {
        self.lookup_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a lookup miss.
    #[inline]
    pub fn record_miss(&self) {
        self.lookup_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total snapshots stored.
    #[inline]
    pub fn captures(&self) -> u64 {
        self.captures.load(Ordering::Relaxed)
    }

    /// Get total overwrites.
    #[inline]
    pub fn overwrites(&self) -> u64 {
        self.overwrites.load(Ordering::Relaxed)
    }

    /// Get total skipped captures.
    #[inline]
    pub fn captures_skipped(&self) -> u64 {
        self.captures_skipped.load(Ordering::Relaxed)
    }

    /// Get total lookup hits.
    #[inline]
    pub fn lookup_hits(&self) -> u64 {
        self.lookup_hits.load(Ordering::Relaxed)
    }

    /// Get total lookup misses.
    #[inline]
    pub fn lookup_misses(&self) -> u64 {
        self.lookup_misses.load(Ordering::Relaxed)
    }

    /// Calculate hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.lookup_hits() as f64;
        let total = hits + self.lookup_misses() as f64;
        if total == 0.0 {
            0.0
        } else {
            hits / total
        }
    }

    /// Reset all statistics.
    pub fn reset(&self) {
        self.captures.store(0, Ordering::Relaxed);
        self.overwrites.store(0, Ordering::Relaxed);
        self.captures_skipped.store(0, Ordering::Relaxed);
        self.lookup_hits.store(0, Ordering::Relaxed);
        self.lookup_misses.store(0, Ordering::Relaxed);
    }
}
