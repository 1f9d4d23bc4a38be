//! Metrics for the swap protocol.
//!
//! Counters are emitted through the `metrics` facade so any installed
//! recorder picks them up, and mirrored in local atomics for inspection.
//!
//! # Example
//!
//! ```rust
//! use turbo_engine::metrics::TurboMetrics;
//!
//! let metrics = TurboMetrics::new();
//! metrics.record_swap("/posts/{id}");
//! assert_eq!(metrics.swaps(), 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, histogram};

/// Metrics handle for one navigate-turbo instance.
#[derive(Debug, Clone, Default)]
pub struct TurboMetrics {
    inner: Arc<TurboMetricsInner>,
}

#[derive(Debug, Default)]
struct TurboMetricsInner {
    swaps: AtomicU64,
    overlays: AtomicU64,
    restores: AtomicU64,
    captures: AtomicU64,
    captures_discarded: AtomicU64,
    prefetched: AtomicU64,
}

impl TurboMetrics {
    /// Create a new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an optimistic swap from cache.
    pub fn record_swap(&self, route: &str) {
        self.inner.swaps.fetch_add(1, Ordering::Relaxed);
        counter!("navigate_turbo_swaps_total", "route" => route.to_string()).increment(1);
    }

    /// Record a cache miss that fell back to the overlay.
    pub fn record_overlay(&self) {
        self.inner.overlays.fetch_add(1, Ordering::Relaxed);
        counter!("navigate_turbo_cache_misses_total").increment(1);
    }

    /// Record the original region being put back.
    pub fn record_restore(&self) {
        self.inner.restores.fetch_add(1, Ordering::Relaxed);
        counter!("navigate_turbo_restores_total").increment(1);
    }

    /// Record a post-navigation capture.
    pub fn record_capture(&self, route: &str) {
        self.inner.captures.fetch_add(1, Ordering::Relaxed);
        counter!("navigate_turbo_captures_total", "route" => route.to_string()).increment(1);
    }

    /// Record a delayed capture discarded because a newer click superseded it.
    pub fn record_capture_discarded(&self) {
        self.inner.captures_discarded.fetch_add(1, Ordering::Relaxed);
        counter!("navigate_turbo_captures_discarded_total").increment(1);
    }

    /// Record a prefetched route landing in the cache.
    pub fn record_prefetch(&self, route: &str, load_time: Duration) {
        self.inner.prefetched.fetch_add(1, Ordering::Relaxed);
        counter!("navigate_turbo_prefetch_total", "route" => route.to_string()).increment(1);
        histogram!("navigate_turbo_prefetch_seconds").record(load_time.as_secs_f64());
    }

    /// Swaps performed.
    pub fn swaps(&self) -> u64 {
        self.inner.swaps.load(Ordering::Relaxed)
    }

    /// Overlay fallbacks applied.
    pub fn overlays(&self) -> u64 {
        self.inner.overlays.load(Ordering::Relaxed)
    }

    /// Original regions restored.
    pub fn restores(&self) -> u64 {
        self.inner.restores.load(Ordering::Relaxed)
    }

    /// Post-navigation captures stored.
    pub fn captures(&self) -> u64 {
        self.inner.captures.load(Ordering::Relaxed)
    }

    /// Delayed captures discarded.
    pub fn captures_discarded(&self) -> u64 {
        self.inner.captures_discarded.load(Ordering::Relaxed)
    }

    /// Prefetched routes stored.
    pub fn prefetched(&self) -> u64 {
        self.inner.prefetched.load(Ordering::Relaxed)
    }
}
