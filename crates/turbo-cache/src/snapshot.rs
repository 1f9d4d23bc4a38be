//! Snapshot: a captured content region.
//!
//! A snapshot pairs the detached content subtree with the route it was filed
//! under, the concrete path it was captured at, and the capture time.
//! Snapshots are immutable; the cache replaces them wholesale.

use std::sync::Arc;
use std::time::{Duration, Instant};

use turbo_core::RoutePattern;

/// A captured content region keyed by route.
#[derive(Debug, Clone)]
pub struct Snapshot<N> {
    /// Route the snapshot is filed under.
    route: RoutePattern,
    /// Concrete path the region was captured at.
    location: String,
    /// Capture timestamp.
    captured_at: Instant,
    /// The detached subtree.
    content: N,
}

impl<N> Snapshot<N> {
    /// Create a snapshot captured now.
    pub fn new(route: RoutePattern, location: impl Into<String>, content: N) -> Self {
        Self {
            route,
            location: location.into(),
            captured_at: Instant::now(),
            content,
        }
    }

    /// Route this snapshot is filed under.
    #[inline]
    pub fn route(&self) -> &RoutePattern {
        &self.route
    }

    /// Path the region was captured at.
    #[inline]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// When the region was captured.
    #[inline]
    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    /// Time since capture.
    pub fn age(&self) -> Duration {
        self.captured_at.elapsed()
    }

    /// The captured subtree.
    #[inline]
    pub fn content(&self) -> &N {
        &self.content
    }
}

/// Wrapper around `Arc<Snapshot>` for convenient sharing.
pub type SharedSnapshot<N> = Arc<Snapshot<N>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_accessors() {
        let snapshot = Snapshot::new(RoutePattern::new("/posts/{id}"), "/posts/5", 42u32);

        assert_eq!(snapshot.route().as_str(), "/posts/{id}");
        assert_eq!(snapshot.location(), "/posts/5");
        assert_eq!(*snapshot.content(), 42);
        assert!(snapshot.captured_at() <= Instant::now());
    }

    #[test]
    fn snapshots_order_by_capture_time() {
        let first = Snapshot::new(RoutePattern::new("/"), "/", ());
        let second = Snapshot::new(RoutePattern::new("/"), "/", ());
        assert!(second.captured_at() >= first.captured_at());
    }
}
