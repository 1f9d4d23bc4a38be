//! Cache trait and RouteCache implementation.
//!
//! The cache stores one snapshot per route pattern. Paths are resolved to a
//! route through a [`RouteTable`] on every capture and lookup, so two paths
//! that match the same template share a slot.

use std::sync::Arc;

use dashmap::DashMap;
use fnv::FnvBuildHasher;
use tracing::{debug, trace};
use turbo_core::{RoutePattern, RouteTable};

use crate::snapshot::{SharedSnapshot, Snapshot};
use crate::stats::CacheStats;

/// Trait for route-keyed snapshot caches.
pub trait Cache<N> {
    /// Store the region produced by `region` under the route matching
    /// `current_path`.
    ///
    /// `region` is only called once a route has matched. Returns the route
    /// the snapshot was filed under, or `None` if nothing was stored.
    fn capture_with<F>(&self, routes: &RouteTable, current_path: &str, region: F) -> Option<RoutePattern>
    where
        F: FnOnce() -> Option<N>;

    /// Store an already produced region. See [`Cache::capture_with`].
    fn capture(
        &self,
        routes: &RouteTable,
        current_path: &str,
        region: Option<N>,
    ) -> Option<RoutePattern> {
        self.capture_with(routes, current_path, || region)
    }

    /// Snapshot filed under the route matching `target_path`.
    fn lookup(&self, routes: &RouteTable, target_path: &str) -> Option<SharedSnapshot<N>>;

    /// Snapshot filed under `route`.
    fn get(&self, route: &RoutePattern) -> Option<SharedSnapshot<N>>;

    /// Get the number of cached snapshots.
    fn snapshot_count(&self) -> usize;
}

/// DashMap-backed [`Cache`].
///
/// Last write wins per route. Entries are never evicted; the cache lives as
/// long as the page process that owns it.
#[derive(Debug)]
pub struct RouteCache<N> {
    /// Snapshots keyed by route pattern.
    snapshots: DashMap<RoutePattern, Arc<Snapshot<N>>, FnvBuildHasher>,
    /// Statistics.
    stats: CacheStats,
}

impl<N> Default for RouteCache<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> RouteCache<N> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::with_capacity(16)
    }

    /// Create an empty cache with room for `capacity` routes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            snapshots: DashMap::with_capacity_and_hasher(capacity, FnvBuildHasher::default()),
            stats: CacheStats::new(),
        }
    }

    /// Get cache statistics.
    #[inline]
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Routes that currently have a snapshot.
    pub fn routes(&self) -> Vec<RoutePattern> {
        self.snapshots.iter().map(|r| r.key().clone()).collect()
    }

    /// Number of routes with a snapshot.
    #[inline]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether no route has a snapshot yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Check if a snapshot exists for a route.
    pub fn has_route(&self, route: &RoutePattern) -> bool {
        self.snapshots.contains_key(route)
    }

    /// Store a snapshot, replacing any previous one for its route.
    ///
    /// Returns `true` when a previous snapshot was replaced.
    pub fn store(&self, snapshot: Snapshot<N>) -> bool {
        let route = snapshot.route().clone();
        let location = snapshot.location().to_string();
        let replaced = self.snapshots.insert(route.clone(), Arc::new(snapshot)).is_some();
        self.stats.record_capture(replaced);

        debug!(route = %route, location = %location, replaced, "stored snapshot");
        replaced
    }
}

impl<N> Cache<N> for RouteCache<N> {
    fn capture_with<F>(&self, routes: &RouteTable, current_path: &str, region: F) -> Option<RoutePattern>
    where
        F: FnOnce() -> Option<N>,
    {
        let Some(route) = routes.match_path(current_path) else {
            self.stats.record_skip();
            trace!(location = %current_path, "no route matches, skipping capture");
            return None;
        };

        let Some(content) = region() else {
            self.stats.record_skip();
            trace!(route = %route, location = %current_path, "no region, skipping capture");
            return None;
        };

        self.store(Snapshot::new(route.clone(), current_path, content));
        Some(route.clone())
    }

    fn lookup(&self, routes: &RouteTable, target_path: &str) -> Option<SharedSnapshot<N>> {
        let Some(route) = routes.match_path(target_path) else {
            self.stats.record_miss();
            trace!(location = %target_path, "no route matches");
            return None;
        };
        self.get(route)
    }

    fn get(&self, route: &RoutePattern) -> Option<SharedSnapshot<N>> {
        // Clone the Arc and drop the shard guard immediately.
        let result = self.snapshots.get(route).map(|r| Arc::clone(&*r));

        if result.is_some() {
            self.stats.record_hit();
            trace!(route = %route, "cache hit");
        } else {
            self.stats.record_miss();
            trace!(route = %route, "cache miss");
        }

        result
    }

    fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }
}
