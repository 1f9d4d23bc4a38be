//! # turbo-cache
//!
//! Route-keyed snapshot cache for navigate-turbo.
//!
//! - [`RouteCache`] - DashMap-backed map from route pattern to the latest snapshot
//! - [`Snapshot`] - A captured content region plus where and when it was captured
//! - [`Cache`] - The storage seam, with `capture`/`lookup` built on top of it
//!
//! ## Key Design Decisions
//!
//! - One snapshot per route; a newer capture silently replaces the older one
//! - No size bound, no TTL, no eviction
//! - Misses are not errors: unmatched paths and absent regions are no-ops
//!
//! ## Example
//!
//! ```rust
//! use turbo_cache::{Cache, RouteCache};
//! use turbo_core::RouteTable;
//!
//! let routes = RouteTable::new(["/posts/{id}"]).unwrap();
//! let cache: RouteCache<u32> = RouteCache::new();
//!
//! cache.capture(&routes, "/posts/5", Some(7));
//! let hit = cache.lookup(&routes, "/posts/9").unwrap();
//! assert_eq!(*hit.content(), 7);
//! assert_eq!(hit.location(), "/posts/5");
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod snapshot;
mod stats;

pub use cache::{Cache, RouteCache};
pub use snapshot::{SharedSnapshot, Snapshot};
pub use stats::CacheStats;
