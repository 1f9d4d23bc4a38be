//! # navigate-turbo
//!
//! Instant-feeling page transitions for server-driven web UIs.
//!
//! When a navigable link is clicked, navigate-turbo swaps the page's content
//! region with a cached copy of the target route's region, then hands back to
//! the framework once its real update lands. Each route's region is captured
//! shortly after every completed navigation, and can be warmed ahead of time
//! by prefetching.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use navigate_turbo::prelude::*;
//!
//! let local = LocalSet::new();
//! local.run_until(async {
//!     let turbo = TurboBuilder::new()
//!         .route("/posts/{id}")
//!         .route("/")
//!         .build(Rc::clone(&document))?;
//!
//!     if let Some(turbo) = turbo {
//!         let handle = turbo.handle();
//!         turbo.spawn();
//!
//!         handle.click(link)?;
//!         handle.navigating()?;
//!         handle.navigated()?;
//!     }
//! }).await;
//! ```
//!
//! ## Architecture
//!
//! This library is organized into several crates:
//!
//! - `turbo-core` - Errors, route matching, location helpers and the `Document` trait
//! - `turbo-cache` - Route-keyed snapshot cache
//! - `turbo-engine` - Swap engine, event loop, prefetch and configuration
//! - `turbo-dom` - In-memory `Document` (feature `memory-dom`)
//!
//! This crate (`navigate-turbo`) re-exports all public APIs for convenience.
//!
//! ## Design Principles
//!
//! 1. **No panics in library code** - Configuration errors are returned as `Result`
//! 2. **Misses are not errors** - A missing route, region or snapshot leaves the page alone
//! 3. **One task owns the state** - Timers and prefetch loads post back into the loop
//! 4. **Observable** - Built-in metrics, signals and tracing
//!
//! ## Features
//!
//! - `memory-dom` - Re-export the in-memory document (default)

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

// Re-export all sub-crates
pub use turbo_cache as cache;
pub use turbo_core as core;
#[cfg(feature = "memory-dom")]
#[cfg_attr(docsrs, doc(cfg(feature = "memory-dom")))]
pub use turbo_dom as dom;
pub use turbo_engine as engine;

pub use turbo_engine::{init, init_with_loader};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use navigate_turbo::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use turbo_core::{
        Document, Result, RouteMatcher, RoutePattern, RouteTable, TurboError,
    };

    // Cache types
    pub use turbo_cache::{Cache, CacheStats, RouteCache, SharedSnapshot, Snapshot};

    // Engine types
    pub use turbo_engine::{
        init, init_with_loader, CaptureOutcome, ContextLoader, NavigateTurbo, NavigationEvent,
        SwapEngine, SwapOutcome, SwapPhase, TurboBuilder, TurboConfig, TurboHandle,
        TurboMetrics, TurboSignal, PREFETCH_CONTEXT_TAG, READY_EVENT,
    };

    // In-memory document
    #[cfg(feature = "memory-dom")]
    pub use turbo_dom::{MemoryDocument, NodeId};
}

/// Version information for this crate.
pub mod version {
    /// Crate version.
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    /// Minimum supported Rust version.
    pub const MSRV: &str = "1.75";

    /// Get version info as a string.
    pub fn version_string() -> String {
        format!("navigate-turbo {} (MSRV {})", VERSION, MSRV)
    }
}
