//! # turbo-engine
//!
//! The optimistic swap protocol for navigate-turbo.
//!
//! - [`SwapEngine`] - Swaps cached regions in on click and reconciles with the framework
//! - [`NavigateTurbo`] / [`TurboHandle`] - Single-task event loop and the handle feeding it
//! - [`TurboBuilder`] - Builder for configuring the loop
//! - [`ContextLoader`] - Seam for loading prefetch pages into isolated documents
//! - [`TurboMetrics`] - Counters for swaps, captures and prefetches
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::rc::Rc;
//! use turbo_engine::{init, TurboConfig};
//!
//! let config = TurboConfig::from_json(r#"{"routes": ["/posts/{id}", "/"]}"#)?;
//! let local = tokio::task::LocalSet::new();
//! local.run_until(async {
//!     if let Some(turbo) = init(config, Rc::clone(&document))? {
//!         let handle = turbo.handle();
//!         turbo.spawn();
//!         // wire host clicks and framework lifecycle events to `handle`
//!     }
//! }).await;
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
mod listener;
pub mod metrics;
mod prefetch;
mod state;
mod swap;

use std::rc::Rc;

use turbo_core::{Document, Result};

pub use builder::TurboBuilder;
pub use config::{
    TurboConfig, DEFAULT_APPLY_OVERLAY_SELECTOR, DEFAULT_CAPTURE_DELAY, DEFAULT_LOADING_SELECTOR,
    DEFAULT_NAVIGATE_ATTRIBUTE, DEFAULT_OVERLAY_CLASS, DEFAULT_TURBO_AREA_SELECTOR,
};
pub use listener::{
    intercepted_path, NavigateTurbo, NavigationEvent, TurboHandle, TurboSignal, READY_EVENT,
};
pub use metrics::TurboMetrics;
pub use prefetch::{prefetch_targets, ContextLoader, PREFETCH_CONTEXT_TAG};
pub use state::{CaptureTicket, NavigationState, SwapPhase};
pub use swap::{CaptureOutcome, SwapEngine, SwapOutcome, SCROLL_HINT_ATTRIBUTE};

/// Initialise navigate-turbo for `document`.
///
/// Returns `Ok(None)` when there is nothing to do: no routes are configured,
/// or `document` is itself a prefetch context. Prefetch entries are ignored;
/// use [`init_with_loader`] to warm the cache.
pub fn init<D: Document + 'static>(
    config: TurboConfig,
    document: Rc<D>,
) -> Result<Option<NavigateTurbo<D>>> {
    TurboBuilder::new().config(config).build(document)
}

/// Like [`init`], loading the configured prefetch paths through `loader`.
pub fn init_with_loader<D: Document + 'static>(
    config: TurboConfig,
    document: Rc<D>,
    loader: Rc<dyn ContextLoader<D>>,
) -> Result<Option<NavigateTurbo<D>>> {
    TurboBuilder::new()
        .config(config)
        .loader(loader)
        .build(document)
}
