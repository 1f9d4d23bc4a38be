//! Swap engine.
//!
//! The engine performs the optimistic swap and its reconciliation. It is
//! synchronous and owns [`NavigationState`]; timing (the delayed capture) is
//! the listener's job, which hands the engine back a [`CaptureTicket`] when
//! the delay expires.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, trace};
use turbo_cache::{Cache, RouteCache};
use turbo_core::{location, Document, Result, RoutePattern, RouteTable};

use crate::config::TurboConfig;
use crate::metrics::TurboMetrics;
use crate::state::{CaptureTicket, NavigationState, SwapPhase};

/// Attribute recording the horizontal scroll offset for the host framework.
pub const SCROLL_HINT_ATTRIBUTE: &str = "data-scroll-x";

/// What a navigation attempt did to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutcome {
    /// A cached region was swapped in.
    Swapped {
        /// Route of the snapshot used.
        route: RoutePattern,
    },
    /// No snapshot; the overlay class was applied to the live region.
    Overlay,
    /// No snapshot and nothing applied.
    Untouched,
}

/// Result of a delayed capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The current region was stored under this route.
    Captured {
        /// Route the snapshot was filed under.
        route: RoutePattern,
        /// Path it was captured at.
        location: String,
    },
    /// A newer click superseded the navigation this capture belonged to.
    Superseded,
    /// No route matched or no region was found.
    Skipped,
}

/// Route-keyed optimistic swap engine.
#[derive(Debug)]
pub struct SwapEngine<D: Document> {
    config: TurboConfig,
    routes: RouteTable,
    cache: Arc<RouteCache<D::Node>>,
    state: NavigationState<D::Node>,
    metrics: TurboMetrics,
    /// Placeholders revealed in the region on screen, and whether each was hidden.
    revealed: Vec<(D::Node, bool)>,
    _document: PhantomData<fn(&D)>,
}

impl<D: Document> SwapEngine<D> {
    /// Create an engine over `cache`, compiling the configured routes.
    pub fn new(config: TurboConfig, cache: Arc<RouteCache<D::Node>>) -> Result<Self> {
        config.validate()?;
        let routes = config.route_table()?;
        Ok(Self {
            config,
            routes,
            cache,
            state: NavigationState::new(),
            metrics: TurboMetrics::new(),
            revealed: Vec::new(),
            _document: PhantomData,
        })
    }

    /// Replace the metrics handle.
    pub fn with_metrics(mut self, metrics: TurboMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// The configuration in use.
    #[inline]
    pub fn config(&self) -> &TurboConfig {
        &self.config
    }

    /// The compiled routes.
    #[inline]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// The snapshot cache.
    #[inline]
    pub fn cache(&self) -> &Arc<RouteCache<D::Node>> {
        &self.cache
    }

    /// Current navigation state.
    #[inline]
    pub fn state(&self) -> &NavigationState<D::Node> {
        &self.state
    }

    /// Metrics handle.
    #[inline]
    pub fn metrics(&self) -> &TurboMetrics {
        &self.metrics
    }

    /// Start a navigation attempt towards `target_path`.
    ///
    /// Records the target as pending, then either swaps in the cached region
    /// for its route or falls back to the overlay.
    pub fn begin_navigation(&mut self, doc: &D, target_path: &str) -> SwapOutcome {
        self.state.record_pending(target_path);

        // A swap already on screen keeps its original: that is still the
        // region the framework will reconcile against.
        let (live, original) = match self.state.transition(SwapPhase::Pending) {
            SwapPhase::Swapped { original, inserted } => (Some(inserted), Some(original)),
            _ => (doc.query_selector(&self.config.turbo_area_selector), None),
        };

        trace!(location = %target_path, "navigation pending");

        let Some(live) = live else {
            debug!(
                selector = %self.config.turbo_area_selector,
                "content region not found, nothing to swap"
            );
            self.state.transition(SwapPhase::AwaitingFramework);
            return SwapOutcome::Untouched;
        };

        if let Some(snapshot) = self.cache.lookup(&self.routes, target_path) {
            let cached = snapshot.content().clone();
            if original.is_some() {
                self.conceal(doc, &live);
            }
            if doc.replace_with(&live, &cached) {
                let original = original.unwrap_or(live);
                self.reveal(doc, &cached);
                self.state.transition(SwapPhase::Swapped {
                    original,
                    inserted: cached,
                });
                self.metrics.record_swap(snapshot.route().as_str());
                debug!(
                    route = %snapshot.route(),
                    location = %target_path,
                    captured_from = %snapshot.location(),
                    age = ?snapshot.age(),
                    "swapped in cached region"
                );
                return SwapOutcome::Swapped {
                    route: snapshot.route().clone(),
                };
            }
            debug!(route = %snapshot.route(), "live region detached, swap abandoned");
        }

        let live = match original {
            Some(original) => self.restore(doc, &live, original).unwrap_or(live),
            None => live,
        };
        self.state.transition(SwapPhase::AwaitingFramework);

        if !self.config.simple_turbo_enabled {
            trace!(location = %target_path, "cache miss, overlay disabled");
            return SwapOutcome::Untouched;
        }

        doc.add_class(&live, &self.config.overlay_class);
        self.metrics.record_overlay();
        trace!(location = %target_path, "cache miss, overlay applied");
        SwapOutcome::Overlay
    }

    /// The host framework is about to replace the document content.
    ///
    /// Puts the original region back if a cached one is on screen. Returns
    /// `true` if a region was restored.
    pub fn on_navigating(&mut self, doc: &D) -> bool {
        match self.state.transition(SwapPhase::AwaitingFramework) {
            SwapPhase::Swapped { original, inserted } => {
                self.restore(doc, &inserted, original).is_some()
            }
            phase => {
                trace!(phase = phase.name(), "nothing to restore");
                false
            }
        }
    }

    /// The host framework finished replacing the document content.
    ///
    /// Clears the overlay, records the scroll hint and returns the ticket the
    /// listener must present when the delayed capture fires.
    pub fn on_navigated(&mut self, doc: &D) -> CaptureTicket {
        if let SwapPhase::Swapped { original, inserted } = self.state.transition(SwapPhase::Idle) {
            // No "navigating" arrived. If the cached region is still on screen
            // the framework never touched it, so the original is the truth.
            if doc.is_connected(&inserted) {
                self.restore(doc, &inserted, original);
            } else {
                self.conceal(doc, &inserted);
            }
        }

        if let Some(region) = doc.query_selector(&self.config.turbo_area_selector) {
            doc.remove_class(&region, &self.config.overlay_class);
        }

        if let Some(body) = doc.body() {
            let (x, _) = doc.scroll_position();
            doc.set_attribute(&body, SCROLL_HINT_ATTRIBUTE, &x.to_string());
        }

        self.state.ticket()
    }

    /// Capture the current region if `ticket` is still authoritative.
    pub fn complete_capture(&mut self, doc: &D, ticket: &CaptureTicket) -> CaptureOutcome {
        if !self.state.is_current(ticket) {
            self.metrics.record_capture_discarded();
            debug!(
                scheduled_for = ?ticket.pending(),
                pending = ?self.state.pending(),
                "newer navigation pending, capture discarded"
            );
            return CaptureOutcome::Superseded;
        }

        let current = match location::path_of(&doc.location()) {
            Ok(path) => path,
            Err(err) => {
                debug!(error = %err, "unreadable location, capture skipped");
                return CaptureOutcome::Skipped;
            }
        };

        if let Some(pending) = self.state.pending() {
            if pending != current {
                self.metrics.record_capture_discarded();
                debug!(
                    pending = %pending,
                    location = %current,
                    "location does not match pending target, capture discarded"
                );
                return CaptureOutcome::Superseded;
            }
        }

        let area = &self.config.turbo_area_selector;
        let captured = self.cache.capture_with(&self.routes, &current, || {
            let region = doc.query_selector(area)?;
            doc.clone_subtree(&region)
        });

        match captured {
            Some(route) => {
                self.metrics.record_capture(route.as_str());
                CaptureOutcome::Captured {
                    route,
                    location: current,
                }
            }
            None => CaptureOutcome::Skipped,
        }
    }

    /// Store the content region of an isolated context under its route.
    ///
    /// The region is imported into `doc` as a detached subtree so it can be
    /// swapped in later. Returns the route and path it was stored under.
    pub fn ingest_context(&self, doc: &D, context: &D) -> Option<(RoutePattern, String)> {
        let current = location::path_of(&context.location()).ok()?;
        let area = &self.config.turbo_area_selector;
        let route = self.cache.capture_with(&self.routes, &current, || {
            let region = context.query_selector(area)?;
            doc.import_subtree(context, &region)
        })?;
        Some((route, current))
    }

    /// Put `original` back where `on_screen` is.
    fn restore(&mut self, doc: &D, on_screen: &D::Node, original: D::Node) -> Option<D::Node> {
        self.conceal(doc, on_screen);
        if doc.replace_with(on_screen, &original) {
            self.metrics.record_restore();
            debug!("restored original region");
            Some(original)
        } else {
            debug!("swapped-in region already replaced, dropping original");
            None
        }
    }

    /// Scroll to top, reveal loading placeholders and overlay the swapped-in region.
    fn reveal(&mut self, doc: &D, inserted: &D::Node) {
        doc.scroll_to(0.0, 0.0);

        for placeholder in doc.query_selector_all_within(inserted, &self.config.loading_selector) {
            let was_hidden = doc.has_attribute(&placeholder, "hidden");
            doc.remove_attribute(&placeholder, "hidden");
            doc.set_attribute(&placeholder, "aria-busy", "true");
            self.revealed.push((placeholder, was_hidden));
        }

        for element in doc.query_selector_all_within(inserted, &self.config.apply_overlay_selector) {
            doc.add_class(&element, &self.config.overlay_class);
        }
    }

    /// Undo [`reveal`](Self::reveal) on a region leaving the screen.
    ///
    /// Swapped-in regions are the cached snapshot itself, so the marks must
    /// not outlive the swap.
    fn conceal(&mut self, doc: &D, swapped_out: &D::Node) {
        for (placeholder, was_hidden) in self.revealed.drain(..) {
            doc.remove_attribute(&placeholder, "aria-busy");
            if was_hidden {
                doc.set_attribute(&placeholder, "hidden", "");
            }
        }

        for element in doc.query_selector_all_within(swapped_out, &self.config.apply_overlay_selector) {
            doc.remove_class(&element, &self.config.overlay_class);
        }
    }
}
