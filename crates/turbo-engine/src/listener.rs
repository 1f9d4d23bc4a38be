//! Navigation listener.
//!
//! [`NavigateTurbo`] is a single-task event loop. The host feeds it clicks and
//! the framework's "navigating"/"navigated" lifecycle through a
//! [`TurboHandle`]; delayed captures and prefetch loads run as local tasks
//! that post their results back into the same channel, so every mutation of
//! the swap engine happens on the loop task.
//!
//! The loop ends once every [`TurboHandle`] is dropped.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace};
use turbo_core::{location, Document, Result, RoutePattern, TurboError};
use turbo_cache::RouteCache;

use crate::config::TurboConfig;
use crate::metrics::TurboMetrics;
use crate::prefetch::{prefetch_targets, ContextLoader, PREFETCH_CONTEXT_TAG};
use crate::state::CaptureTicket;
use crate::swap::{CaptureOutcome, SwapEngine, SwapOutcome};

/// Name of the signal broadcast once initialization completes.
pub const READY_EVENT: &str = "navigateTurbo:ready";

const SIGNAL_CAPACITY: usize = 64;

/// Inbound events from the host.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationEvent<N> {
    /// A click landed on `target`.
    Click {
        /// The clicked element.
        target: N,
    },
    /// The framework is about to replace the document content.
    Navigating,
    /// The framework finished replacing the document content.
    Navigated,
}

/// Outbound signals for observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurboSignal {
    /// Initialization completed.
    Ready,
    /// A cached region was swapped in for `location`.
    Swapped {
        /// Route of the snapshot used.
        route: RoutePattern,
        /// Path clicked.
        location: String,
    },
    /// A cache miss applied the overlay.
    Overlay {
        /// Path clicked.
        location: String,
    },
    /// The original region was put back.
    Restored,
    /// The current region was cached.
    Captured {
        /// Route it was filed under.
        route: RoutePattern,
        /// Path it was captured at.
        location: String,
    },
    /// A delayed capture was superseded by a newer click.
    CaptureDiscarded,
    /// A prefetched region was cached.
    Prefetched {
        /// Route it was filed under.
        route: RoutePattern,
        /// Path it was loaded from.
        location: String,
    },
}

impl TurboSignal {
    /// Event name as seen by page scripts.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready => READY_EVENT,
            Self::Swapped { .. } => "navigateTurbo:swapped",
            Self::Overlay { .. } => "navigateTurbo:overlay",
            Self::Restored => "navigateTurbo:restored",
            Self::Captured { .. } => "navigateTurbo:captured",
            Self::CaptureDiscarded => "navigateTurbo:captureDiscarded",
            Self::Prefetched { .. } => "navigateTurbo:prefetched",
        }
    }
}

/// Target path of a click on `target`, if it should be intercepted.
///
/// The closest anchor must carry the configured navigate attribute and an
/// `href`, which is resolved against the document's location.
pub fn intercepted_path<D: Document>(
    doc: &D,
    config: &TurboConfig,
    target: &D::Node,
) -> Option<String> {
    let anchor = doc.closest(target, "a")?;
    if !doc.has_attribute(&anchor, &config.navigate_attribute) {
        return None;
    }
    let href = doc.attribute(&anchor, "href")?;
    match location::relative_path(&doc.location(), &href) {
        Ok(path) => Some(path),
        Err(err) => {
            debug!(href = %href, error = %err, "ignoring click on unresolvable href");
            None
        }
    }
}

enum LoopMessage<D: Document> {
    Event(NavigationEvent<D::Node>),
    CaptureDue(CaptureTicket),
    Prefetched { context: D, started: Instant },
}

/// The navigate-turbo event loop.
pub struct NavigateTurbo<D: Document + 'static> {
    engine: SwapEngine<D>,
    document: Rc<D>,
    loader: Option<Rc<dyn ContextLoader<D>>>,
    tx: mpsc::UnboundedSender<LoopMessage<D>>,
    rx: mpsc::UnboundedReceiver<LoopMessage<D>>,
    signals: broadcast::Sender<TurboSignal>,
}

impl<D: Document + 'static> fmt::Debug for NavigateTurbo<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigateTurbo")
            .field("config", self.engine.config())
            .field("prefetch_loader", &self.loader.is_some())
            .finish_non_exhaustive()
    }
}

impl<D: Document + 'static> NavigateTurbo<D> {
    pub(crate) fn new(
        engine: SwapEngine<D>,
        document: Rc<D>,
        loader: Option<Rc<dyn ContextLoader<D>>>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (signals, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self {
            engine,
            document,
            loader,
            tx,
            rx,
            signals,
        }
    }

    /// The swap engine driven by this loop.
    pub fn engine(&self) -> &SwapEngine<D> {
        &self.engine
    }

    /// The document the loop mutates.
    pub fn document(&self) -> &Rc<D> {
        &self.document
    }

    /// A handle for feeding events into the loop.
    ///
    /// Take at least one before starting the loop; it ends when the last
    /// handle is dropped.
    pub fn handle(&self) -> TurboHandle<D> {
        TurboHandle {
            tx: self.tx.clone(),
            signals: self.signals.clone(),
            cache: Arc::clone(self.engine.cache()),
            metrics: self.engine.metrics().clone(),
        }
    }

    /// Subscribe to outbound signals.
    pub fn subscribe(&self) -> broadcast::Receiver<TurboSignal> {
        self.signals.subscribe()
    }

    /// Spawn the loop on the current [`tokio::task::LocalSet`].
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::task::spawn_local(self.run())
    }

    /// Start prefetching, signal readiness and process events until every
    /// handle is gone.
    pub async fn run(self) {
        let Self {
            mut engine,
            document,
            loader,
            tx,
            mut rx,
            signals,
        } = self;

        let sender = tx.downgrade();
        drop(tx);

        if let Some(loader) = loader {
            for href in prefetch_targets(&document.location(), &engine.config().prefetch) {
                let loader = Rc::clone(&loader);
                let sender = sender.clone();
                tokio::task::spawn_local(async move {
                    let started = Instant::now();
                    let Some(context) = loader.load(&href, PREFETCH_CONTEXT_TAG).await else {
                        debug!(location = %href, "prefetch load failed");
                        return;
                    };
                    if let Some(tx) = sender.upgrade() {
                        let _ = tx.send(LoopMessage::Prefetched { context, started });
                    }
                });
            }
        }

        info!(
            routes = engine.routes().len(),
            prefetch = engine.config().prefetch.len(),
            "navigate-turbo ready"
        );
        let _ = signals.send(TurboSignal::Ready);

        while let Some(message) = rx.recv().await {
            let signal = match message {
                LoopMessage::Event(NavigationEvent::Click { target }) => {
                    let Some(path) = intercepted_path(&*document, engine.config(), &target) else {
                        trace!("click not intercepted");
                        continue;
                    };
                    match engine.begin_navigation(&document, &path) {
                        SwapOutcome::Swapped { route } => Some(TurboSignal::Swapped {
                            route,
                            location: path,
                        }),
                        SwapOutcome::Overlay => Some(TurboSignal::Overlay { location: path }),
                        SwapOutcome::Untouched => None,
                    }
                }
                LoopMessage::Event(NavigationEvent::Navigating) => engine
                    .on_navigating(&document)
                    .then_some(TurboSignal::Restored),
                LoopMessage::Event(NavigationEvent::Navigated) => {
                    let ticket = engine.on_navigated(&document);
                    let delay = engine.config().capture_delay();
                    let sender = sender.clone();
                    tokio::task::spawn_local(async move {
                        tokio::time::sleep(delay).await;
                        if let Some(tx) = sender.upgrade() {
                            let _ = tx.send(LoopMessage::CaptureDue(ticket));
                        }
                    });
                    None
                }
                LoopMessage::CaptureDue(ticket) => match engine.complete_capture(&document, &ticket) {
                    CaptureOutcome::Captured { route, location } => {
                        Some(TurboSignal::Captured { route, location })
                    }
                    CaptureOutcome::Superseded => Some(TurboSignal::CaptureDiscarded),
                    CaptureOutcome::Skipped => None,
                },
                LoopMessage::Prefetched { context, started } => {
                    match engine.ingest_context(&document, &context) {
                        Some((route, location)) => {
                            engine.metrics().record_prefetch(route.as_str(), started.elapsed());
                            debug!(route = %route, location = %location, "prefetched region cached");
                            Some(TurboSignal::Prefetched { route, location })
                        }
                        None => {
                            debug!(location = %context.location(), "prefetched page had nothing to cache");
                            None
                        }
                    }
                }
            };

            if let Some(signal) = signal {
                let _ = signals.send(signal);
            }
        }

        debug!("all handles dropped, navigate-turbo stopped");
    }
}

/// Cloneable handle into a running [`NavigateTurbo`] loop.
pub struct TurboHandle<D: Document> {
    tx: mpsc::UnboundedSender<LoopMessage<D>>,
    signals: broadcast::Sender<TurboSignal>,
    cache: Arc<RouteCache<D::Node>>,
    metrics: TurboMetrics,
}

impl<D: Document> Clone for TurboHandle<D> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            signals: self.signals.clone(),
            cache: Arc::clone(&self.cache),
            metrics: self.metrics.clone(),
        }
    }
}

impl<D: Document> fmt::Debug for TurboHandle<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurboHandle")
            .field("closed", &self.tx.is_closed())
            .finish_non_exhaustive()
    }
}

impl<D: Document> TurboHandle<D> {
    /// Report a click on `target`.
    pub fn click(&self, target: D::Node) -> Result<()> {
        self.dispatch(NavigationEvent::Click { target })
    }

    /// Report the framework's "navigating" event.
    pub fn navigating(&self) -> Result<()> {
        self.dispatch(NavigationEvent::Navigating)
    }

    /// Report the framework's "navigated" event.
    pub fn navigated(&self) -> Result<()> {
        self.dispatch(NavigationEvent::Navigated)
    }

    /// Send any navigation event.
    pub fn dispatch(&self, event: NavigationEvent<D::Node>) -> Result<()> {
        self.tx
            .send(LoopMessage::Event(event))
            .map_err(|_| TurboError::ListenerClosed)
    }

    /// Subscribe to outbound signals.
    pub fn subscribe(&self) -> broadcast::Receiver<TurboSignal> {
        self.signals.subscribe()
    }

    /// The snapshot cache shared with the loop.
    pub fn cache(&self) -> &Arc<RouteCache<D::Node>> {
        &self.cache
    }

    /// Metrics shared with the loop.
    pub fn metrics(&self) -> &TurboMetrics {
        &self.metrics
    }

    /// Whether the loop has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
