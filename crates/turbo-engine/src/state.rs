//! Navigation state.
//!
//! One [`NavigationState`] exists per engine. It records the most recent
//! intercepted target and the phase of the current navigation attempt:
//!
//! ```text
//! Idle ──click──▶ Pending ──hit──▶ Swapped ──navigating──▶ AwaitingFramework ──navigated──▶ Idle
//!                    └─────miss──────────────────────────▶ AwaitingFramework
//! ```
//!
//! The detached original region lives inside [`SwapPhase::Swapped`] and
//! nowhere else, so it cannot outlive the swap it belongs to.

use std::mem;

/// Phase of the current navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SwapPhase<N> {
    /// No navigation in flight.
    #[default]
    Idle,
    /// A click was recorded and the cache is being consulted.
    Pending,
    /// A cached region is on screen in place of the live one.
    Swapped {
        /// The live region detached from the document.
        original: N,
        /// The cached region inserted in its place.
        inserted: N,
    },
    /// Waiting for the host framework's own update.
    AwaitingFramework,
}

impl<N> SwapPhase<N> {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Swapped { .. } => "swapped",
            Self::AwaitingFramework => "awaiting-framework",
        }
    }
}

/// Pending target plus swap phase.
#[derive(Debug, Default)]
pub struct NavigationState<N> {
    pending: Option<String>,
    phase: SwapPhase<N>,
}

impl<N> NavigationState<N> {
    /// Create an idle state with no pending target.
    pub fn new() -> Self {
        Self {
            pending: None,
            phase: SwapPhase::Idle,
        }
    }

    /// The most recently intercepted target path.
    #[inline]
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// The current phase.
    #[inline]
    pub fn phase(&self) -> &SwapPhase<N> {
        &self.phase
    }

    /// The detached original region, present only while swapped.
    pub fn original_region(&self) -> Option<&N> {
        match &self.phase {
            SwapPhase::Swapped { original, .. } => Some(original),
            _ => None,
        }
    }

    /// Record a new pending target, replacing any earlier one.
    pub(crate) fn record_pending(&mut self, path: impl Into<String>) {
        self.pending = Some(path.into());
    }

    /// Move to `next`, returning the phase left behind.
    pub(crate) fn transition(&mut self, next: SwapPhase<N>) -> SwapPhase<N> {
        mem::replace(&mut self.phase, next)
    }

    /// A ticket for a capture scheduled now.
    pub(crate) fn ticket(&self) -> CaptureTicket {
        CaptureTicket {
            pending: self.pending.clone(),
        }
    }

    /// Whether `ticket` still describes the latest intercepted target.
    pub(crate) fn is_current(&self, ticket: &CaptureTicket) -> bool {
        self.pending == ticket.pending
    }
}

/// The pending target as it was when a delayed capture was scheduled.
///
/// A capture whose ticket no longer matches the live pending target is
/// discarded without touching the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureTicket {
    pending: Option<String>,
}

impl CaptureTicket {
    /// Pending target at scheduling time.
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }
}
