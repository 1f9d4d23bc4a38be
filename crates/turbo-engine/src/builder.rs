//! Builder for configuring and starting navigate-turbo.

use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use turbo_cache::RouteCache;
use turbo_core::{Document, Result};

use crate::config::TurboConfig;
use crate::listener::NavigateTurbo;
use crate::metrics::TurboMetrics;
use crate::prefetch::{ContextLoader, PREFETCH_CONTEXT_TAG};
use crate::swap::SwapEngine;

/// Builder for creating a [`NavigateTurbo`] loop.
///
/// # Example
///
/// ```rust,ignore
/// use navigate_turbo::prelude::*;
///
/// let turbo = TurboBuilder::new()
///     .route("/posts/{id}")
///     .route("/")
///     .turbo_area_selector("#content")
///     .prefetch(["/posts/1"])
///     .loader(Rc::new(IframeLoader))
///     .build(document)?;
/// ```
pub struct TurboBuilder<D: Document + 'static> {
    config: TurboConfig,
    cache: Option<Arc<RouteCache<D::Node>>>,
    metrics: Option<TurboMetrics>,
    loader: Option<Rc<dyn ContextLoader<D>>>,
}

impl<D: Document + 'static> Default for TurboBuilder<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Document + 'static> TurboBuilder<D> {
    /// Create a builder with the default configuration and no routes.
    pub fn new() -> Self {
        Self {
            config: TurboConfig::default(),
            cache: None,
            metrics: None,
            loader: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: TurboConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the route list.
    pub fn routes<I, S>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.routes = routes.into_iter().map(Into::into).collect();
        self
    }

    /// Append a route with the lowest priority so far.
    pub fn route(mut self, route: impl Into<String>) -> Self {
        self.config.routes.push(route.into());
        self
    }

    /// Set the content region selector.
    pub fn turbo_area_selector(mut self, selector: impl Into<String>) -> Self {
        self.config.turbo_area_selector = selector.into();
        self
    }

    /// Set the selector for elements overlaid after a swap.
    pub fn apply_overlay_selector(mut self, selector: impl Into<String>) -> Self {
        self.config.apply_overlay_selector = selector.into();
        self
    }

    /// Set the overlay class.
    pub fn overlay_class(mut self, class: impl Into<String>) -> Self {
        self.config.overlay_class = class.into();
        self
    }

    /// Enable or disable the overlay fallback on cache misses.
    pub fn simple_turbo(mut self, enabled: bool) -> Self {
        self.config.simple_turbo_enabled = enabled;
        self
    }

    /// Replace the prefetch list.
    pub fn prefetch<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.prefetch = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Set the loading placeholder selector.
    pub fn loading_selector(mut self, selector: impl Into<String>) -> Self {
        self.config.loading_selector = selector.into();
        self
    }

    /// Set the attribute marking intercepted links.
    pub fn navigate_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.config.navigate_attribute = attribute.into();
        self
    }

    /// Set the delay before the post-navigation capture.
    pub fn capture_delay(mut self, delay: Duration) -> Self {
        self.config.capture_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Share an existing snapshot cache.
    ///
    /// If not set, a new empty cache is created.
    pub fn cache(mut self, cache: Arc<RouteCache<D::Node>>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Use an existing metrics handle.
    pub fn metrics(mut self, metrics: TurboMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Set the loader used for prefetching.
    ///
    /// Without a loader the prefetch list is ignored.
    pub fn loader(mut self, loader: Rc<dyn ContextLoader<D>>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Build the loop for `document`.
    ///
    /// Returns `Ok(None)` when navigate-turbo should stay dormant: inside a
    /// prefetch context, or when no routes are configured.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A route pattern fails to compile
    /// - The overlay class is not a single class token
    pub fn build(self, document: Rc<D>) -> Result<Option<NavigateTurbo<D>>> {
        if document.context_tag().as_deref() == Some(PREFETCH_CONTEXT_TAG) {
            debug!(location = %document.location(), "prefetch context, staying dormant");
            return Ok(None);
        }

        let config = self.config.normalized();
        if config.routes.is_empty() {
            warn!("Navigate Turbo: No routes provided. Navigate Turbo will not work.");
            return Ok(None);
        }

        if !config.prefetch.is_empty() && self.loader.is_none() {
            debug!(count = config.prefetch.len(), "no loader set, prefetch list ignored");
        }

        let cache = self.cache.unwrap_or_else(|| Arc::new(RouteCache::new()));
        let engine = SwapEngine::new(config, cache)?
            .with_metrics(self.metrics.unwrap_or_default());

        Ok(Some(NavigateTurbo::new(engine, document, self.loader)))
    }
}
