//! Configuration.
//!
//! [`TurboConfig`] deserializes from the same camelCase object a page passes
//! to `init`, e.g.
//!
//! ```json
//! { "turboAreaSelector": "main", "routes": ["/posts/{id}"], "prefetch": ["/posts/1"] }
//! ```
//!
//! Missing keys take their defaults. Empty selector or class strings also fall
//! back to the defaults once [`TurboConfig::normalized`] runs.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use turbo_core::{Result, RouteTable, TurboError};

/// Default content region selector.
pub const DEFAULT_TURBO_AREA_SELECTOR: &str = "main";
/// Default selector for elements receiving the overlay class on swap.
pub const DEFAULT_APPLY_OVERLAY_SELECTOR: &str = ".turbo";
/// Default overlay class.
pub const DEFAULT_OVERLAY_CLASS: &str = "loading-overlay";
/// Default selector for loading placeholders revealed on swap.
pub const DEFAULT_LOADING_SELECTOR: &str = "[data-turbo-loading]";
/// Default click interception marker.
pub const DEFAULT_NAVIGATE_ATTRIBUTE: &str = "wire:navigate";
/// Default delay between "navigated" and the capture of the new region.
pub const DEFAULT_CAPTURE_DELAY: Duration = Duration::from_millis(100);

/// Configuration for navigate-turbo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TurboConfig {
    /// Selector for the swappable content region.
    pub turbo_area_selector: String,
    /// Selector for elements that get the overlay class after a swap.
    pub apply_overlay_selector: String,
    /// Class signalling loading state.
    pub overlay_class: String,
    /// Route templates, highest priority first.
    pub routes: Vec<String>,
    /// Apply the overlay to the live region on a cache miss.
    pub simple_turbo_enabled: bool,
    /// Paths to load ahead of time.
    pub prefetch: Vec<String>,
    /// Selector for loading placeholders revealed inside a swapped-in region.
    pub loading_selector: String,
    /// Attribute marking links that should be intercepted.
    pub navigate_attribute: String,
    /// Delay before capturing the region after "navigated", in milliseconds.
    pub capture_delay_ms: u64,
}

impl Default for TurboConfig {
    fn default() -> Self {
        Self {
            turbo_area_selector: DEFAULT_TURBO_AREA_SELECTOR.to_string(),
            apply_overlay_selector: DEFAULT_APPLY_OVERLAY_SELECTOR.to_string(),
            overlay_class: DEFAULT_OVERLAY_CLASS.to_string(),
            routes: Vec::new(),
            simple_turbo_enabled: true,
            prefetch: Vec::new(),
            loading_selector: DEFAULT_LOADING_SELECTOR.to_string(),
            navigate_attribute: DEFAULT_NAVIGATE_ATTRIBUTE.to_string(),
            capture_delay_ms: DEFAULT_CAPTURE_DELAY.as_millis() as u64,
        }
    }
}

impl TurboConfig {
    /// Parse a camelCase JSON configuration object.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str::<Self>(json)
            .map(Self::normalized)
            .map_err(|e| TurboError::config_parse("invalid navigate-turbo configuration", e))
    }

    /// Replace empty strings with their defaults.
    pub fn normalized(mut self) -> Self {
        fn fallback(value: &mut String, default: &str) {
            if value.trim().is_empty() {
                *value = default.to_string();
            }
        }

        fallback(&mut self.turbo_area_selector, DEFAULT_TURBO_AREA_SELECTOR);
        fallback(&mut self.apply_overlay_selector, DEFAULT_APPLY_OVERLAY_SELECTOR);
        fallback(&mut self.overlay_class, DEFAULT_OVERLAY_CLASS);
        fallback(&mut self.loading_selector, DEFAULT_LOADING_SELECTOR);
        fallback(&mut self.navigate_attribute, DEFAULT_NAVIGATE_ATTRIBUTE);
        self
    }

    /// Check values that cannot be repaired by [`TurboConfig::normalized`].
    ///
    /// # Errors
    ///
    /// Returns [`TurboError::Configuration`] if the overlay class is not a
    /// single class token.
    pub fn validate(&self) -> Result<()> {
        if self.overlay_class.split_whitespace().count() != 1 {
            return Err(TurboError::Configuration(format!(
                "overlay class {:?} must be a single class token",
                self.overlay_class
            )));
        }
        Ok(())
    }

    /// Delay before the post-navigation capture.
    #[inline]
    pub fn capture_delay(&self) -> Duration {
        Duration::from_millis(self.capture_delay_ms)
    }

    /// Compile the configured routes.
    pub fn route_table(&self) -> Result<RouteTable> {
        RouteTable::new(self.routes.iter())
    }
}
