//! Error types for navigate-turbo.
//!
//! The swap protocol itself never fails: a missing route, region or snapshot
//! is absorbed as a no-op. [`TurboError`] covers what can go wrong before the
//! protocol runs (building route tables, parsing configuration, parsing
//! selectors, resolving locations) and the listener's channel plumbing.

/// Error type for navigate-turbo setup and plumbing.
///
/// # Example
///
/// ```rust
/// use turbo_core::TurboError;
///
/// fn require_routes(routes: &[&str]) -> Result<(), TurboError> {
///     if routes.is_empty() {
///         return Err(TurboError::Configuration("no routes configured".into()));
///     }
///     Ok(())
/// }
///
/// assert!(require_routes(&[]).is_err());
/// ```
#[derive(Debug, thiserror::Error)]
pub enum TurboError {
    /// A route template could not be compiled into a matcher.
    #[error("invalid route pattern {pattern:?}: {reason}")]
    InvalidRoute {
        /// The offending template.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An href or document location could not be resolved to a path.
    #[error("invalid location {location:?}: {reason}")]
    InvalidLocation {
        /// The location that failed to parse.
        location: String,
        /// Parser message.
        reason: String,
    },

    /// A CSS-style selector could not be parsed.
    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector {
        /// The selector text.
        selector: String,
        /// Why parsing failed.
        reason: String,
    },

    /// Configuration could not be deserialized.
    #[error("config parse error: {message}")]
    ConfigParse {
        /// Description of the failure.
        message: String,
        /// Underlying parser error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration is structurally valid but unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The navigation listener has stopped and no longer accepts events.
    #[error("navigation listener closed")]
    ListenerClosed,
}

impl TurboError {
    /// Create a config parse error from any error type.
    pub fn config_parse<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ConfigParse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid-location error.
    pub fn invalid_location(location: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidLocation {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid-selector error.
    pub fn invalid_selector(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            reason: reason.into(),
        }
    }
}
