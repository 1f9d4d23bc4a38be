//! Prefetch loader.
//!
//! Configured prefetch paths are loaded into isolated contexts ahead of any
//! click. Each context is a separate document carrying
//! [`PREFETCH_CONTEXT_TAG`], so navigate-turbo running inside it stays
//! dormant. Once loaded, its content region is imported and cached by the
//! swap engine.

use async_trait::async_trait;
use tracing::{debug, trace};
use turbo_core::{location, Document};

/// Context tag given to prefetch documents.
pub const PREFETCH_CONTEXT_TAG: &str = "navigate-turbo-prefetch";

/// Loads a page into an isolated document.
///
/// The returned document must report `context_tag` from
/// [`Document::context_tag`]. A load failure is reported as `None` and
/// simply leaves the route uncached.
#[async_trait(?Send)]
pub trait ContextLoader<D: Document> {
    /// Load `href` into a fresh document tagged `context_tag`.
    async fn load(&self, href: &str, context_tag: &str) -> Option<D>;
}

/// Paths worth prefetching from `current_location`.
///
/// Entries are resolved against the current location. The current page and
/// repeated entries are skipped, as are entries that do not resolve.
pub fn prefetch_targets(current_location: &str, prefetch: &[String]) -> Vec<String> {
    let current = location::path_of(current_location).ok();
    let mut targets: Vec<String> = Vec::with_capacity(prefetch.len());

    for href in prefetch {
        let path = match location::relative_path(current_location, href) {
            Ok(path) => path,
            Err(err) => {
                debug!(href = %href, error = %err, "skipping unresolvable prefetch path");
                continue;
            }
        };
        if current.as_deref() == Some(path.as_str()) {
            trace!(location = %path, "skipping prefetch of current page");
            continue;
        }
        if targets.contains(&path) {
            continue;
        }
        targets.push(path);
    }

    targets
}
