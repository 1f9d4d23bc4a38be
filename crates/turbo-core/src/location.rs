//! Location helpers.
//!
//! Everything downstream of the listener is keyed by the path component of
//! a URL (no query, no fragment). Anchor `href`s may be relative, so they are
//! resolved against the document's current location first.

use url::Url;

use crate::{Result, TurboError};

/// Resolve `href` against `base` and return the absolute URL.
pub fn resolve(base: &str, href: &str) -> Result<Url> {
    let base = Url::parse(base).map_err(|e| TurboError::invalid_location(base, e))?;
    base.join(href)
        .map_err(|e| TurboError::invalid_location(href, e))
}

/// Path component of an absolute URL.
pub fn path_of(location: &str) -> Result<String> {
    let url = Url::parse(location).map_err(|e| TurboError::invalid_location(location, e))?;
    Ok(url.path().to_string())
}

/// Path component of `href` after resolving it against `base`.
pub fn relative_path(base: &str, href: &str) -> Result<String> {
    resolve(base, href).map(|url| url.path().to_string())
}
