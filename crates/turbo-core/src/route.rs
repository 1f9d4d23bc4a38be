//! Route templates and matching.
//!
//! A route template is a path with `{name}` placeholders, e.g. `/posts/{id}`.
//! Each placeholder stands for one path segment: any run of characters that
//! contains no `/`, including the empty run. Templates are compiled once into
//! a [`RouteMatcher`] and kept in declaration order inside a [`RouteTable`];
//! the first matcher that accepts a path wins.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::{Result, TurboError};

/// Wildcard substituted for each `{...}` placeholder.
const SEGMENT_WILDCARD: &str = "[^/]*";

/// A route template such as `/posts/{id}`.
///
/// Cheap to clone; used as the cache key for snapshots.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoutePattern(Arc<str>);

impl RoutePattern {
    /// Create a pattern from its template text.
    pub fn new(template: impl AsRef<str>) -> Self {
        Self(Arc::from(template.as_ref()))
    }

    /// The template text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of `{...}` placeholders in the template.
    pub fn placeholder_count(&self) -> usize {
        split_template(self.as_str())
            .filter(|piece| matches!(piece, TemplatePiece::Placeholder))
            .count()
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoutePattern {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RoutePattern {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl From<&String> for RoutePattern {
    fn from(value: &String) -> Self {
        Self::new(value)
    }
}

impl Borrow<str> for RoutePattern {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Piece of a route template.
#[derive(Debug, PartialEq, Eq)]
enum TemplatePiece<'a> {
    Literal(&'a str),
    Placeholder,
}

/// Split a template into literal runs and placeholders.
///
/// A placeholder runs from a `{` to the nearest following `}`. A `{` with no
/// closing brace is literal text.
fn split_template(template: &str) -> impl Iterator<Item = TemplatePiece<'_>> {
    let mut rest = template;
    let mut pending_placeholder = false;

    std::iter::from_fn(move || {
        if pending_placeholder {
            pending_placeholder = false;
            return Some(TemplatePiece::Placeholder);
        }
        if rest.is_empty() {
            return None;
        }

        let brace = rest
            .find('{')
            .and_then(|open| rest[open..].find('}').map(|close| (open, open + close)));

        match brace {
            Some((open, close)) => {
                let literal = &rest[..open];
                rest = &rest[close + 1..];
                if literal.is_empty() {
                    Some(TemplatePiece::Placeholder)
                } else {
                    pending_placeholder = true;
                    Some(TemplatePiece::Literal(literal))
                }
            }
            None => {
                let literal = rest;
                rest = "";
                Some(TemplatePiece::Literal(literal))
            }
        }
    })
}

/// A route template compiled into an anchored matcher.
#[derive(Clone, Debug)]
pub struct RouteMatcher {
    pattern: RoutePattern,
    regex: Regex,
}

impl RouteMatcher {
    /// Compile a template.
    ///
    /// Literal text is matched literally; only placeholders are wildcards.
    /// Templates are matched against URL paths, so they must start with `/`.
    pub fn compile(pattern: impl Into<RoutePattern>) -> Result<Self> {
        let pattern = pattern.into();
        if !pattern.as_str().starts_with('/') {
            return Err(TurboError::InvalidRoute {
                pattern: pattern.to_string(),
                reason: "template must start with '/'".into(),
            });
        }

        let mut source = String::with_capacity(pattern.as_str().len() + 8);
        source.push('^');
        for piece in split_template(pattern.as_str()) {
            match piece {
                TemplatePiece::Literal(text) => source.push_str(&regex::escape(text)),
                TemplatePiece::Placeholder => source.push_str(SEGMENT_WILDCARD),
            }
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| TurboError::InvalidRoute {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { pattern, regex })
    }

    /// The template this matcher was compiled from.
    #[inline]
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// Whether the whole of `path` matches the template.
    #[inline]
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

/// Ordered set of compiled route matchers.
///
/// Order is significant: earlier entries take priority over later, more
/// general ones. Overlapping templates are not rejected.
#[derive(Clone, Debug, Default)]
pub struct RouteTable {
    matchers: Vec<RouteMatcher>,
}

impl RouteTable {
    /// Compile every template, keeping declaration order.
    pub fn new<I, P>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<RoutePattern>,
    {
        let matchers = patterns
            .into_iter()
            .map(RouteMatcher::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { matchers })
    }

    /// Return the first template matching `path`.
    pub fn match_path(&self, path: &str) -> Option<&RoutePattern> {
        self.matchers
            .iter()
            .find(|matcher| matcher.is_match(path))
            .map(RouteMatcher::pattern)
    }

    /// Templates in declaration order.
    pub fn patterns(&self) -> impl Iterator<Item = &RoutePattern> {
        self.matchers.iter().map(RouteMatcher::pattern)
    }

    /// Number of templates.
    #[inline]
    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    /// Check if there are no templates.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(patterns: &[&str]) -> RouteTable {
        RouteTable::new(patterns.iter().copied()).unwrap()
    }

    #[test]
    fn single_placeholder_matches_any_segment() {
        let routes = table(&["/posts/{id}"]);
        for segment in ["5", "hello-world", "a.b", "%20", "", "{id}", "ünïcode"] {
            let path = format!("/posts/{segment}");
            assert_eq!(
                routes.match_path(&path).map(RoutePattern::as_str),
                Some("/posts/{id}"),
                "path {path:?}"
            );
        }
    }

    #[test]
    fn placeholder_does_not_cross_slash() {
        let routes = table(&["/posts/{id}"]);
        assert!(routes.match_path("/posts/5/edit").is_none());
        assert!(routes.match_path("/posts").is_none());
    }

    #[test]
    fn anchored_at_both_ends() {
        let routes = table(&["/posts"]);
        assert!(routes.match_path("/posts").is_some());
        assert!(routes.match_path("/posts/").is_none());
        assert!(routes.match_path("/api/posts").is_none());
    }

    #[test]
    fn first_declared_match_wins() {
        let routes = table(&["/posts/{id}", "/posts/create", "/{section}/{id}"]);
        assert_eq!(
            routes.match_path("/posts/create").map(RoutePattern::as_str),
            Some("/posts/{id}")
        );
        assert_eq!(
            routes.match_path("/users/7").map(RoutePattern::as_str),
            Some("/{section}/{id}")
        );

        let reordered = table(&["/posts/create", "/posts/{id}"]);
        assert_eq!(
            reordered.match_path("/posts/create").map(RoutePattern::as_str),
            Some("/posts/create")
        );
    }

    #[test]
    fn no_match_returns_none() {
        let routes = table(&["/posts/{id}", "/users/{id}"]);
        assert!(routes.match_path("/settings").is_none());
        assert!(table(&[]).match_path("/").is_none());
    }

    #[test]
    fn literals_are_not_regex() {
        let routes = table(&["/files/{name}.txt", "/a+b"]);
        assert!(routes.match_path("/files/report.txt").is_some());
        assert!(routes.match_path("/files/reportXtxt").is_none());
        assert!(routes.match_path("/a+b").is_some());
        assert!(routes.match_path("/aab").is_none());
    }

    #[test]
    fn multiple_placeholders() {
        let routes = table(&["/users/{user}/posts/{post}"]);
        assert!(routes.match_path("/users/ada/posts/12").is_some());
        assert!(routes.match_path("/users/ada/posts").is_none());
        assert!(routes.match_path("/users/ada/x/posts/12").is_none());
    }

    #[test]
    fn adjacent_placeholders_in_one_segment() {
        let routes = table(&["/archive/{year}-{month}"]);
        assert!(routes.match_path("/archive/2024-05").is_some());
        assert!(routes.match_path("/archive/2024").is_none());
    }

    #[test]
    fn unclosed_brace_is_literal() {
        let routes = table(&["/weird/{id"]);
        assert!(routes.match_path("/weird/{id").is_some());
        assert!(routes.match_path("/weird/5").is_none());
    }

    #[test]
    fn relative_template_is_rejected() {
        for template in ["", "posts/{id}", "{id}"] {
            let err = RouteMatcher::compile(template).unwrap_err();
            assert!(matches!(err, TurboError::InvalidRoute { .. }), "{template:?}");
        }
        assert!(RouteTable::new(["/", "posts"]).is_err());
    }

    #[test]
    fn placeholder_count() {
        assert_eq!(RoutePattern::new("/").placeholder_count(), 0);
        assert_eq!(RoutePattern::new("/posts/{id}").placeholder_count(), 1);
        assert_eq!(RoutePattern::new("/{a}{b}/{c}").placeholder_count(), 3);
    }

    #[test]
    fn split_template_pieces() {
        let pieces: Vec<_> = split_template("/a/{x}/b{y}").collect();
        assert_eq!(
            pieces,
            vec![
                TemplatePiece::Literal("/a/"),
                TemplatePiece::Placeholder,
                TemplatePiece::Literal("/b"),
                TemplatePiece::Placeholder,
            ]
        );
    }

    #[test]
    fn table_keeps_declaration_order() {
        let routes = table(&["/b", "/a", "/c"]);
        let order: Vec<_> = routes.patterns().map(RoutePattern::as_str).collect();
        assert_eq!(order, vec!["/b", "/a", "/c"]);
        assert_eq!(routes.len(), 3);
        assert!(!routes.is_empty());
    }
}
