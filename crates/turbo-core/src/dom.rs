//! The document capability surface.
//!
//! navigate-turbo never owns the DOM. It reads and rearranges it through
//! [`Document`], which a host binding implements over the real document (or
//! which `turbo-dom` implements in memory). All methods take `&self`: node
//! handles behave like browser element references, and the document is
//! shared between the host framework and the listener.
//!
//! Implementations should be lenient. Unknown handles, selectors that match
//! nothing and detached nodes are answered with `None`, `false` or an empty
//! list rather than a panic.

use std::fmt;

/// Operations the swap protocol needs from a live document.
pub trait Document {
    /// Handle to an element. Cloning a handle does not clone the element.
    type Node: Clone + PartialEq + fmt::Debug + 'static;

    /// Absolute URL of the document's current location.
    fn location(&self) -> String;

    /// Tag identifying an isolated browsing context, if this document was
    /// loaded as one.
    fn context_tag(&self) -> Option<String>;

    /// The `<body>` element.
    fn body(&self) -> Option<Self::Node>;

    /// First attached element matching `selector`, in document order.
    fn query_selector(&self, selector: &str) -> Option<Self::Node>;

    /// `root` and every descendant of `root` matching `selector`, in
    /// document order. Works on detached subtrees.
    fn query_selector_all_within(&self, root: &Self::Node, selector: &str) -> Vec<Self::Node>;

    /// Nearest inclusive ancestor of `node` matching `selector`.
    fn closest(&self, node: &Self::Node, selector: &str) -> Option<Self::Node>;

    /// Whether `node` is attached to the document.
    fn is_connected(&self, node: &Self::Node) -> bool;

    /// Attribute value, if present.
    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    /// Whether the attribute is present.
    fn has_attribute(&self, node: &Self::Node, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    /// Set an attribute, replacing any previous value.
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);

    /// Remove an attribute if present.
    fn remove_attribute(&self, node: &Self::Node, name: &str);

    /// Add a class to the element's class list.
    fn add_class(&self, node: &Self::Node, class: &str);

    /// Remove a class from the element's class list.
    fn remove_class(&self, node: &Self::Node, class: &str);

    /// Whether the element's class list contains `class`.
    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    /// Put `replacement` where `old` is, detaching `old`.
    ///
    /// `replacement` is moved out of its current parent first, if any.
    /// Returns `false` when `old` is not attached anywhere.
    fn replace_with(&self, old: &Self::Node, replacement: &Self::Node) -> bool;

    /// Deep copy of `node` that is not attached anywhere.
    fn clone_subtree(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Deep copy of `node` from another document into this one, detached.
    fn import_subtree(&self, from: &Self, node: &Self::Node) -> Option<Self::Node>;

    /// Scroll the viewport.
    fn scroll_to(&self, x: f64, y: f64);

    /// Current viewport scroll offsets as `(x, y)`.
    fn scroll_position(&self) -> (f64, f64);
}
