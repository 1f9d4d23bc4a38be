//! In-memory document over a `scraper` HTML tree.
//!
//! The tree is an [`ego_tree::Tree`] of [`scraper::Node`]s. Detached
//! subtrees stay in the tree until a collection pass drops the ones no
//! [`NodeId`] refers to any more, so snapshots that get overwritten and
//! regions the framework throws away do not pin memory.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::mem;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use ego_tree::{NodeId as TreeId, NodeRef, Tree};
use fnv::{FnvHashMap, FnvHashSet};
use html5ever::tendril::StrTendril;
use html5ever::{Attribute, LocalName, Namespace, QualName};
use scraper::node::{Element, Text};
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, trace};
use turbo_core::{Document, Result, TurboError};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Arena size below which detached nodes are left alone.
const COLLECT_FLOOR: usize = 1024;

static NEXT_DOCUMENT: AtomicU64 = AtomicU64::new(1);

/// Parse a CSS selector.
///
/// # Errors
///
/// Returns [`TurboError::InvalidSelector`] if `selector` is not valid CSS.
pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|err| TurboError::invalid_selector(selector, err.to_string()))
}

struct Slot {
    document: u64,
    node: Cell<TreeId>,
}

/// Handle to an element of a [`MemoryDocument`].
///
/// Handles behave like browser element references: cloning one does not
/// clone the element, two handles are equal when they name the same element,
/// and a detached element lives as long as some handle to it does. Handles
/// are only meaningful for the document that issued them; a foreign handle
/// is treated as unknown.
#[derive(Clone)]
pub struct NodeId(Rc<Slot>);

impl PartialEq for NodeId {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for NodeId {}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeId")
            .field("document", &self.0.document)
            .field("node", &self.0.node.get())
            .finish()
    }
}

/// Pre-order copy of a subtree. Each entry carries its source id and the
/// index of its parent entry.
struct Fragment(Vec<(TreeId, Option<usize>, Node)>);

impl Fragment {
    fn extract(tree: &Tree<Node>, id: TreeId) -> Option<Self> {
        let top = tree.get(id)?;
        let mut nodes = Vec::new();
        let mut stack = vec![(top, None)];
        while let Some((node, parent)) = stack.pop() {
            let index = nodes.len();
            nodes.push((node.id(), parent, node.value().clone()));
            let children: Vec<_> = node.children().collect();
            stack.extend(children.into_iter().rev().map(|child| (child, Some(index))));
        }
        Some(Self(nodes))
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    /// Rebuild the fragment in `tree`. The first entry becomes a new orphan,
    /// or maps onto `onto` when given. Returns `(source, copy)` id pairs.
    fn graft(self, tree: &mut Tree<Node>, onto: Option<TreeId>) -> Vec<(TreeId, TreeId)> {
        let mut placed: Vec<(TreeId, TreeId)> = Vec::with_capacity(self.0.len());
        for (source, parent, value) in self.0 {
            let id = match (parent, onto) {
                (None, Some(existing)) => existing,
                _ => tree.orphan(value).id(),
            };
            if let Some(parent_id) = parent.and_then(|p| placed.get(p)).map(|(_, to)| *to) {
                if let Some(mut parent_node) = tree.get_mut(parent_id) {
                    parent_node.append_id(id);
                }
            }
            placed.push((source, id));
        }
        placed
    }
}

fn attribute(name: &str, value: &str) -> Attribute {
    Attribute {
        name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
        value: StrTendril::from_slice(value),
    }
}

fn element_node(tag: &str, attributes: &[(&str, &str)]) -> Node {
    let name = QualName::new(
        None,
        Namespace::from(HTML_NAMESPACE),
        LocalName::from(tag.to_ascii_lowercase().as_str()),
    );
    let attrs = attributes
        .iter()
        .map(|(name, value)| attribute(name, value))
        .collect();
    Node::Element(Element::new(name, attrs))
}

fn blank_html() -> Html {
    let mut html = Html::new_document();
    let mut root = html.tree.root_mut();
    let mut document_element = root.append(element_node("html", &[]));
    document_element.append(element_node("head", &[]));
    document_element.append(element_node("body", &[]));
    html
}

fn named_child<'a>(node: NodeRef<'a, Node>, tag: &str) -> Option<NodeRef<'a, Node>> {
    node.children()
        .find(|child| child.value().as_element().is_some_and(|e| e.name() == tag))
}

/// `root` and its descendants matching `selector`, in document order.
fn matching<'a>(
    tree: &'a Tree<Node>,
    root: TreeId,
    selector: &'a Selector,
) -> impl Iterator<Item = TreeId> + 'a {
    tree.get(root)
        .into_iter()
        .flat_map(|node| node.descendants())
        .filter(move |node| ElementRef::wrap(*node).is_some_and(|e| selector.matches(&e)))
        .map(|node| node.id())
}

struct Arena {
    document: u64,
    html: Html,
    handles: FnvHashMap<TreeId, Weak<Slot>>,
    /// Nodes in the tree, attached or not.
    len: usize,
    /// Nodes kept by the last collection.
    live: usize,
}

impl Arena {
    fn new(html: Html) -> Self {
        let len = html.tree.root().descendants().count();
        Self {
            document: NEXT_DOCUMENT.fetch_add(1, Ordering::Relaxed),
            html,
            handles: FnvHashMap::default(),
            len,
            live: len,
        }
    }

    fn tree(&self) -> &Tree<Node> {
        &self.html.tree
    }

    fn root(&self) -> TreeId {
        self.html.tree.root().id()
    }

    fn body(&self) -> Option<TreeId> {
        let document_element = named_child(self.html.tree.root(), "html")?;
        named_child(document_element, "body").map(|body| body.id())
    }

    fn handle(&mut self, id: TreeId) -> NodeId {
        if let Some(slot) = self.handles.get(&id).and_then(Weak::upgrade) {
            return NodeId(slot);
        }
        let slot = Rc::new(Slot {
            document: self.document,
            node: Cell::new(id),
        });
        self.handles.insert(id, Rc::downgrade(&slot));
        NodeId(slot)
    }

    fn resolve(&self, node: &NodeId) -> Option<TreeId> {
        let id = node.0.node.get();
        (node.0.document == self.document && self.html.tree.get(id).is_some()).then_some(id)
    }

    fn element(&self, id: TreeId) -> Option<&Element> {
        self.html.tree.get(id)?.value().as_element()
    }

    fn orphan(&mut self, node: Node) -> TreeId {
        self.len += 1;
        self.html.tree.orphan(node).id()
    }

    fn is_inclusive_ancestor(&self, ancestor: TreeId, node: TreeId) -> bool {
        node == ancestor
            || self
                .html
                .tree
                .get(node)
                .is_some_and(|n| n.ancestors().any(|a| a.id() == ancestor))
    }

    fn is_connected(&self, id: TreeId) -> bool {
        self.is_inclusive_ancestor(self.root(), id)
    }

    fn detach(&mut self, id: TreeId) {
        if let Some(mut node) = self.html.tree.get_mut(id) {
            node.detach();
        }
    }

    fn append(&mut self, parent: TreeId, child: TreeId) -> bool {
        if self.is_inclusive_ancestor(child, parent) {
            return false;
        }
        self.detach(child);
        match self.html.tree.get_mut(parent) {
            Some(mut node) => {
                node.append_id(child);
                true
            }
            None => false,
        }
    }

    fn replace(&mut self, old: TreeId, replacement: TreeId) -> bool {
        if self.html.tree.get(old).and_then(|n| n.parent()).is_none() {
            return false;
        }
        if old == replacement {
            return true;
        }
        if self.is_inclusive_ancestor(replacement, old) {
            return false;
        }

        self.detach(replacement);
        match self.html.tree.get_mut(old) {
            Some(mut node) => {
                node.insert_id_before(replacement);
                node.detach();
                true
            }
            None => false,
        }
    }

    /// Rewrite an element's attribute list.
    fn edit_attributes(&mut self, id: TreeId, edit: impl FnOnce(&mut Vec<(String, String)>)) {
        let Some(mut node) = self.html.tree.get_mut(id) else {
            return;
        };
        let Node::Element(element) = node.value() else {
            return;
        };
        let mut attrs: Vec<(String, String)> = element
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        edit(&mut attrs);
        let attrs = attrs
            .iter()
            .map(|(name, value)| attribute(name, value))
            .collect();
        let rebuilt = Element::new(element.name.clone(), attrs);
        *element = rebuilt;
    }

    fn own_text(&self, id: TreeId) -> Option<String> {
        let node = self.html.tree.get(id)?;
        node.value().as_element()?;
        let mut text = String::new();
        for child in node.children() {
            if let Node::Text(chunk) = child.value() {
                text.push_str(chunk);
            }
        }
        Some(text)
    }

    fn set_own_text(&mut self, id: TreeId, text: &str) {
        let Some(node) = self.html.tree.get(id) else {
            return;
        };
        if node.value().as_element().is_none() {
            return;
        }
        let stale: Vec<TreeId> = node
            .children()
            .filter(|child| child.value().is_text())
            .map(|child| child.id())
            .collect();
        for chunk in stale {
            self.detach(chunk);
        }
        if text.is_empty() {
            return;
        }
        let chunk = self.orphan(Node::Text(Text {
            text: StrTendril::from_slice(text),
        }));
        if let Some(mut node) = self.html.tree.get_mut(id) {
            node.prepend_id(chunk);
        }
    }

    /// Copy a fragment in as a detached subtree and hand out its root.
    fn adopt(&mut self, fragment: Fragment) -> Option<NodeId> {
        self.len += fragment.len();
        let (_, top) = *fragment.graft(&mut self.html.tree, None).first()?;
        let handle = self.handle(top);
        self.maybe_collect();
        Some(handle)
    }

    fn maybe_collect(&mut self) {
        if self.len > COLLECT_FLOOR && self.len > 2 * self.live {
            self.collect();
        }
    }

    /// Rebuild the tree with the document and every detached subtree some
    /// live handle points into; everything else is dropped.
    fn collect(&mut self) {
        self.handles.retain(|_, slot| slot.strong_count() > 0);

        let (tree, remap) = {
            let old = &self.html.tree;
            let root = old.root().id();
            let mut seen = FnvHashSet::default();
            seen.insert(root);
            let mut tops = vec![root];
            for id in self.handles.keys() {
                let Some(node) = old.get(*id) else {
                    continue;
                };
                let top = node.ancestors().last().map_or(*id, |a| a.id());
                if seen.insert(top) {
                    tops.push(top);
                }
            }

            let mut tree = Tree::new(old.root().value().clone());
            let mut remap = FnvHashMap::default();
            for top in tops {
                let Some(fragment) = Fragment::extract(old, top) else {
                    continue;
                };
                let onto = (top == root).then(|| tree.root().id());
                remap.extend(fragment.graft(&mut tree, onto));
            }
            (tree, remap)
        };

        for (old_id, slot) in mem::take(&mut self.handles) {
            if let (Some(new_id), Some(live)) = (remap.get(&old_id), slot.upgrade()) {
                live.node.set(*new_id);
                self.handles.insert(*new_id, slot);
            }
        }

        debug!(
            before = self.len,
            after = remap.len(),
            handles = self.handles.len(),
            "collected detached nodes"
        );
        self.html.tree = tree;
        self.len = remap.len();
        self.live = self.len;
    }
}

/// In-memory implementation of [`Document`].
///
/// Interior mutability mirrors how browser element handles behave: any
/// holder of a shared reference may rearrange the tree.
pub struct MemoryDocument {
    arena: RefCell<Arena>,
    location: RefCell<String>,
    scroll: Cell<(f64, f64)>,
    context_tag: Option<String>,
}

impl fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDocument")
            .field("location", &self.location.borrow())
            .field("nodes", &self.node_count())
            .field("context_tag", &self.context_tag)
            .finish()
    }
}

impl MemoryDocument {
    /// Create a document containing `<html><head></head><body></body></html>`.
    pub fn new(location: impl Into<String>) -> Self {
        Self::from_html(location, blank_html())
    }

    /// Parse `markup` as a full HTML document.
    pub fn parse(location: impl Into<String>, markup: &str) -> Self {
        Self::from_html(location, Html::parse_document(markup))
    }

    /// Create a document loaded as an isolated context carrying `tag`.
    pub fn isolated(location: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::new(location).with_context_tag(tag)
    }

    /// Mark this document as an isolated context carrying `tag`.
    pub fn with_context_tag(mut self, tag: impl Into<String>) -> Self {
        self.context_tag = Some(tag.into());
        self
    }

    fn from_html(location: impl Into<String>, html: Html) -> Self {
        Self {
            arena: RefCell::new(Arena::new(html)),
            location: RefCell::new(location.into()),
            scroll: Cell::new((0.0, 0.0)),
            context_tag: None,
        }
    }

    /// The `<html>` element.
    pub fn root(&self) -> Option<NodeId> {
        let mut arena = self.arena.borrow_mut();
        let id = named_child(arena.tree().root(), "html")?.id();
        Some(arena.handle(id))
    }

    /// Change the current location, as a framework navigation would.
    pub fn set_location(&self, location: impl Into<String>) {
        *self.location.borrow_mut() = location.into();
    }

    /// Create a detached element.
    pub fn create_element(&self, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let mut arena = self.arena.borrow_mut();
        let id = arena.orphan(element_node(tag, attributes));
        let handle = arena.handle(id);
        arena.maybe_collect();
        handle
    }

    /// Create an element and append it to `parent`.
    pub fn append_element(
        &self,
        parent: &NodeId,
        tag: &str,
        attributes: &[(&str, &str)],
    ) -> NodeId {
        let id = self.create_element(tag, attributes);
        self.append_child(parent, &id);
        id
    }

    /// Move `child` to the end of `parent`'s children.
    ///
    /// Returns `false` for unknown handles or when `child` is an inclusive
    /// ancestor of `parent`.
    pub fn append_child(&self, parent: &NodeId, child: &NodeId) -> bool {
        let mut arena = self.arena.borrow_mut();
        let (Some(parent), Some(child)) = (arena.resolve(parent), arena.resolve(child)) else {
            return false;
        };
        arena.append(parent, child)
    }

    /// Replace the element's own text with `text`.
    pub fn set_text(&self, node: &NodeId, text: impl Into<String>) {
        let mut arena = self.arena.borrow_mut();
        if let Some(id) = arena.resolve(node) {
            arena.set_own_text(id, &text.into());
            arena.maybe_collect();
        }
    }

    /// Text carried directly by an element (not including descendants).
    pub fn text(&self, node: &NodeId) -> Option<String> {
        let arena = self.arena.borrow();
        arena.own_text(arena.resolve(node)?)
    }

    /// Lower-case tag name.
    pub fn tag(&self, node: &NodeId) -> Option<String> {
        let arena = self.arena.borrow();
        arena
            .element(arena.resolve(node)?)
            .map(|e| e.name().to_string())
    }

    /// Parent element, if attached to one.
    pub fn parent(&self, node: &NodeId) -> Option<NodeId> {
        let mut arena = self.arena.borrow_mut();
        let id = arena.resolve(node)?;
        let parent = arena
            .tree()
            .get(id)?
            .parent()
            .filter(|p| p.value().is_element())?
            .id();
        Some(arena.handle(parent))
    }

    /// Child elements in order.
    pub fn children(&self, node: &NodeId) -> Vec<NodeId> {
        let mut arena = self.arena.borrow_mut();
        let Some(id) = arena.resolve(node) else {
            return Vec::new();
        };
        let ids: Vec<TreeId> = arena
            .tree()
            .get(id)
            .into_iter()
            .flat_map(|n| n.children())
            .filter(|child| child.value().is_element())
            .map(|child| child.id())
            .collect();
        ids.into_iter().map(|id| arena.handle(id)).collect()
    }

    /// Serialized HTML of the element and its descendants.
    pub fn outer_html(&self, node: &NodeId) -> Option<String> {
        let arena = self.arena.borrow();
        let id = arena.resolve(node)?;
        ElementRef::wrap(arena.tree().get(id)?).map(|element| element.html())
    }

    /// Nodes currently held by the tree, attached or not.
    pub fn node_count(&self) -> usize {
        self.arena.borrow().len
    }

    /// Drop every detached subtree no handle refers to.
    pub fn collect_garbage(&self) {
        self.arena.borrow_mut().collect();
    }

    fn selector(selector: &str) -> Option<Selector> {
        match parse_selector(selector) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                debug!(error = %err, "ignoring unparsable selector");
                None
            }
        }
    }
}

impl Document for MemoryDocument {
    type Node = NodeId;

    fn location(&self) -> String {
        self.location.borrow().clone()
    }

    fn context_tag(&self) -> Option<String> {
        self.context_tag.clone()
    }

    fn body(&self) -> Option<NodeId> {
        let mut arena = self.arena.borrow_mut();
        let body = arena.body()?;
        Some(arena.handle(body))
    }

    fn query_selector(&self, selector: &str) -> Option<NodeId> {
        let selector = Self::selector(selector)?;
        let mut arena = self.arena.borrow_mut();
        let root = arena.root();
        let found = matching(arena.tree(), root, &selector).next()?;
        Some(arena.handle(found))
    }

    fn query_selector_all_within(&self, root: &NodeId, selector: &str) -> Vec<NodeId> {
        let Some(selector) = Self::selector(selector) else {
            return Vec::new();
        };
        let mut arena = self.arena.borrow_mut();
        let Some(root) = arena.resolve(root) else {
            return Vec::new();
        };
        let found: Vec<TreeId> = matching(arena.tree(), root, &selector).collect();
        trace!(matches = found.len(), "query_selector_all_within");
        found.into_iter().map(|id| arena.handle(id)).collect()
    }

    fn closest(&self, node: &NodeId, selector: &str) -> Option<NodeId> {
        let selector = Self::selector(selector)?;
        let mut arena = self.arena.borrow_mut();
        let start = arena.tree().get(arena.resolve(node)?)?;
        let found = std::iter::once(start)
            .chain(start.ancestors())
            .find(|node| ElementRef::wrap(*node).is_some_and(|e| selector.matches(&e)))?
            .id();
        Some(arena.handle(found))
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        let arena = self.arena.borrow();
        arena.resolve(node).is_some_and(|id| arena.is_connected(id))
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        let arena = self.arena.borrow();
        arena
            .element(arena.resolve(node)?)?
            .attr(name)
            .map(str::to_string)
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) {
        let mut arena = self.arena.borrow_mut();
        if let Some(id) = arena.resolve(node) {
            arena.edit_attributes(id, |attrs| {
                match attrs.iter_mut().find(|(existing, _)| existing == name) {
                    Some((_, existing)) => *existing = value.to_string(),
                    None => attrs.push((name.to_string(), value.to_string())),
                }
            });
        }
    }

    fn remove_attribute(&self, node: &NodeId, name: &str) {
        let mut arena = self.arena.borrow_mut();
        if let Some(id) = arena.resolve(node) {
            arena.edit_attributes(id, |attrs| attrs.retain(|(existing, _)| existing != name));
        }
    }

    fn add_class(&self, node: &NodeId, class: &str) {
        if self.has_class(node, class) {
            return;
        }
        let mut arena = self.arena.borrow_mut();
        if let Some(id) = arena.resolve(node) {
            arena.edit_attributes(id, |attrs| {
                match attrs.iter_mut().find(|(name, _)| name == "class") {
                    Some((_, list)) if !list.trim().is_empty() => {
                        *list = format!("{} {class}", list.trim_end());
                    }
                    Some((_, list)) => *list = class.to_string(),
                    None => attrs.push(("class".to_string(), class.to_string())),
                }
            });
        }
    }

    fn remove_class(&self, node: &NodeId, class: &str) {
        if !self.has_class(node, class) {
            return;
        }
        let mut arena = self.arena.borrow_mut();
        if let Some(id) = arena.resolve(node) {
            arena.edit_attributes(id, |attrs| {
                for (_, list) in attrs.iter_mut().filter(|(name, _)| name == "class") {
                    *list = list
                        .split_whitespace()
                        .filter(|c| *c != class)
                        .collect::<Vec<_>>()
                        .join(" ");
                }
                attrs.retain(|(name, list)| name != "class" || !list.is_empty());
            });
        }
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        let arena = self.arena.borrow();
        arena
            .resolve(node)
            .and_then(|id| arena.element(id))
            .is_some_and(|e| e.classes().any(|c| c == class))
    }

    fn replace_with(&self, old: &NodeId, replacement: &NodeId) -> bool {
        let mut arena = self.arena.borrow_mut();
        let (Some(old), Some(replacement)) = (arena.resolve(old), arena.resolve(replacement))
        else {
            return false;
        };
        arena.replace(old, replacement)
    }

    fn clone_subtree(&self, node: &NodeId) -> Option<NodeId> {
        let mut arena = self.arena.borrow_mut();
        let id = arena.resolve(node)?;
        let fragment = Fragment::extract(arena.tree(), id)?;
        arena.adopt(fragment)
    }

    fn import_subtree(&self, from: &Self, node: &NodeId) -> Option<NodeId> {
        let fragment = {
            let source = from.arena.borrow();
            let id = source.resolve(node)?;
            Fragment::extract(source.tree(), id)?
        };
        self.arena.borrow_mut().adopt(fragment)
    }

    fn scroll_to(&self, x: f64, y: f64) {
        self.scroll.set((x, y));
    }

    fn scroll_position(&self) -> (f64, f64) {
        self.scroll.get()
    }
}
