//! The canonical document tree shared by all format converters.
//!
//! Every conversion routes through one in-memory tree: input converters build
//! it, transform stages mutate it in place, output converters read it. Nodes
//! live in an arena and are addressed by [`NodeId`]; children are stored as
//! ordered id lists, so the placeholder-and-splice replacement the transform
//! stages need is an O(children) vector splice with no parent back-pointer
//! surgery.
//!
//! # Example
//!
//! ```
//! use wikivert::tree::{Tree, QName};
//!
//! let mut tree = Tree::new();
//! let body = tree.body();
//! let p = tree.append_element(body, QName::page("p"));
//! tree.append_text(p, "Hello");
//! assert_eq!(tree.to_xml_string(), "<page><body><p>Hello</p></body></page>");
//! ```

mod serialize;

pub(crate) use serialize::escape_attr;
pub use serialize::escape_text;

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// Attribute namespaces, in serialization order.
///
/// Attribute keys are namespace-qualified so the structural vocabulary, the
/// HTML-origin attributes, transclusion targets and link targets cannot
/// collide on the same element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Ns {
    /// Structural namespace: the tree's own element and attribute vocabulary.
    Page,
    /// Attributes carried over from HTML input (`html:class`, `html:title`, ...).
    Html,
    /// Transclusion placeholders and their targets (`xinclude:href`).
    XInclude,
    /// Link targets (`xlink:href`).
    XLink,
}

impl Ns {
    /// Serialization prefix; the structural namespace is unprefixed.
    pub fn prefix(self) -> &'static str {
        match self {
            Ns::Page => "",
            Ns::Html => "html",
            Ns::XInclude => "xinclude",
            Ns::XLink => "xlink",
        }
    }
}

/// A namespace-qualified element or attribute name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QName {
    pub ns: Ns,
    pub local: Cow<'static, str>,
}

impl QName {
    pub fn new(ns: Ns, local: impl Into<Cow<'static, str>>) -> Self {
        Self {
            ns,
            local: local.into(),
        }
    }

    /// A name in the structural namespace.
    pub fn page(local: impl Into<Cow<'static, str>>) -> Self {
        Self::new(Ns::Page, local)
    }

    /// A name in the HTML-origin namespace.
    pub fn html(local: impl Into<Cow<'static, str>>) -> Self {
        Self::new(Ns::Html, local)
    }

    /// The `xlink:href` attribute name.
    pub fn xlink_href() -> Self {
        Self::new(Ns::XLink, "href")
    }

    /// The `xinclude:href` attribute name.
    pub fn xinclude_href() -> Self {
        Self::new(Ns::XInclude, "href")
    }

    /// The `xinclude:include` element name.
    pub fn xinclude_include() -> Self {
        Self::new(Ns::XInclude, "include")
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = self.ns.prefix();
        if prefix.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{}:{}", prefix, self.local)
        }
    }
}

/// Scheme prefix marking a reference that still needs the link-resolution
/// transform. Everything after the prefix is a percent-encoded wiki-local path.
pub const LOCAL_SCHEME: &str = "wiki.local:";

/// Unique identifier for a node in a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The root node (always the `page` element).
    pub const ROOT: NodeId = NodeId(0);
}

/// Node payload: the tree is a tagged union of elements and text leaves,
/// not a class hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Element {
        name: QName,
        attrs: BTreeMap<QName, String>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An arena-backed document tree.
///
/// Invariants:
/// - node 0 is the root `page` element, wrapping a single `body` element;
/// - every reachable non-root node has exactly one parent;
/// - text nodes never have children.
///
/// Detached nodes (e.g. replaced placeholders) stay in the arena but are no
/// longer reachable from the root; the whole arena is dropped with the tree
/// at the end of the conversion request.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    body: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create a tree with the conventional `page`/`body` skeleton.
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: vec![Node {
                data: NodeData::Element {
                    name: QName::page("page"),
                    attrs: BTreeMap::new(),
                },
                parent: None,
                children: Vec::new(),
            }],
            body: NodeId::ROOT,
        };
        tree.body = tree.append_element(NodeId::ROOT, QName::page("body"));
        tree
    }

    /// The root `page` element.
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// The `body` element under the root.
    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Append a new element under `parent` and return its id.
    pub fn append_element(&mut self, parent: NodeId, name: QName) -> NodeId {
        let id = self.alloc(NodeData::Element {
            name,
            attrs: BTreeMap::new(),
        });
        self.node_mut(id).parent = Some(parent);
        self.node_mut(parent).children.push(id);
        id
    }

    /// Append text under `parent`, merging with a trailing text sibling.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let last = self.node(parent).children.last().copied();
        if let Some(last) = last
            && let NodeData::Text(existing) = &mut self.node_mut(last).data
        {
            existing.push_str(text);
            return last;
        }
        let id = self.alloc(NodeData::Text(text.to_string()));
        self.node_mut(id).parent = Some(parent);
        self.node_mut(parent).children.push(id);
        id
    }

    /// Create an element without attaching it anywhere yet.
    pub fn new_element(&mut self, name: QName) -> NodeId {
        self.alloc(NodeData::Element {
            name,
            attrs: BTreeMap::new(),
        })
    }

    /// Create a detached text node (no merging).
    pub fn new_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Text(text.to_string()))
    }

    /// Attach a detached node as the last child of `parent`.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.node(child).parent.is_none());
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.node(id).data
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// The element name, or `None` for text nodes.
    pub fn name(&self, id: NodeId) -> Option<&QName> {
        match &self.node(id).data {
            NodeData::Element { name, .. } => Some(name),
            NodeData::Text(_) => None,
        }
    }

    /// The text content, or `None` for elements.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Text(s) => Some(s.as_str()),
            NodeData::Element { .. } => None,
        }
    }

    /// Whether `id` is an element with the given structural-namespace name.
    pub fn is_page_element(&self, id: NodeId, local: &str) -> bool {
        self.name(id)
            .is_some_and(|n| n.ns == Ns::Page && n.local == local)
    }

    pub fn attr(&self, id: NodeId, key: &QName) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Element { attrs, .. } => attrs.get(key).map(String::as_str),
            NodeData::Text(_) => None,
        }
    }

    /// Set an attribute; setting on a text node is a no-op.
    pub fn set_attr(&mut self, id: NodeId, key: QName, value: impl Into<String>) {
        if let NodeData::Element { attrs, .. } = &mut self.node_mut(id).data {
            attrs.insert(key, value.into());
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, key: &QName) -> Option<String> {
        match &mut self.node_mut(id).data {
            NodeData::Element { attrs, .. } => attrs.remove(key),
            NodeData::Text(_) => None,
        }
    }

    /// All attributes of an element, in serialization order.
    pub fn attrs(&self, id: NodeId) -> impl Iterator<Item = (&QName, &str)> {
        match &self.node(id).data {
            NodeData::Element { attrs, .. } => Some(attrs.iter().map(|(k, v)| (k, v.as_str()))),
            NodeData::Text(_) => None,
        }
        .into_iter()
        .flatten()
    }

    /// Ordered children of a node.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Lazy pre-order iterator over `start` and all its descendants.
    ///
    /// The iterator snapshots nothing; call again for a fresh walk. Callers
    /// that mutate during a walk should collect the ids first.
    pub fn descendants(&self, start: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![start],
        }
    }

    /// Replace `target` in its parent's child list with `replacements`,
    /// preserving sibling order. The target is detached (left orphaned in the
    /// arena); each replacement must be detached beforehand.
    ///
    /// This is the one primitive that rewrites a parent link; include and
    /// macro expansion are built on it.
    pub fn replace(&mut self, target: NodeId, replacements: &[NodeId]) {
        let Some(parent) = self.node(target).parent else {
            return;
        };
        let pos = self
            .node(parent)
            .children
            .iter()
            .position(|&c| c == target)
            .expect("target is a child of its parent");
        self.node_mut(target).parent = None;
        for &r in replacements {
            debug_assert!(self.node(r).parent.is_none());
            self.node_mut(r).parent = Some(parent);
        }
        self.node_mut(parent)
            .children
            .splice(pos..=pos, replacements.iter().copied());
    }

    /// Replace `id` with its own children (drop the wrapper, keep the content).
    pub fn unwrap(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.node(id).children.clone();
        for &child in &children {
            self.node_mut(child).parent = None;
        }
        self.node_mut(id).children.clear();
        self.replace(id, &children);
    }

    /// Deep-copy `source_node` (and its subtree) from another tree into this
    /// arena, returning the detached copy's id.
    pub fn import(&mut self, source: &Tree, source_node: NodeId) -> NodeId {
        let id = self.alloc(source.node(source_node).data.clone());
        let children: Vec<NodeId> = source.children(source_node).to_vec();
        for child in children {
            let copy = self.import(source, child);
            self.node_mut(copy).parent = Some(id);
            self.node_mut(id).children.push(copy);
        }
        id
    }

    /// Concatenated text content of a subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for n in self.descendants(id) {
            if let Some(t) = self.text(n) {
                out.push_str(t);
            }
        }
        out
    }

    /// Structural equality of two subtrees: same names, attributes and
    /// children recursively, ignoring node identity.
    pub fn subtree_eq(&self, a: NodeId, other: &Tree, b: NodeId) -> bool {
        if self.node(a).data != other.node(b).data {
            return false;
        }
        let ca = self.children(a);
        let cb = other.children(b);
        ca.len() == cb.len()
            && ca
                .iter()
                .zip(cb.iter())
                .all(|(&x, &y)| self.subtree_eq(x, other, y))
    }
}

/// Trees compare structurally from the root, ignoring orphaned nodes.
impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.subtree_eq(NodeId::ROOT, other, NodeId::ROOT)
    }
}

impl Eq for Tree {}

/// Pre-order (document order) iterator over a subtree.
pub struct Descendants<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(current).iter().rev().copied());
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tree_skeleton() {
        let tree = Tree::new();
        assert!(tree.is_page_element(tree.root(), "page"));
        assert!(tree.is_page_element(tree.body(), "body"));
        assert_eq!(tree.children(tree.root()), &[tree.body()]);
    }

    #[test]
    fn test_text_merging() {
        let mut tree = Tree::new();
        let body = tree.body();
        let p = tree.append_element(body, QName::page("p"));
        tree.append_text(p, "Hello, ");
        tree.append_text(p, "World!");
        assert_eq!(tree.children(p).len(), 1);
        assert_eq!(tree.text(tree.children(p)[0]), Some("Hello, World!"));
    }

    #[test]
    fn test_preorder_descendants() {
        let mut tree = Tree::new();
        let body = tree.body();
        let p1 = tree.append_element(body, QName::page("p"));
        let t = tree.append_text(p1, "Text");
        let p2 = tree.append_element(body, QName::page("p"));
        let order: Vec<NodeId> = tree.descendants(tree.root()).collect();
        assert_eq!(order, vec![tree.root(), body, p1, t, p2]);
    }

    #[test]
    fn test_replace_preserves_sibling_order() {
        let mut tree = Tree::new();
        let body = tree.body();
        let a = tree.append_element(body, QName::page("p"));
        let placeholder = tree.append_element(body, QName::xinclude_include());
        let b = tree.append_element(body, QName::page("p"));

        let r1 = tree.new_element(QName::page("div"));
        let r2 = tree.new_text("tail");
        tree.replace(placeholder, &[r1, r2]);

        assert_eq!(tree.children(body), &[a, r1, r2, b]);
        assert_eq!(tree.parent(r1), Some(body));
        assert_eq!(tree.parent(placeholder), None);
    }

    #[test]
    fn test_replace_with_empty_removes() {
        let mut tree = Tree::new();
        let body = tree.body();
        let p = tree.append_element(body, QName::page("p"));
        tree.replace(p, &[]);
        assert!(tree.children(body).is_empty());
    }

    #[test]
    fn test_import_deep_copies() {
        let mut source = Tree::new();
        let sp = source.append_element(source.body(), QName::page("p"));
        source.append_text(sp, "copied");
        source.set_attr(sp, QName::html("class"), "x");

        let mut dest = Tree::new();
        let copy = dest.import(&source, sp);
        assert!(dest.parent(copy).is_none());
        assert!(dest.subtree_eq(copy, &source, sp));
    }

    #[test]
    fn test_structural_equality_ignores_identity() {
        let mut a = Tree::new();
        let p = a.append_element(a.body(), QName::page("p"));
        a.append_text(p, "same");

        let mut b = Tree::new();
        // Allocate some garbage first so ids differ.
        let orphan = b.new_element(QName::page("div"));
        let _ = orphan;
        let p = b.append_element(b.body(), QName::page("p"));
        b.append_text(p, "same");

        assert_eq!(a, b);
    }

    #[test]
    fn test_attr_roundtrip() {
        let mut tree = Tree::new();
        let p = tree.append_element(tree.body(), QName::page("p"));
        tree.set_attr(p, QName::page("class"), "note");
        assert_eq!(tree.attr(p, &QName::page("class")), Some("note"));
        assert_eq!(tree.remove_attr(p, &QName::page("class")), Some("note".to_string()));
        assert_eq!(tree.attr(p, &QName::page("class")), None);
    }
}
