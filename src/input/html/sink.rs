//! html5ever TreeSink building a raw HTML DOM arena.
//!
//! The raw DOM keeps html5ever's own names and attributes; mapping into the
//! document tree happens afterwards, in a separate pass, so the mapping table
//! stays independent of the parser.

use std::cell::RefCell;

use html5ever::driver::ParseOpts;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute, QualName, parse_document};

/// Identifier of a node in the raw HTML DOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DomId(pub u32);

impl DomId {
    pub const DOCUMENT: DomId = DomId(0);
}

/// Raw DOM node payload.
#[derive(Debug)]
pub enum DomData {
    Document,
    Element {
        name: QualName,
        attrs: Vec<(QualName, String)>,
    },
    Text(String),
    /// Comments and doctypes are kept as inert placeholders so the sink can
    /// hand out handles for them; the mapping pass skips them.
    Ignored,
}

#[derive(Debug)]
struct DomNode {
    data: DomData,
    parent: Option<DomId>,
    children: Vec<DomId>,
}

/// Arena DOM produced by the HTML parser.
#[derive(Debug)]
pub struct HtmlDom {
    nodes: Vec<DomNode>,
}

impl HtmlDom {
    fn new() -> Self {
        Self {
            nodes: vec![DomNode {
                data: DomData::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    fn alloc(&mut self, data: DomData) -> DomId {
        let id = DomId(self.nodes.len() as u32);
        self.nodes.push(DomNode {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn data(&self, id: DomId) -> &DomData {
        &self.nodes[id.0 as usize].data
    }

    pub fn children(&self, id: DomId) -> &[DomId] {
        &self.nodes[id.0 as usize].children
    }

    /// Lowercased local name of an element.
    pub fn tag_name(&self, id: DomId) -> Option<String> {
        match self.data(id) {
            DomData::Element { name, .. } => Some(name.local.as_ref().to_ascii_lowercase()),
            _ => None,
        }
    }

    /// Attribute value by (lowercased) local name.
    pub fn attr(&self, id: DomId, local: &str) -> Option<&str> {
        match self.data(id) {
            DomData::Element { attrs, .. } => attrs
                .iter()
                .find(|(name, _)| name.local.as_ref().eq_ignore_ascii_case(local))
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    /// Depth-first search for the first element with the given tag name.
    pub fn find_tag(&self, tag: &str) -> Option<DomId> {
        let mut stack = vec![DomId::DOCUMENT];
        while let Some(id) = stack.pop() {
            if self.tag_name(id).as_deref() == Some(tag) {
                return Some(id);
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        None
    }

    fn append(&mut self, parent: DomId, child: DomId) {
        self.nodes[child.0 as usize].parent = Some(parent);
        self.nodes[parent.0 as usize].children.push(child);
    }

    fn append_text(&mut self, parent: DomId, text: &str) {
        let last = self.nodes[parent.0 as usize].children.last().copied();
        if let Some(last) = last
            && let DomData::Text(existing) = &mut self.nodes[last.0 as usize].data
        {
            existing.push_str(text);
            return;
        }
        let id = self.alloc(DomData::Text(text.to_string()));
        self.append(parent, id);
    }

    fn insert_before(&mut self, sibling: DomId, new_node: DomId) {
        let Some(parent) = self.nodes[sibling.0 as usize].parent else {
            return;
        };
        let pos = self.nodes[parent.0 as usize]
            .children
            .iter()
            .position(|&c| c == sibling)
            .expect("sibling is a child of its parent");
        self.nodes[new_node.0 as usize].parent = Some(parent);
        self.nodes[parent.0 as usize].children.insert(pos, new_node);
    }

    fn remove_from_parent(&mut self, target: DomId) {
        let Some(parent) = self.nodes[target.0 as usize].parent.take() else {
            return;
        };
        self.nodes[parent.0 as usize]
            .children
            .retain(|&c| c != target);
    }

    fn reparent_children(&mut self, from: DomId, to: DomId) {
        let children = std::mem::take(&mut self.nodes[from.0 as usize].children);
        for &child in &children {
            self.nodes[child.0 as usize].parent = Some(to);
        }
        self.nodes[to.0 as usize].children.extend(children);
    }
}

/// Parse an HTML document (or fragment source) into a raw DOM.
///
/// Full-document parsing is used even for fragments: html5ever synthesizes
/// the `html`/`head`/`body` scaffolding, and the mapping pass starts at
/// `body`, so fragment input costs nothing extra.
pub fn parse_html(input: &str) -> HtmlDom {
    let sink = Sink::new();
    parse_document(sink, ParseOpts::default())
        .from_utf8()
        .one(input.as_bytes())
        .into_dom()
}

/// TreeSink implementation over [`HtmlDom`].
///
/// html5ever's trait takes `&self`, so the arena sits behind a `RefCell`.
struct Sink {
    dom: RefCell<HtmlDom>,
    quirks_mode: RefCell<QuirksMode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Handle(DomId);

impl Sink {
    fn new() -> Self {
        Self {
            dom: RefCell::new(HtmlDom::new()),
            quirks_mode: RefCell::new(QuirksMode::NoQuirks),
        }
    }

    fn into_dom(self) -> HtmlDom {
        self.dom.into_inner()
    }
}

impl TreeSink for Sink {
    type Handle = Handle;
    type Output = Self;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self
    }

    fn parse_error(&self, _msg: std::borrow::Cow<'static, str>) {
        // Lenient like a browser; malformed markup must never abort.
    }

    fn get_document(&self) -> Self::Handle {
        Handle(DomId::DOCUMENT)
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        static EMPTY: QualName = QualName {
            prefix: None,
            ns: html5ever::ns!(),
            local: html5ever::local_name!(""),
        };

        let dom = self.dom.borrow();
        match dom.data(target.0) {
            DomData::Element { name, .. } => {
                // SAFETY: names live in the arena, which lives as long as
                // self; the arena only grows, so the reference stays valid.
                // The RefCell borrow cannot express that, hence the unsafe
                // lifetime extension.
                unsafe { std::mem::transmute::<&QualName, &'a QualName>(name) }
            }
            _ => &EMPTY,
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let attrs = attrs
            .into_iter()
            .map(|a| (a.name, a.value.to_string()))
            .collect();
        let id = self
            .dom
            .borrow_mut()
            .alloc(DomData::Element { name, attrs });
        Handle(id)
    }

    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        Handle(self.dom.borrow_mut().alloc(DomData::Ignored))
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        Handle(self.dom.borrow_mut().alloc(DomData::Ignored))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let mut dom = self.dom.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => dom.append(parent.0, node.0),
            NodeOrText::AppendText(text) => dom.append_text(parent.0, &text),
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let parent = self.dom.borrow().nodes[element.0.0 as usize].parent;
        if let Some(parent) = parent {
            let mut dom = self.dom.borrow_mut();
            match child {
                NodeOrText::AppendNode(node) => dom.append(parent, node.0),
                NodeOrText::AppendText(text) => dom.append_text(parent, &text),
            }
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        // Doctype carries nothing the tree model represents.
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        *target
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x.0 == y.0
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        *self.quirks_mode.borrow_mut() = mode;
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut dom = self.dom.borrow_mut();
        match new_node {
            NodeOrText::AppendNode(node) => dom.insert_before(sibling.0, node.0),
            NodeOrText::AppendText(text) => {
                let id = dom.alloc(DomData::Text(text.to_string()));
                dom.insert_before(sibling.0, id);
            }
        }
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let mut dom = self.dom.borrow_mut();
        if let DomData::Element {
            attrs: existing, ..
        } = &mut dom.nodes[target.0.0 as usize].data
        {
            for attr in attrs {
                if !existing.iter().any(|(name, _)| *name == attr.name) {
                    existing.push((attr.name, attr.value.to_string()));
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        self.dom.borrow_mut().remove_from_parent(target.0);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        self.dom.borrow_mut().reparent_children(node.0, new_parent.0);
    }
}

impl Default for Handle {
    fn default() -> Self {
        Handle(DomId::DOCUMENT)
    }
}
