//! HTML → document tree.
//!
//! Parsing is delegated to html5ever (lenient, browser-grade recovery); the
//! mapping pass then walks the raw DOM and applies the tag mapping table.
//! Unsupported tags are dropped with their content, unknown tags are
//! unwrapped, and only the standard attributes survive, namespaced as
//! HTML-origin.

pub(crate) mod map;
mod sink;

pub(crate) use sink::{DomData, DomId, HtmlDom, parse_html};

use map::{ItemKind, TagClass, TablePart};

use crate::input::{InputConverter, Target};
use crate::options::ConvertOptions;
use crate::tree::{NodeId, QName, Tree};

/// Input converter for `text/html`.
#[derive(Debug, Default)]
pub struct HtmlConverter;

impl InputConverter for HtmlConverter {
    fn convert(&self, input: &str, _options: &ConvertOptions) -> Tree {
        let dom = parse_html(input);
        let mut tree = Tree::new();
        let body = tree.body();
        if let Some(dom_body) = dom.find_tag("body") {
            map_children(&dom, dom_body, &mut tree, body);
        }
        tree
    }
}

/// Map all children of a raw DOM node into the tree under `parent`.
pub(crate) fn map_children(dom: &HtmlDom, dom_node: DomId, tree: &mut Tree, parent: NodeId) {
    for &child in dom.children(dom_node) {
        map_node(dom, child, tree, parent);
    }
}

fn map_node(dom: &HtmlDom, dom_node: DomId, tree: &mut Tree, parent: NodeId) {
    match dom.data(dom_node) {
        DomData::Ignored | DomData::Document => {}
        DomData::Text(text) => {
            if !(text.trim().is_empty() && is_structural_container(tree, parent)) {
                tree.append_text(parent, text);
            }
        }
        DomData::Element { .. } => {
            let tag = dom.tag_name(dom_node).unwrap_or_default();
            map_element(dom, dom_node, &tag, tree, parent);
        }
    }
}

fn map_element(dom: &HtmlDom, dom_node: DomId, tag: &str, tree: &mut Tree, parent: NodeId) {
    match map::classify(tag) {
        TagClass::Drop => {}
        TagClass::Unwrap => map_children(dom, dom_node, tree, parent),
        TagClass::LineBreak => {
            tree.append_element(parent, QName::page("line-break"));
        }
        TagClass::Separator => {
            let sep = tree.append_element(parent, QName::page("separator"));
            tree.set_attr(sep, QName::html("class"), "moin-hr3");
        }
        TagClass::Inline(spec) | TagClass::Block(spec) => {
            let id = tree.append_element(parent, spec.element_name());
            if let Some(html_tag) = spec.html_tag {
                tree.set_attr(id, QName::page("html-tag"), html_tag);
            }
            if let Some(class) = spec.class {
                tree.set_attr(id, QName::html("class"), class);
            }
            copy_standard_attrs(dom, dom_node, tree, id);
            map_children(dom, dom_node, tree, id);
        }
        TagClass::Link => {
            let id = tree.append_element(parent, QName::page("a"));
            if let Some(href) = dom.attr(dom_node, "href") {
                tree.set_attr(id, QName::xlink_href(), Target::classify(href).href());
            }
            copy_standard_attrs(dom, dom_node, tree, id);
            map_children(dom, dom_node, tree, id);
        }
        TagClass::Image => {
            let src = dom.attr(dom_node, "src").unwrap_or_default();
            let alt = dom.attr(dom_node, "alt").unwrap_or_default();
            match Target::classify(src) {
                Target::External(url) => {
                    let id = tree.append_element(parent, QName::page("object"));
                    if !alt.is_empty() {
                        tree.set_attr(id, QName::html("alt"), alt);
                    }
                    if let Some(title) = dom.attr(dom_node, "title") {
                        tree.set_attr(id, QName::html("title"), title);
                    }
                    tree.set_attr(id, QName::xlink_href(), url);
                }
                Target::WikiLocal(href) => {
                    let id = tree.append_element(parent, QName::xinclude_include());
                    if !alt.is_empty() {
                        tree.set_attr(id, QName::html("alt"), alt);
                    }
                    if let Some(title) = dom.attr(dom_node, "title") {
                        tree.set_attr(id, QName::html("title"), title);
                    }
                    tree.set_attr(id, QName::xinclude_href(), href);
                }
            }
        }
        TagClass::Heading(level) => {
            let id = tree.append_element(parent, QName::page("h"));
            tree.set_attr(id, QName::page("outline-level"), level.to_string());
            copy_standard_attrs(dom, dom_node, tree, id);
            map_children(dom, dom_node, tree, id);
        }
        TagClass::List(kind) => {
            let id = tree.append_element(parent, QName::page("list"));
            if let Some(generate) = kind.label_generate() {
                tree.set_attr(id, QName::page("item-label-generate"), generate);
            }
            copy_standard_attrs(dom, dom_node, tree, id);
            map_children(dom, dom_node, tree, id);
        }
        TagClass::ListItem(kind) => {
            // A stray item outside a list is unwrapped like any unknown tag.
            if !tree.is_page_element(parent, "list") {
                map_children(dom, dom_node, tree, parent);
                return;
            }
            let item = tree.append_element(parent, QName::page("list-item"));
            let inner = match kind {
                ItemKind::Body => tree.append_element(item, QName::page("list-item-body")),
                ItemKind::Label => tree.append_element(item, QName::page("list-item-label")),
            };
            map_children(dom, dom_node, tree, inner);
        }
        TagClass::Table(part) => {
            let id = tree.append_element(parent, part.element_name());
            if part == TablePart::Table {
                copy_standard_attrs(dom, dom_node, tree, id);
            }
            map_children(dom, dom_node, tree, id);
        }
    }
}

/// Keep `title`, `class`, `style` and `alt`, moved into the HTML-origin
/// namespace. A class fixed by the mapping table wins over the source class.
fn copy_standard_attrs(dom: &HtmlDom, dom_node: DomId, tree: &mut Tree, id: NodeId) {
    for &attr in map::STANDARD_ATTRS {
        if let Some(value) = dom.attr(dom_node, attr)
            && tree.attr(id, &QName::html(attr)).is_none()
        {
            tree.set_attr(id, QName::html(attr), value);
        }
    }
}

/// Containers where whitespace-only text between children is formatting
/// noise, not content.
fn is_structural_container(tree: &Tree, id: NodeId) -> bool {
    tree.name(id).is_some_and(|name| {
        name.ns == crate::tree::Ns::Page
            && matches!(
                name.local.as_ref(),
                "page"
                    | "body"
                    | "list"
                    | "list-item"
                    | "table"
                    | "table-header"
                    | "table-body"
                    | "table-row"
                    | "blockquote"
                    | "div"
            )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ConvertOptions;

    fn convert(input: &str) -> String {
        let tree = HtmlConverter.convert(input, &ConvertOptions::default());
        tree.to_xml_string()
    }

    fn body(inner: &str) -> String {
        format!("<page><body>{inner}</body></page>")
    }

    #[test]
    fn test_inline_mapping() {
        assert_eq!(convert("<p><em>Emphasis</em></p>"), body("<p><emphasis>Emphasis</emphasis></p>"));
        assert_eq!(
            convert("<p><i>voice</i></p>"),
            body("<p><emphasis html-tag=\"i\">voice</emphasis></p>")
        );
        assert_eq!(convert("<p><tt>literal</tt></p>"), body("<p><literal>literal</literal></p>"));
    }

    #[test]
    fn test_ignored_tag_drops_content() {
        assert_eq!(convert("<p>keep<button>Stop</button></p>"), body("<p>keep</p>"));
    }

    #[test]
    fn test_unknown_tag_unwraps() {
        assert_eq!(convert("<p><custom>kept</custom></p>"), body("<p>kept</p>"));
    }

    #[test]
    fn test_local_link_demoted() {
        assert_eq!(
            convert("<p><a href=\"subitem\">link text</a></p>"),
            body("<p><a xlink:href=\"wiki.local:subitem\">link text</a></p>")
        );
    }

    #[test]
    fn test_heading_level() {
        assert_eq!(
            convert("<h2>Title</h2>"),
            body("<h outline-level=\"2\">Title</h>")
        );
    }

    #[test]
    fn test_list_structure() {
        assert_eq!(
            convert("<ul><li>One</li><li>Two</li></ul>"),
            body(
                "<list item-label-generate=\"unordered\">\
                 <list-item><list-item-body>One</list-item-body></list-item>\
                 <list-item><list-item-body>Two</list-item-body></list-item></list>"
            )
        );
    }

    #[test]
    fn test_standard_attrs_kept() {
        assert_eq!(
            convert("<p><del class=\"red\">deleted</del></p>"),
            body("<p><del html:class=\"red\">deleted</del></p>")
        );
    }
}
