//! Document tree → HTML.
//!
//! The principal render target. Structural elements map back to their HTML
//! equivalents; HTML-origin attributes are emitted as plain attributes;
//! unexpanded placeholders and error markers render as classed spans so a
//! document always renders fully.

use crate::output::OutputConverter;
use crate::tree::{NodeData, NodeId, Ns, QName, Tree, escape_attr, escape_text};

/// Output converter for `text/html`.
#[derive(Debug, Default)]
pub struct HtmlSerializer;

impl OutputConverter for HtmlSerializer {
    fn serialize(&self, tree: &Tree) -> String {
        let mut out = String::new();
        render_children(tree, tree.body(), &mut out);
        out
    }
}

fn render_children(tree: &Tree, id: NodeId, out: &mut String) {
    for &child in tree.children(id) {
        render_node(tree, child, out);
    }
}

fn render_node(tree: &Tree, id: NodeId, out: &mut String) {
    let name = match tree.data(id) {
        NodeData::Text(text) => {
            out.push_str(&escape_text(text));
            return;
        }
        NodeData::Element { name, .. } => name,
    };

    if name.ns == Ns::XInclude && name.local == "include" {
        render_unexpanded_include(tree, id, out);
        return;
    }
    if name.ns != Ns::Page {
        render_children(tree, id, out);
        return;
    }

    match name.local.as_ref() {
        "p" | "strong" | "code" | "span" | "div" | "blockquote" | "u" | "ins" | "del" | "s"
        | "sub" | "sup" | "kbd" | "samp" | "table" => {
            simple_tag(tree, id, name.local.as_ref(), out);
        }
        "emphasis" => simple_tag(tree, id, "em", out),
        "quote" => simple_tag(tree, id, "q", out),
        "literal" => simple_tag(tree, id, "tt", out),
        "blockcode" => simple_tag(tree, id, "pre", out),
        "table-header" => simple_tag(tree, id, "thead", out),
        "table-body" => simple_tag(tree, id, "tbody", out),
        "table-row" => simple_tag(tree, id, "tr", out),
        "table-cell" => simple_tag(tree, id, "td", out),
        "table-cell-head" => simple_tag(tree, id, "th", out),
        "h" => {
            let level = tree
                .attr(id, &QName::page("outline-level"))
                .and_then(|v| v.parse::<u8>().ok())
                .unwrap_or(1)
                .clamp(1, 6);
            let tag = format!("h{level}");
            open_tag(tree, id, &tag, out);
            render_children(tree, id, out);
            close_tag(&tag, out);
        }
        "a" => {
            out.push_str("<a");
            if let Some(href) = tree.attr(id, &QName::xlink_href()) {
                out.push_str(&format!(" href=\"{}\"", escape_attr(href)));
            }
            push_common_attrs(tree, id, out);
            out.push('>');
            render_children(tree, id, out);
            close_tag("a", out);
        }
        "list" => render_list(tree, id, out),
        "separator" => {
            out.push_str("<hr");
            push_common_attrs(tree, id, out);
            out.push_str(" />");
        }
        "line-break" => out.push_str("<br />"),
        "object" => {
            out.push_str("<img");
            if let Some(src) = tree.attr(id, &QName::xlink_href()) {
                out.push_str(&format!(" src=\"{}\"", escape_attr(src)));
            }
            if let Some(alt) = tree.attr(id, &QName::html("alt")) {
                out.push_str(&format!(" alt=\"{}\"", escape_attr(alt)));
            }
            if let Some(title) = tree.attr(id, &QName::html("title")) {
                out.push_str(&format!(" title=\"{}\"", escape_attr(title)));
            }
            out.push_str(" />");
        }
        "error" => {
            out.push_str("<span class=\"moin-error\"");
            if let Some(reason) = tree.attr(id, &QName::page("reason")) {
                out.push_str(&format!(" title=\"{}\"", escape_attr(reason)));
            }
            out.push('>');
            render_children(tree, id, out);
            close_tag("span", out);
        }
        "macro" => {
            let name = tree
                .attr(id, &QName::page("macro-name"))
                .unwrap_or_default();
            out.push_str(&format!(
                "<span class=\"moin-macro\">{}</span>",
                escape_text(name)
            ));
        }
        // Forward-compatible degradation: unknown tags render their content.
        _ => render_children(tree, id, out),
    }
}

/// An unexpanded transclusion placeholder: visible, inert, inspectable.
fn render_unexpanded_include(tree: &Tree, id: NodeId, out: &mut String) {
    let href = tree
        .attr(id, &QName::xinclude_href())
        .unwrap_or_default();
    let label = tree
        .attr(id, &QName::html("alt"))
        .filter(|alt| !alt.is_empty())
        .unwrap_or(href);
    out.push_str(&format!(
        "<span class=\"moin-transclusion\" data-href=\"{}\">{}</span>",
        escape_attr(href),
        escape_text(label)
    ));
}

fn render_list(tree: &Tree, id: NodeId, out: &mut String) {
    let tag = match tree.attr(id, &QName::page("item-label-generate")) {
        Some("unordered") => "ul",
        Some("ordered") => "ol",
        _ => "dl",
    };
    open_tag(tree, id, tag, out);
    for &item in tree.children(id) {
        if !tree.is_page_element(item, "list-item") {
            continue;
        }
        for &part in tree.children(item) {
            if tree.is_page_element(part, "list-item-label") {
                out.push_str("<dt>");
                render_children(tree, part, out);
                close_tag("dt", out);
            } else if tree.is_page_element(part, "list-item-body") {
                let (open, close) = if tag == "dl" { ("dd", "dd") } else { ("li", "li") };
                out.push('<');
                out.push_str(open);
                out.push('>');
                render_children(tree, part, out);
                close_tag(close, out);
            }
        }
    }
    close_tag(tag, out);
}

fn simple_tag(tree: &Tree, id: NodeId, tag: &str, out: &mut String) {
    open_tag(tree, id, tag, out);
    render_children(tree, id, out);
    close_tag(tag, out);
}

fn open_tag(tree: &Tree, id: NodeId, tag: &str, out: &mut String) {
    out.push('<');
    out.push_str(tag);
    push_common_attrs(tree, id, out);
    out.push('>');
}

fn close_tag(tag: &str, out: &mut String) {
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Class, title and style survive into the output; structural and
/// HTML-origin values for the same attribute are merged.
fn push_common_attrs(tree: &Tree, id: NodeId, out: &mut String) {
    let page_class = tree.attr(id, &QName::page("class"));
    let html_class = tree.attr(id, &QName::html("class"));
    let class = match (page_class, html_class) {
        (Some(a), Some(b)) if a != b => Some(format!("{a} {b}")),
        (Some(a), _) => Some(a.to_string()),
        (None, Some(b)) => Some(b.to_string()),
        (None, None) => None,
    };
    if let Some(class) = class {
        out.push_str(&format!(" class=\"{}\"", escape_attr(&class)));
    }
    if let Some(title) = tree
        .attr(id, &QName::page("title"))
        .or_else(|| tree.attr(id, &QName::html("title")))
    {
        out.push_str(&format!(" title=\"{}\"", escape_attr(title)));
    }
    if let Some(style) = tree.attr(id, &QName::html("style")) {
        out.push_str(&format!(" style=\"{}\"", escape_attr(style)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputConverter, MarkdownConverter};
    use crate::options::ConvertOptions;

    fn render_markdown(input: &str) -> String {
        let tree = MarkdownConverter.convert(input, &ConvertOptions::default());
        HtmlSerializer.serialize(&tree)
    }

    #[test]
    fn test_paragraph_and_emphasis() {
        assert_eq!(render_markdown("*Hi*"), "<p><em>Hi</em></p>");
    }

    #[test]
    fn test_heading() {
        assert_eq!(render_markdown("## Two"), "<h2>Two</h2>");
    }

    #[test]
    fn test_list() {
        assert_eq!(
            render_markdown("* a\n* b"),
            "<ul><li>a</li><li>b</li></ul>"
        );
    }

    #[test]
    fn test_unexpanded_transclusion_is_inert() {
        assert_eq!(
            render_markdown("![Alt](someitem)"),
            "<p><span class=\"moin-transclusion\" \
             data-href=\"wiki.local:someitem\">Alt</span></p>"
        );
    }

    #[test]
    fn test_unknown_tag_renders_children() {
        let mut tree = Tree::new();
        let body = tree.body();
        let exotic = tree.append_element(body, QName::page("hologram"));
        tree.append_text(exotic, "content survives");
        assert_eq!(HtmlSerializer.serialize(&tree), "content survives");
    }

    #[test]
    fn test_error_marker_renders_visibly() {
        let mut tree = Tree::new();
        let body = tree.body();
        let p = tree.append_element(body, QName::page("p"));
        let err = tree.append_element(p, QName::page("error"));
        tree.append_text(err, "unknown macro: X");
        assert_eq!(
            HtmlSerializer.serialize(&tree),
            "<p><span class=\"moin-error\">unknown macro: X</span></p>"
        );
    }
}
