//! Document tree → DocBook 5 article.
//!
//! Covers the block/inline vocabulary this tree model produces; headings
//! render as `bridgehead` elements rather than nested sections, which keeps
//! the serializer a pure, local function of the tree. Tables use the
//! HTML-style table model DocBook 5 allows.

use crate::output::OutputConverter;
use crate::tree::{NodeData, NodeId, Ns, QName, Tree, escape_text};

const ARTICLE_OPEN: &str = "<article xmlns=\"http://docbook.org/ns/docbook\" \
                            xmlns:xlink=\"http://www.w3.org/1999/xlink\" version=\"5.0\">";

/// Output converter for `application/docbook+xml`.
#[derive(Debug, Default)]
pub struct DocBookSerializer;

impl OutputConverter for DocBookSerializer {
    fn serialize(&self, tree: &Tree) -> String {
        let mut out = String::from(ARTICLE_OPEN);
        render_children(tree, tree.body(), &mut out);
        out.push_str("</article>");
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
    if name.ns != Ns::Page {
        // Unexpanded placeholders and foreign elements keep their content.
        render_children(tree, id, out);
        return;
    }
    match name.local.as_ref() {
        "p" => wrap(tree, id, "para", out),
        "emphasis" => wrap(tree, id, "emphasis", out),
        "strong" => {
            out.push_str("<emphasis role=\"strong\">");
            render_children(tree, id, out);
            out.push_str("</emphasis>");
        }
        "code" | "literal" | "kbd" | "samp" => wrap(tree, id, "literal", out),
        "blockcode" => wrap(tree, id, "programlisting", out),
        "blockquote" => wrap(tree, id, "blockquote", out),
        "quote" => wrap(tree, id, "quote", out),
        "sub" => wrap(tree, id, "subscript", out),
        "sup" => wrap(tree, id, "superscript", out),
        "h" => {
            let level = tree
                .attr(id, &QName::page("outline-level"))
                .and_then(|v| v.parse::<u8>().ok())
                .unwrap_or(1)
                .clamp(1, 5);
            out.push_str(&format!("<bridgehead renderas=\"sect{level}\">"));
            render_children(tree, id, out);
            out.push_str("</bridgehead>");
        }
        "a" => {
            match tree.attr(id, &QName::xlink_href()) {
                Some(href) => {
                    out.push_str(&format!(
                        "<link xlink:href=\"{}\">",
                        crate::tree::escape_text(href)
                    ));
                    render_children(tree, id, out);
                    out.push_str("</link>");
                }
                None => render_children(tree, id, out),
            }
        }
        "list" => {
            let tag = match tree.attr(id, &QName::page("item-label-generate")) {
                Some("ordered") => "orderedlist",
                Some("unordered") => "itemizedlist",
                _ => "variablelist",
            };
            out.push_str(&format!("<{tag}>"));
            render_list_items(tree, id, tag, out);
            out.push_str(&format!("</{tag}>"));
        }
        "table" => wrap(tree, id, "informaltable", out),
        "table-header" => wrap(tree, id, "thead", out),
        "table-body" => wrap(tree, id, "tbody", out),
        "table-row" => wrap(tree, id, "tr", out),
        "table-cell" => wrap(tree, id, "td", out),
        "table-cell-head" => wrap(tree, id, "th", out),
        "separator" => {}
        "line-break" => out.push(' '),
        "object" => {
            if let Some(href) = tree.attr(id, &QName::xlink_href()) {
                out.push_str(&format!(
                    "<inlinemediaobject><imageobject>\
                     <imagedata fileref=\"{}\" /></imageobject></inlinemediaobject>",
                    escape_text(href)
                ));
            }
        }
        "error" => {
            out.push_str("<emphasis role=\"error\">");
            render_children(tree, id, out);
            if tree.children(id).is_empty()
                && let Some(reason) = tree.attr(id, &QName::page("reason"))
            {
                out.push_str(&escape_text(reason));
            }
            out.push_str("</emphasis>");
        }
        _ => render_children(tree, id, out),
    }
}

fn render_list_items(tree: &Tree, id: NodeId, list_tag: &str, out: &mut String) {
    for &item in tree.children(id) {
        if !tree.is_page_element(item, "list-item") {
            continue;
        }
        if list_tag == "variablelist" {
            out.push_str("<varlistentry>");
            for &part in tree.children(item) {
                if tree.is_page_element(part, "list-item-label") {
                    out.push_str("<term>");
                    render_children(tree, part, out);
                    out.push_str("</term>");
                } else if tree.is_page_element(part, "list-item-body") {
                    out.push_str("<listitem>");
                    render_item_body(tree, part, out);
                    out.push_str("</listitem>");
                }
            }
            out.push_str("</varlistentry>");
        } else {
            out.push_str("<listitem>");
            for &part in tree.children(item) {
                if tree.is_page_element(part, "list-item-body") {
                    render_item_body(tree, part, out);
                }
            }
            out.push_str("</listitem>");
        }
    }
}

/// DocBook list items require block content; bare inline runs get a `para`.
fn render_item_body(tree: &Tree, body: NodeId, out: &mut String) {
    let has_block = tree.children(body).iter().any(|&c| {
        tree.name(c).is_some_and(|n| {
            n.ns == Ns::Page && matches!(n.local.as_ref(), "p" | "list" | "table" | "blockcode")
        })
    });
    if has_block {
        render_children(tree, body, out);
        return;
    }
    out.push_str("<para>");
    render_children(tree, body, out);
    out.push_str("</para>");
}

fn wrap(tree: &Tree, id: NodeId, tag: &str, out: &mut String) {
    out.push_str(&format!("<{tag}>"));
    render_children(tree, id, out);
    out.push_str(&format!("</{tag}>"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputConverter, MarkdownConverter};
    use crate::options::ConvertOptions;

    fn convert(input: &str) -> String {
        let tree = MarkdownConverter.convert(input, &ConvertOptions::default());
        DocBookSerializer.serialize(&tree)
    }

    #[test]
    fn test_paragraph() {
        assert_eq!(
            convert("Text"),
            format!("{ARTICLE_OPEN}<para>Text</para></article>")
        );
    }

    #[test]
    fn test_strong_role() {
        assert_eq!(
            convert("**Strong**"),
            format!("{ARTICLE_OPEN}<para><emphasis role=\"strong\">Strong</emphasis></para></article>")
        );
    }

    #[test]
    fn test_list_items_get_para() {
        assert_eq!(
            convert("* Item"),
            format!(
                "{ARTICLE_OPEN}<itemizedlist><listitem><para>Item</para></listitem>\
                 </itemizedlist></article>"
            )
        );
    }

    #[test]
    fn test_mixed_item_lists_nested_content() {
        let out = convert("* Item 1\n    * Item 1.2\n* Item 2");
        assert!(out.contains("<itemizedlist><listitem>"));
        assert!(out.contains("Item 1.2"));
    }
}
