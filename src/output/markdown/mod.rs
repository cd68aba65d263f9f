//! Document tree → Markdown.
//!
//! The round-trip partner of the Markdown input converter: serializing a
//! tree and reparsing the result yields a structurally equal tree for the
//! representable subset. Blocks are rendered independently and joined with
//! blank lines; nesting (list bodies, admonitions, quotes) indents or
//! prefixes the inner block text.

mod escape;

pub use escape::escape_markdown;
use escape::escape_cell;

use percent_encoding::percent_decode_str;

use crate::output::OutputConverter;
use crate::tree::{LOCAL_SCHEME, NodeData, NodeId, Ns, QName, Tree};

/// Output converter for `text/x-markdown`.
#[derive(Debug, Default)]
pub struct MarkdownSerializer;

impl OutputConverter for MarkdownSerializer {
    fn serialize(&self, tree: &Tree) -> String {
        let blocks = render_blocks(tree, tree.body());
        let mut out = blocks.join("\n\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

fn is_block_element(tree: &Tree, id: NodeId) -> bool {
    tree.name(id).is_some_and(|name| {
        name.ns == Ns::Page
            && matches!(
                name.local.as_ref(),
                "p" | "list"
                    | "table"
                    | "blockcode"
                    | "div"
                    | "blockquote"
                    | "separator"
                    | "h"
                    | "table-header"
                    | "table-body"
                    | "table-row"
            )
    })
}

/// Render each block-level child of `id` to its own string.
fn render_blocks(tree: &Tree, id: NodeId) -> Vec<String> {
    let mut blocks: Vec<String> = Vec::new();
    let mut inline_run: Vec<NodeId> = Vec::new();
    for &child in tree.children(id) {
        if is_block_element(tree, child) {
            flush_inline_run(tree, &mut inline_run, &mut blocks);
            if let Some(block) = render_block(tree, child) {
                blocks.push(block);
            }
        } else {
            inline_run.push(child);
        }
    }
    flush_inline_run(tree, &mut inline_run, &mut blocks);
    blocks
}

/// Stray inline content between blocks renders as a paragraph of its own.
fn flush_inline_run(tree: &Tree, run: &mut Vec<NodeId>, blocks: &mut Vec<String>) {
    if run.is_empty() {
        return;
    }
    let mut text = String::new();
    for &node in run.iter() {
        render_inline(tree, node, &mut text);
    }
    run.clear();
    let trimmed = text.trim_matches('\n');
    if !trimmed.is_empty() {
        blocks.push(trimmed.to_string());
    }
}

fn render_block(tree: &Tree, id: NodeId) -> Option<String> {
    let name = tree.name(id)?;
    match name.local.as_ref() {
        "p" => {
            let mut out = String::new();
            render_inline_children(tree, id, &mut out);
            Some(out)
        }
        "h" => {
            let level = tree
                .attr(id, &QName::page("outline-level"))
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(1)
                .clamp(1, 6);
            let mut out = "#".repeat(level);
            out.push(' ');
            render_inline_children(tree, id, &mut out);
            Some(out)
        }
        "separator" => Some("----".to_string()),
        "blockcode" => {
            let content = tree.text_content(id);
            let fence = "`".repeat(fence_length(&content));
            Some(format!("{fence}\n{content}\n{fence}"))
        }
        "blockquote" => {
            let inner = render_blocks(tree, id).join("\n\n");
            Some(prefix_lines(&inner, "> "))
        }
        "list" => Some(render_list(tree, id)),
        "table" => Some(render_table(tree, id)),
        "div" => Some(render_div(tree, id)),
        _ => {
            // Unknown blocks degrade to their content.
            let blocks = render_blocks(tree, id);
            if blocks.is_empty() {
                None
            } else {
                Some(blocks.join("\n\n"))
            }
        }
    }
}

fn render_div(tree: &Tree, id: NodeId) -> String {
    let class = tree.attr(id, &QName::page("class")).unwrap_or_default();
    if let Some(kinds) = class.strip_prefix("admonition ") {
        return render_admonition(tree, id, kinds);
    }
    if let Some(tag) = tree.attr(id, &QName::page("html-tag")) {
        // HTML-origin container: pass it back through as raw HTML.
        let mut inner = String::new();
        render_inline_children(tree, id, &mut inner);
        return format!("<{tag}>{inner}</{tag}>");
    }
    render_blocks(tree, id).join("\n\n")
}

fn render_admonition(tree: &Tree, id: NodeId, kinds: &str) -> String {
    let mut title: Option<String> = None;
    let mut content_blocks: Vec<String> = Vec::new();
    for &child in tree.children(id) {
        if tree.is_page_element(child, "p")
            && tree.attr(child, &QName::page("class")) == Some("admonition-title")
        {
            title = Some(tree.text_content(child));
        } else if let Some(block) = render_block(tree, child) {
            content_blocks.push(block);
        }
    }
    let default_title = kinds
        .split_whitespace()
        .next()
        .map(|first| {
            let mut chars = first.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .unwrap_or_default();
    let header = match &title {
        Some(text) if *text == default_title => format!("!!! {kinds}"),
        Some(text) => format!("!!! {kinds} \"{text}\""),
        None => format!("!!! {kinds} \"\""),
    };
    let body = content_blocks.join("\n\n");
    if body.is_empty() {
        header
    } else {
        format!("{header}\n{}", prefix_lines(&body, "    "))
    }
}

fn render_list(tree: &Tree, id: NodeId) -> String {
    let generate = tree.attr(id, &QName::page("item-label-generate"));
    let ordered = generate == Some("ordered");
    let definition = generate.is_none();
    let mut out: Vec<String> = Vec::new();
    let mut counter = 0usize;
    for &item in tree.children(id) {
        if !tree.is_page_element(item, "list-item") {
            continue;
        }
        for &part in tree.children(item) {
            if tree.is_page_element(part, "list-item-label") {
                let mut label = String::new();
                render_inline_children(tree, part, &mut label);
                out.push(label);
            } else if tree.is_page_element(part, "list-item-body") {
                counter += 1;
                if definition {
                    out.push(render_item_body(tree, part, ":   ", "    "));
                } else if ordered {
                    let marker = format!("{counter}. ");
                    out.push(render_item_body(tree, part, &marker, "    "));
                } else {
                    out.push(render_item_body(tree, part, "* ", "    "));
                }
            }
        }
    }
    out.join("\n")
}

/// Render a list item body: the first content group shares the marker line,
/// later blocks are indented underneath it.
fn render_item_body(tree: &Tree, body: NodeId, marker: &str, indent: &str) -> String {
    let mut groups: Vec<String> = Vec::new();
    let mut inline_run: Vec<NodeId> = Vec::new();
    for &child in tree.children(body) {
        if is_block_element(tree, child) {
            flush_inline_run(tree, &mut inline_run, &mut groups);
            if let Some(block) = render_block(tree, child) {
                groups.push(block);
            }
        } else {
            inline_run.push(child);
        }
    }
    flush_inline_run(tree, &mut inline_run, &mut groups);

    let mut out = String::new();
    out.push_str(marker);
    let mut first = true;
    for group in groups {
        if first {
            // Continuation lines of the first group need the indent too.
            let mut lines = group.lines();
            if let Some(head) = lines.next() {
                out.push_str(head);
            }
            for line in lines {
                out.push('\n');
                out.push_str(indent);
                out.push_str(line);
            }
            first = false;
        } else {
            out.push('\n');
            out.push_str(&prefix_lines(&group, indent));
        }
    }
    out
}

fn render_table(tree: &Tree, id: NodeId) -> String {
    let mut header_rows: Vec<Vec<String>> = Vec::new();
    let mut body_rows: Vec<Vec<String>> = Vec::new();
    for &section in tree.children(id) {
        let is_header = tree.is_page_element(section, "table-header");
        let rows = if is_header {
            &mut header_rows
        } else {
            &mut body_rows
        };
        for &row in tree.children(section) {
            if !tree.is_page_element(row, "table-row") {
                continue;
            }
            let mut cells: Vec<String> = Vec::new();
            for &cell in tree.children(row) {
                let mut text = String::new();
                render_inline_children(tree, cell, &mut text);
                cells.push(escape_cell(&text).trim().to_string());
            }
            rows.push(cells);
        }
    }
    let columns = header_rows
        .iter()
        .chain(body_rows.iter())
        .map(Vec::len)
        .max()
        .unwrap_or(0);
    let mut lines: Vec<String> = Vec::new();
    for row in &header_rows {
        lines.push(row.join(" | "));
    }
    if !header_rows.is_empty() {
        lines.push(vec!["---"; columns].join(" | "));
    }
    for row in &body_rows {
        lines.push(row.join(" | "));
    }
    lines.join("\n")
}

fn render_inline_children(tree: &Tree, id: NodeId, out: &mut String) {
    for &child in tree.children(id) {
        render_inline(tree, child, out);
    }
}

fn render_inline(tree: &Tree, id: NodeId, out: &mut String) {
    let name = match tree.data(id) {
        NodeData::Text(text) => {
            out.push_str(&escape_markdown(text));
            return;
        }
        NodeData::Element { name, .. } => name.clone(),
    };

    if name.ns == Ns::XInclude && name.local == "include" {
        let href = tree
            .attr(id, &QName::xinclude_href())
            .unwrap_or_default();
        let target = local_reference(href);
        let alt = tree.attr(id, &QName::html("alt")).unwrap_or_default();
        match tree.attr(id, &QName::html("title")) {
            Some(title) => out.push_str(&format!("![{alt}]({target} \"{title}\")")),
            None => out.push_str(&format!("![{alt}]({target})")),
        }
        return;
    }
    if name.ns != Ns::Page {
        render_inline_children(tree, id, out);
        return;
    }

    match name.local.as_ref() {
        "emphasis" | "strong" => render_emphasis(tree, id, name.local.as_ref(), out),
        "code" => {
            let content = tree.text_content(id);
            let ticks = "`".repeat(inline_code_ticks(&content));
            out.push_str(&format!("{ticks}{content}{ticks}"));
        }
        "a" => render_link(tree, id, out),
        "object" => {
            let href = tree.attr(id, &QName::xlink_href()).unwrap_or_default();
            let alt = tree.attr(id, &QName::html("alt")).unwrap_or_default();
            out.push_str(&format!("![{alt}]({href})"));
        }
        // `<br />` reparses to a line-break wherever it sits; a two-space
        // break would fold into the following text's newline.
        "line-break" => out.push_str("<br />"),
        "span" => render_span(tree, id, out),
        "quote" => render_html_inline(tree, id, "q", out),
        "literal" => render_html_inline(tree, id, "tt", out),
        "u" | "ins" | "del" | "s" | "sub" | "sup" | "kbd" | "samp" => {
            render_html_inline(tree, id, &name.local.clone(), out);
        }
        "error" => {
            out.push_str("<span class=\"moin-error\">");
            render_inline_children(tree, id, out);
            if tree.children(id).is_empty()
                && let Some(reason) = tree.attr(id, &QName::page("reason"))
            {
                out.push_str(&escape_markdown(reason));
            }
            out.push_str("</span>");
        }
        _ => render_inline_children(tree, id, out),
    }
}

/// Emphasis renders with `_`, strong with `**`, so nesting either way
/// reparses with the same structure. The original `<i>`/`<b>` survive as
/// inline HTML.
fn render_emphasis(tree: &Tree, id: NodeId, kind: &str, out: &mut String) {
    if let Some(tag) = tree.attr(id, &QName::page("html-tag")) {
        let tag = tag.to_string();
        render_html_inline(tree, id, &tag, out);
        return;
    }
    let marker = if kind == "strong" { "**" } else { "_" };
    out.push_str(marker);
    render_inline_children(tree, id, out);
    out.push_str(marker);
}

fn render_span(tree: &Tree, id: NodeId, out: &mut String) {
    if tree.attr(id, &QName::html("class")) == Some("moin-big") {
        render_html_inline_tagless(tree, id, "big", out);
        return;
    }
    if let Some(tag) = tree.attr(id, &QName::page("html-tag")) {
        let tag = tag.to_string();
        render_html_inline(tree, id, &tag, out);
        return;
    }
    render_html_inline(tree, id, "span", out);
}

/// Inline HTML passthrough, carrying the standard attributes back out.
fn render_html_inline(tree: &Tree, id: NodeId, tag: &str, out: &mut String) {
    out.push('<');
    out.push_str(tag);
    for attr in ["class", "title", "style", "alt"] {
        if let Some(value) = tree.attr(id, &QName::html(attr)) {
            out.push_str(&format!(" {attr}=\"{value}\""));
        }
    }
    out.push('>');
    render_inline_children(tree, id, out);
    out.push_str(&format!("</{tag}>"));
}

/// Like [`render_html_inline`] but suppressing the class the mapping table
/// fixed (`moin-big` is implied by `<big>`).
fn render_html_inline_tagless(tree: &Tree, id: NodeId, tag: &str, out: &mut String) {
    out.push('<');
    out.push_str(tag);
    for attr in ["title", "style", "alt"] {
        if let Some(value) = tree.attr(id, &QName::html(attr)) {
            out.push_str(&format!(" {attr}=\"{value}\""));
        }
    }
    out.push('>');
    render_inline_children(tree, id, out);
    out.push_str(&format!("</{tag}>"));
}

fn render_link(tree: &Tree, id: NodeId, out: &mut String) {
    let href = tree.attr(id, &QName::xlink_href()).unwrap_or_default();
    let title = tree.attr(id, &QName::page("title"));
    let label_text = tree.text_content(id);
    let is_local = href.starts_with(LOCAL_SCHEME);
    let target = local_reference(href);

    if is_local && title.is_none() {
        // Wikilink shape: the label is the target's last path segment.
        let last_segment = target.rsplit('/').next().unwrap_or(&target);
        if label_text == last_segment {
            out.push_str(&format!("[[{target}]]"));
            return;
        }
    }
    if !is_local && title.is_none() && label_text == href && !href.contains(' ') {
        out.push_str(&format!("<{href}>"));
        return;
    }
    let mut label = String::new();
    render_inline_children(tree, id, &mut label);
    match title {
        Some(title) => out.push_str(&format!("[{label}]({target} \"{title}\")")),
        None => out.push_str(&format!("[{label}]({target})")),
    }
}

/// Decode a `wiki.local:` href back to its readable reference; absolute
/// references pass through.
fn local_reference(href: &str) -> String {
    match href.strip_prefix(LOCAL_SCHEME) {
        Some(local) => percent_decode_str(local).decode_utf8_lossy().to_string(),
        None => href.to_string(),
    }
}

fn prefix_lines(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                prefix.trim_end().to_string()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Backtick count needed to fence `content` as an inline code span.
fn inline_code_ticks(content: &str) -> usize {
    let mut max_run = 0;
    let mut run = 0;
    for c in content.chars() {
        if c == '`' {
            run += 1;
            max_run = max_run.max(run);
        } else {
            run = 0;
        }
    }
    max_run + 1
}

/// Backtick count needed to fence `content` as a code block.
fn fence_length(content: &str) -> usize {
    let mut max_run = 0;
    for line in content.lines() {
        let run = line.trim().chars().take_while(|&c| c == '`').count();
        max_run = max_run.max(run);
    }
    (max_run + 1).max(3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputConverter, MarkdownConverter};
    use crate::options::ConvertOptions;
    use crate::output::OutputConverter;

    fn roundtrip(input: &str) -> String {
        let options = ConvertOptions::default();
        let tree = MarkdownConverter.convert(input, &options);
        MarkdownSerializer.serialize(&tree)
    }

    #[test]
    fn test_paragraph_roundtrip() {
        assert_eq!(roundtrip("Text"), "Text\n");
    }

    #[test]
    fn test_emphasis_markers() {
        assert_eq!(roundtrip("*Emphasis*"), "_Emphasis_\n");
        assert_eq!(roundtrip("**Strong**"), "**Strong**\n");
        assert_eq!(roundtrip("_**Both**_"), "_**Both**_\n");
    }

    #[test]
    fn test_list_rendering() {
        assert_eq!(
            roundtrip("* Item 1\n    * Item 1.2\n* Item 2"),
            "* Item 1\n    * Item 1.2\n* Item 2\n"
        );
    }

    #[test]
    fn test_wikilink_shape_restored() {
        assert_eq!(roundtrip("[[Main/sub]]"), "[[Main/sub]]\n");
    }

    #[test]
    fn test_heading() {
        assert_eq!(roundtrip("## Two"), "## Two\n");
    }

    #[test]
    fn test_separator() {
        assert_eq!(roundtrip("----"), "----\n");
    }

    #[test]
    fn test_inline_code_ticks() {
        assert_eq!(inline_code_ticks("plain"), 1);
        assert_eq!(inline_code_ticks("a`b"), 2);
    }
}
