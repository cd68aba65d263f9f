//! Markdown → document tree.
//!
//! A two-phase parser. Phase 1 (this module) splits the input into
//! block-level constructs using blank-line and indentation/marker rules:
//! paragraphs, headings, lists, code blocks, tables, admonitions, thematic
//! breaks and embedded block-level HTML. Phase 2 (the [`inline`] scanner)
//! runs over each block's text run.
//!
//! The converter is total: malformed constructs degrade to literal text and
//! parsing continues. No link resolution or macro expansion happens here;
//! only `wiki.local:` references and transclusion placeholders are emitted.

mod inline;

pub(crate) use inline::scan_inline;

use crate::input::InputConverter;
use crate::input::html::{map_children, parse_html};
use crate::options::ConvertOptions;
use crate::tree::{NodeId, QName, Tree};

/// Input converter for `text/x-markdown`.
#[derive(Debug, Default)]
pub struct MarkdownConverter;

impl InputConverter for MarkdownConverter {
    fn convert(&self, input: &str, options: &ConvertOptions) -> Tree {
        let mut tree = Tree::new();
        let body = tree.body();
        let normalized = input.replace("\r\n", "\n").replace('\t', "    ");
        let lines: Vec<&str> = normalized.split('\n').collect();
        let mut parser = BlockParser {
            tree: &mut tree,
            options,
        };
        parser.parse_blocks(&lines, body);
        tree
    }
}

struct BlockParser<'a> {
    tree: &'a mut Tree,
    options: &'a ConvertOptions,
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// A recognized list-item marker line.
struct ListMarker {
    indent: usize,
    ordered: bool,
    /// Byte offset of the item text after the marker and its whitespace.
    content_start: usize,
}

fn list_marker(line: &str) -> Option<ListMarker> {
    let indent = indent_of(line);
    let rest = &line[indent..];
    let (marker_len, ordered) = if rest.starts_with(['*', '-', '+']) {
        (1, false)
    } else {
        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 || digits > 9 || !rest[digits..].starts_with('.') {
            return None;
        }
        (digits + 1, true)
    };
    let after = &rest[marker_len..];
    let spaces = after.len() - after.trim_start_matches(' ').len();
    if spaces == 0 {
        return None;
    }
    Some(ListMarker {
        indent,
        ordered,
        content_start: indent + marker_len + spaces,
    })
}

/// Three or more `-`/`*`/`_` alone on a line (possibly space-separated).
fn is_thematic_break(line: &str) -> bool {
    let trimmed = line.trim();
    let Some(marker) = trimmed.chars().next() else {
        return false;
    };
    if !matches!(marker, '-' | '*' | '_') {
        return false;
    }
    let mut count = 0;
    for c in trimmed.chars() {
        if c == marker {
            count += 1;
        } else if c != ' ' {
            return false;
        }
    }
    count >= 3
}

fn is_atx_heading(line: &str) -> bool {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    (1..=6).contains(&hashes) && trimmed[hashes..].starts_with(' ')
}

/// A table separator row: pipes, dashes, colons and spaces with at least one
/// dash.
fn is_table_separator(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && trimmed.contains('-')
        && trimmed.chars().all(|c| matches!(c, '-' | ':' | '|' | ' '))
}

fn fence_open(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim_start();
    if indent_of(line) > 3 {
        return None;
    }
    for marker in ['`', '~'] {
        let count = trimmed.chars().take_while(|&c| c == marker).count();
        if count >= 3 {
            return Some((marker, count));
        }
    }
    None
}

/// Opening line of a block-level HTML chunk; returns the tag name.
fn html_block_start(line: &str) -> Option<String> {
    let trimmed = line.trim_start();
    if indent_of(line) > 3 || !trimmed.starts_with('<') {
        return None;
    }
    let name: String = trimmed[1..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    if name.is_empty() {
        return None;
    }
    let lower = name.to_ascii_lowercase();
    crate::input::html::map::is_block_tag(&lower).then_some(lower)
}

impl BlockParser<'_> {
    fn parse_blocks(&mut self, lines: &[&str], parent: NodeId) {
        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];
            if is_blank(line) {
                i += 1;
            } else if self.options.extensions.fenced_code && fence_open(line).is_some() {
                i = self.parse_fenced_code(lines, i, parent);
            } else if is_thematic_break(line) {
                let sep = self.tree.append_element(parent, QName::page("separator"));
                self.tree.set_attr(sep, QName::page("class"), "moin-hr3");
                i += 1;
            } else if is_atx_heading(line) {
                self.parse_atx_heading(line, parent);
                i += 1;
            } else if self.options.extensions.admonitions && line.starts_with("!!!") {
                i = self.parse_admonition(lines, i, parent);
            } else if let Some(tag) = html_block_start(line) {
                i = self.parse_html_block(lines, i, &tag, parent);
            } else if indent_of(line) < 4 && line.trim_start().starts_with('>') {
                i = self.parse_blockquote(lines, i, parent);
            } else if indent_of(line) >= 4 {
                i = self.parse_indented_code(lines, i, parent);
            } else if list_marker(line).is_some() {
                i = self.parse_list(lines, i, parent);
            } else if self.options.extensions.tables
                && line.contains('|')
                && i + 1 < lines.len()
                && is_table_separator(lines[i + 1])
                && lines[i + 1].contains('|')
            {
                i = self.parse_table(lines, i, parent);
            } else if self.options.extensions.definition_lists
                && i + 1 < lines.len()
                && definition_start(lines[i + 1]).is_some()
                && definition_start(line).is_none()
            {
                i = self.parse_definition_list(lines, i, parent);
            } else {
                i = self.parse_paragraph(lines, i, parent);
            }
        }
    }

    fn parse_atx_heading(&mut self, line: &str, parent: NodeId) {
        let trimmed = line.trim_start();
        let level = trimmed.chars().take_while(|&c| c == '#').count();
        let text = trimmed[level..].trim().trim_end_matches('#').trim_end();
        let h = self.tree.append_element(parent, QName::page("h"));
        self.tree
            .set_attr(h, QName::page("outline-level"), level.to_string());
        scan_inline(self.tree, h, text, self.options);
    }

    fn parse_fenced_code(&mut self, lines: &[&str], start: usize, parent: NodeId) -> usize {
        let (marker, open_len) = fence_open(lines[start]).expect("caller checked fence");
        let mut i = start + 1;
        let mut content: Vec<&str> = Vec::new();
        while i < lines.len() {
            let trimmed = lines[i].trim();
            let closing = trimmed.chars().take_while(|&c| c == marker).count();
            if closing >= open_len && trimmed.chars().all(|c| c == marker) {
                i += 1;
                break;
            }
            content.push(lines[i]);
            i += 1;
        }
        let code = self.tree.append_element(parent, QName::page("blockcode"));
        self.tree.append_text(code, &content.join("\n"));
        i
    }

    fn parse_indented_code(&mut self, lines: &[&str], start: usize, parent: NodeId) -> usize {
        let mut i = start;
        let mut content: Vec<String> = Vec::new();
        while i < lines.len() {
            let line = lines[i];
            if is_blank(line) {
                // Keep interior blank lines, drop trailing ones.
                let more = lines[i + 1..]
                    .iter()
                    .find(|l| !is_blank(l))
                    .is_some_and(|l| indent_of(l) >= 4);
                if !more {
                    break;
                }
                content.push(String::new());
            } else if indent_of(line) >= 4 {
                content.push(line[4..].to_string());
            } else {
                break;
            }
            i += 1;
        }
        let code = self.tree.append_element(parent, QName::page("blockcode"));
        self.tree.append_text(code, &content.join("\n"));
        i
    }

    fn parse_blockquote(&mut self, lines: &[&str], start: usize, parent: NodeId) -> usize {
        let mut i = start;
        let mut content: Vec<String> = Vec::new();
        while i < lines.len() {
            let trimmed = lines[i].trim_start();
            if let Some(rest) = trimmed.strip_prefix('>') {
                content.push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
                i += 1;
            } else if !is_blank(lines[i]) && content.last().is_some_and(|l| !l.is_empty()) {
                // Lazy continuation.
                content.push(lines[i].to_string());
                i += 1;
            } else {
                break;
            }
        }
        let quote = self.tree.append_element(parent, QName::page("blockquote"));
        let refs: Vec<&str> = content.iter().map(String::as_str).collect();
        self.parse_blocks(&refs, quote);
        i
    }

    fn parse_paragraph(&mut self, lines: &[&str], start: usize, parent: NodeId) -> usize {
        let mut i = start;
        let mut collected: Vec<&str> = Vec::new();
        while i < lines.len() {
            let line = lines[i];
            if is_blank(line) {
                break;
            }
            // Setext underline closes the paragraph as a heading.
            if !collected.is_empty()
                && let Some(level) = setext_level(line)
            {
                let h = self.tree.append_element(parent, QName::page("h"));
                self.tree
                    .set_attr(h, QName::page("outline-level"), level.to_string());
                scan_inline(self.tree, h, collected.join("\n").trim(), self.options);
                return i + 1;
            }
            if !collected.is_empty() && interrupts_paragraph(line, self.options) {
                break;
            }
            // Trailing whitespace stays: two spaces before the newline are a
            // hard line break for the inline scanner.
            collected.push(line);
            i += 1;
        }
        if !collected.is_empty() {
            let p = self.tree.append_element(parent, QName::page("p"));
            scan_inline(self.tree, p, collected.join("\n").trim(), self.options);
        }
        i
    }

    fn parse_list(&mut self, lines: &[&str], start: usize, parent: NodeId) -> usize {
        let first = list_marker(lines[start]).expect("caller checked marker");
        let base = first.indent;
        let ordered = first.ordered;

        // Collect item line groups first; tightness is a whole-list property.
        let mut items: Vec<Vec<String>> = Vec::new();
        let mut loose = false;
        let mut i = start;
        while i < lines.len() {
            let Some(marker) = list_marker(lines[i]) else {
                break;
            };
            if marker.indent < base || marker.indent > base + 3 || marker.ordered != ordered {
                break;
            }
            let mut item: Vec<String> = vec![lines[i][marker.content_start..].to_string()];
            i += 1;
            while i < lines.len() {
                let line = lines[i];
                if is_blank(line) {
                    let next = lines[i + 1..].iter().find(|l| !is_blank(l));
                    match next {
                        Some(next_line) if indent_of(next_line) >= base + 4 => {
                            item.push(String::new());
                            i += 1;
                        }
                        Some(next_line)
                            if list_marker(next_line)
                                .is_some_and(|m| (base..=base + 3).contains(&m.indent)) =>
                        {
                            loose = true;
                            i += 1;
                            break;
                        }
                        _ => break,
                    }
                } else if let Some(m) = list_marker(line)
                    && m.indent <= base + 3
                {
                    break;
                } else if indent_of(line) >= base + 4 {
                    item.push(line[base + 4..].to_string());
                    i += 1;
                } else if item.last().is_some_and(|l| !l.is_empty()) {
                    // Lazy continuation joins the current paragraph.
                    item.push(line.trim_start().to_string());
                    i += 1;
                } else {
                    break;
                }
            }
            while item.last().is_some_and(|l| l.is_empty()) {
                item.pop();
            }
            items.push(item);
        }

        let list = self.tree.append_element(parent, QName::page("list"));
        self.tree.set_attr(
            list,
            QName::page("item-label-generate"),
            if ordered { "ordered" } else { "unordered" },
        );
        for item_lines in items {
            let item = self.tree.append_element(list, QName::page("list-item"));
            let body = self
                .tree
                .append_element(item, QName::page("list-item-body"));
            let refs: Vec<&str> = item_lines.iter().map(String::as_str).collect();
            self.parse_blocks(&refs, body);
            if !loose {
                self.unwrap_paragraphs(body);
            }
        }
        i
    }

    /// Tight lists carry inline content directly in the item body.
    fn unwrap_paragraphs(&mut self, body: NodeId) {
        let paragraphs: Vec<NodeId> = self
            .tree
            .children(body)
            .iter()
            .copied()
            .filter(|&c| self.tree.is_page_element(c, "p") && self.tree.attrs(c).next().is_none())
            .collect();
        for p in paragraphs {
            self.tree.unwrap(p);
        }
    }

    fn parse_table(&mut self, lines: &[&str], start: usize, parent: NodeId) -> usize {
        let header_cells = split_row(lines[start]);
        let columns = header_cells.len();
        let mut i = start + 2;
        let mut rows: Vec<Vec<String>> = Vec::new();
        while i < lines.len() && !is_blank(lines[i]) && lines[i].contains('|') {
            let mut cells = split_row(lines[i]);
            // Column count mismatches are tolerated by padding missing cells.
            while cells.len() < columns {
                cells.push(String::new());
            }
            rows.push(cells);
            i += 1;
        }

        let table = self.tree.append_element(parent, QName::page("table"));
        let header = self
            .tree
            .append_element(table, QName::page("table-header"));
        let row = self.tree.append_element(header, QName::page("table-row"));
        for cell in header_cells {
            let c = self
                .tree
                .append_element(row, QName::page("table-cell-head"));
            scan_inline(self.tree, c, &cell, self.options);
        }
        let tbody = self.tree.append_element(table, QName::page("table-body"));
        for cells in rows {
            let row = self.tree.append_element(tbody, QName::page("table-row"));
            for cell in cells {
                let c = self.tree.append_element(row, QName::page("table-cell"));
                scan_inline(self.tree, c, &cell, self.options);
            }
        }
        i
    }

    fn parse_admonition(&mut self, lines: &[&str], start: usize, parent: NodeId) -> usize {
        let header = lines[start][3..].trim();
        let (types_part, title) = match header.find('"') {
            Some(quote) => {
                let rest = &header[quote + 1..];
                let end = rest.find('"').unwrap_or(rest.len());
                (header[..quote].trim(), Some(rest[..end].to_string()))
            }
            None => (header, None),
        };
        if types_part.is_empty() {
            // No admonition type: not an admonition after all.
            return self.parse_paragraph(lines, start, parent);
        }

        let mut i = start + 1;
        let mut content: Vec<String> = Vec::new();
        while i < lines.len() {
            let line = lines[i];
            if is_blank(line) {
                let more = lines[i + 1..]
                    .iter()
                    .find(|l| !is_blank(l))
                    .is_some_and(|l| indent_of(l) >= 4);
                if !more {
                    break;
                }
                content.push(String::new());
            } else if indent_of(line) >= 4 {
                content.push(line[4..].to_string());
            } else {
                break;
            }
            i += 1;
        }

        let div = self.tree.append_element(parent, QName::page("div"));
        self.tree.set_attr(
            div,
            QName::page("class"),
            format!("admonition {}", types_part.split_whitespace().collect::<Vec<_>>().join(" ")),
        );
        // The title is the type capitalized unless given; `""` suppresses it.
        let title_text = match title {
            Some(t) if t.is_empty() => None,
            Some(t) => Some(t),
            None => {
                let first = types_part.split_whitespace().next().unwrap_or_default();
                let mut chars = first.chars();
                Some(match chars.next() {
                    Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                })
            }
        };
        if let Some(text) = title_text {
            let p = self.tree.append_element(div, QName::page("p"));
            self.tree
                .set_attr(p, QName::page("class"), "admonition-title");
            self.tree.append_text(p, &text);
        }
        let refs: Vec<&str> = content.iter().map(String::as_str).collect();
        self.parse_blocks(&refs, div);
        i
    }

    fn parse_definition_list(&mut self, lines: &[&str], start: usize, parent: NodeId) -> usize {
        let term = lines[start].trim();
        let mut i = start + 1;
        let mut definitions: Vec<Vec<String>> = Vec::new();
        while i < lines.len() {
            let line = lines[i];
            if let Some(text) = definition_start(line) {
                definitions.push(vec![text.to_string()]);
                i += 1;
            } else if !is_blank(line)
                && indent_of(line) >= 4
                && let Some(current) = definitions.last_mut()
            {
                current.push(line[4..].to_string());
                i += 1;
            } else {
                break;
            }
        }

        let list = self.tree.append_element(parent, QName::page("list"));
        let item = self.tree.append_element(list, QName::page("list-item"));
        let label = self
            .tree
            .append_element(item, QName::page("list-item-label"));
        scan_inline(self.tree, label, term, self.options);
        for def in definitions {
            let body = self
                .tree
                .append_element(item, QName::page("list-item-body"));
            let refs: Vec<&str> = def.iter().map(String::as_str).collect();
            self.parse_blocks(&refs, body);
            self.unwrap_paragraphs(body);
        }
        i
    }

    /// Consume a block-level HTML chunk and route it through the HTML
    /// converter's mapping. Markdown inside block-level HTML is not
    /// processed.
    fn parse_html_block(
        &mut self,
        lines: &[&str],
        start: usize,
        tag: &str,
        parent: NodeId,
    ) -> usize {
        let mut depth = 0i32;
        let mut i = start;
        let mut chunk: Vec<&str> = Vec::new();
        while i < lines.len() {
            let line = lines[i];
            depth += tag_depth_delta(line, tag);
            chunk.push(line);
            i += 1;
            if depth <= 0 {
                break;
            }
            // An unterminated chunk ends at the next blank line.
            if i < lines.len() && is_blank(lines[i]) {
                break;
            }
        }
        let dom = parse_html(&chunk.join("\n"));
        if let Some(dom_body) = dom.find_tag("body") {
            map_children(&dom, dom_body, self.tree, parent);
        }
        i
    }
}

/// Net change in nesting depth of `tag` across one line.
fn tag_depth_delta(line: &str, tag: &str) -> i32 {
    let lower = line.to_ascii_lowercase();
    let mut delta = 0;
    let open = format!("<{tag}");
    let close = format!("</{tag}");
    let mut pos = 0;
    while let Some(found) = lower[pos..].find('<') {
        let at = pos + found;
        if lower[at..].starts_with(&close)
            && !lower[at + close.len()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphanumeric())
        {
            delta -= 1;
            pos = at + close.len();
        } else if lower[at..].starts_with(&open)
            && !lower[at + open.len()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphanumeric())
        {
            // Self-closing (`<hr />`) and void tags never nest.
            let end = lower[at..].find('>').map(|e| at + e).unwrap_or(lower.len());
            if !lower[..end].ends_with('/') && !is_void_tag(tag) {
                delta += 1;
            }
            pos = end;
        } else {
            pos = at + 1;
        }
    }
    delta
}

fn is_void_tag(tag: &str) -> bool {
    matches!(tag, "hr" | "br" | "img" | "input" | "meta" | "link")
}

fn setext_level(line: &str) -> Option<u8> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.chars().all(|c| c == '=') {
        Some(1)
    } else if trimmed.chars().all(|c| c == '-') {
        Some(2)
    } else {
        None
    }
}

fn interrupts_paragraph(line: &str, options: &ConvertOptions) -> bool {
    is_atx_heading(line)
        || is_thematic_break(line)
        || line.trim_start().starts_with("> ")
        || list_marker(line).is_some()
        || (options.extensions.fenced_code && fence_open(line).is_some())
        || (options.extensions.admonitions && line.starts_with("!!!"))
        || html_block_start(line).is_some()
}

fn definition_start(line: &str) -> Option<&str> {
    let trimmed = line.strip_prefix(':')?;
    let text = trimmed.strip_prefix(' ')?;
    Some(text.trim_start())
}

/// Split a table row into trimmed cell strings, ignoring leading/trailing
/// pipes.
fn split_row(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let trimmed = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('|').unwrap_or(trimmed);
    trimmed.split('|').map(|c| c.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_marker_detection() {
        let m = list_marker("* Item").expect("marker");
        assert!(!m.ordered);
        assert_eq!(m.content_start, 2);

        let m = list_marker("    8. Item").expect("marker");
        assert!(m.ordered);
        assert_eq!(m.indent, 4);

        assert!(list_marker("*no space").is_none());
        assert!(list_marker("plain").is_none());
    }

    #[test]
    fn test_thematic_break_detection() {
        assert!(is_thematic_break("----"));
        assert!(is_thematic_break("* * *"));
        assert!(!is_thematic_break("--"));
        assert!(!is_thematic_break("--- x"));
    }

    #[test]
    fn test_table_separator_detection() {
        assert!(is_table_separator("------------- | -------------"));
        assert!(is_table_separator("| :--- | ---: |"));
        assert!(!is_table_separator("cell | cell"));
    }

    #[test]
    fn test_split_row() {
        assert_eq!(split_row("| a | b |"), vec!["a", "b"]);
        assert_eq!(split_row("a | b"), vec!["a", "b"]);
    }

    #[test]
    fn test_tag_depth_delta() {
        assert_eq!(tag_depth_delta("<div><div>", "div"), 2);
        assert_eq!(tag_depth_delta("<address>x</address>", "address"), 0);
        assert_eq!(tag_depth_delta("<hr />", "hr"), 0);
    }
}
