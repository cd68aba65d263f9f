//! Inline scanner: emphasis, code spans, links, images, autolinks, escapes,
//! hard breaks and embedded inline HTML.
//!
//! The scanner is byte-driven over one block's text run. Anything it cannot
//! parse is emitted as literal text, never an error. Inline HTML uses a plain
//! tag stack: a mismatched end tag closes the innermost matching open
//! element if one exists and is otherwise dropped.

use crate::input::Target;
use crate::input::html::map::{self, TagClass};
use crate::options::ConvertOptions;
use crate::tree::{NodeId, QName, Tree};

/// Characters a backslash escapes; everything else keeps the backslash.
const ESCAPABLE: &str = "\\`*_{}[]()>#+-.!<";

/// Scan `text` and append the inline content under `parent`.
pub(crate) fn scan_inline(tree: &mut Tree, parent: NodeId, text: &str, options: &ConvertOptions) {
    InlineScanner { tree, options }.scan(parent, text);
}

struct InlineScanner<'t, 'o> {
    tree: &'t mut Tree,
    options: &'o ConvertOptions,
}

/// Open inline-HTML element on the scanner's tag stack.
struct HtmlFrame {
    name: String,
    /// Parent to restore when this tag closes. Transparent frames (unwrapped
    /// tags) restore to the same parent they were opened under.
    restore: NodeId,
}

impl InlineScanner<'_, '_> {
    fn scan(&mut self, parent: NodeId, text: &str) {
        let bytes = text.as_bytes();
        let mut cur = parent;
        let mut stack: Vec<HtmlFrame> = Vec::new();
        let mut buf = String::new();
        let mut pos = 0;

        while pos < text.len() {
            match bytes[pos] {
                b'\\' if pos + 1 < text.len()
                    && ESCAPABLE.contains(text[pos + 1..].chars().next().unwrap_or('\0')) =>
                {
                    buf.push(bytes[pos + 1] as char);
                    pos += 2;
                }
                b'`' => {
                    let run = run_length(bytes, pos, b'`');
                    if let Some(close) = find_backtick_run(text, pos + run, run) {
                        self.flush(&mut buf, cur);
                        let code = self.tree.append_element(cur, QName::page("code"));
                        self.tree.append_text(code, text[pos + run..close].trim());
                        pos = close + run;
                    } else {
                        buf.push_str(&text[pos..pos + run]);
                        pos += run;
                    }
                }
                b'*' | b'_' => {
                    let marker = bytes[pos] as char;
                    let run = run_length(bytes, pos, bytes[pos]);
                    let prev = text[..pos].chars().next_back();
                    // Intraword underscores stay literal.
                    if marker == '_' && prev.is_some_and(|c| c.is_alphanumeric()) {
                        buf.push_str(&text[pos..pos + run]);
                        pos += run;
                    } else if let Some(next) = self.try_emphasis(cur, text, pos, run, marker, &mut buf)
                    {
                        pos = next;
                    } else {
                        buf.push_str(&text[pos..pos + run]);
                        pos += run;
                    }
                }
                b'<' => {
                    if let Some(next) = self.try_autolink(cur, text, pos, &mut buf) {
                        pos = next;
                    } else if let Some((token, len)) = parse_tag(&text[pos..]) {
                        self.flush(&mut buf, cur);
                        pos += len;
                        pos = self.handle_tag(token, text, pos, &mut cur, &mut stack);
                    } else {
                        buf.push('<');
                        pos += 1;
                    }
                }
                b'[' => {
                    if let Some(next) = self.try_wikilink(cur, text, pos, &mut buf) {
                        pos = next;
                    } else if let Some(next) = self.try_link(cur, text, pos, &mut buf) {
                        pos = next;
                    } else {
                        buf.push('[');
                        pos += 1;
                    }
                }
                b'!' if bytes.get(pos + 1) == Some(&b'[') => {
                    if let Some(next) = self.try_image(cur, text, pos, &mut buf) {
                        pos = next;
                    } else {
                        buf.push('!');
                        pos += 1;
                    }
                }
                b' ' => {
                    let run = run_length(bytes, pos, b' ');
                    if run >= 2 && bytes.get(pos + run) == Some(&b'\n') {
                        self.flush(&mut buf, cur);
                        self.tree.append_element(cur, QName::page("line-break"));
                        buf.push('\n');
                        pos += run + 1;
                    } else {
                        buf.push(' ');
                        pos += 1;
                    }
                }
                _ => {
                    let c = text[pos..].chars().next().expect("pos is a char boundary");
                    buf.push(c);
                    pos += c.len_utf8();
                }
            }
        }
        self.flush(&mut buf, cur);
    }

    fn flush(&mut self, buf: &mut String, cur: NodeId) {
        if !buf.is_empty() {
            self.tree.append_text(cur, buf);
            buf.clear();
        }
    }

    /// Try to open emphasis/strong at `pos`; returns the position after the
    /// closing delimiter on success.
    fn try_emphasis(
        &mut self,
        cur: NodeId,
        text: &str,
        pos: usize,
        run: usize,
        marker: char,
        buf: &mut String,
    ) -> Option<usize> {
        for use_len in (1..=run.min(3)).rev() {
            let delim: String = std::iter::repeat_n(marker, use_len).collect();
            let content_start = pos + use_len;
            let Some(close) = find_delimiter(text, content_start, &delim, marker) else {
                continue;
            };
            let content = &text[content_start..close];
            if content.is_empty() || content.starts_with(char::is_whitespace) {
                continue;
            }
            self.flush(buf, cur);
            let node = match use_len {
                1 => self.tree.append_element(cur, QName::page("emphasis")),
                2 => self.tree.append_element(cur, QName::page("strong")),
                _ => {
                    let strong = self.tree.append_element(cur, QName::page("strong"));
                    self.tree.append_element(strong, QName::page("emphasis"))
                }
            };
            self.scan(node, content);
            return Some(close + use_len);
        }
        None
    }

    fn try_autolink(
        &mut self,
        cur: NodeId,
        text: &str,
        pos: usize,
        buf: &mut String,
    ) -> Option<usize> {
        let close = text[pos..].find('>')? + pos;
        let candidate = &text[pos + 1..close];
        if candidate.is_empty() || candidate.chars().any(char::is_whitespace) {
            return None;
        }
        match Target::classify(candidate) {
            Target::External(url) => {
                self.flush(buf, cur);
                let a = self.tree.append_element(cur, QName::page("a"));
                self.tree.set_attr(a, QName::xlink_href(), &*url);
                self.tree.append_text(a, candidate);
                Some(close + 1)
            }
            Target::WikiLocal(_) => None,
        }
    }

    fn try_wikilink(
        &mut self,
        cur: NodeId,
        text: &str,
        pos: usize,
        buf: &mut String,
    ) -> Option<usize> {
        if !self.options.extensions.wikilinks || !text[pos..].starts_with("[[") {
            return None;
        }
        let close = text[pos + 2..].find("]]")? + pos + 2;
        let target = text[pos + 2..close].trim();
        if target.is_empty() || target.contains('[') {
            return None;
        }
        // The label is the last path segment, so subitem links read naturally.
        let label = target.rsplit('/').next().unwrap_or(target);
        self.flush(buf, cur);
        let a = self.tree.append_element(cur, QName::page("a"));
        self.tree
            .set_attr(a, QName::xlink_href(), Target::classify(target).href());
        self.tree.append_text(a, label);
        Some(close + 2)
    }

    fn try_link(&mut self, cur: NodeId, text: &str, pos: usize, buf: &mut String) -> Option<usize> {
        let (label, dest) = parse_link_parts(text, pos)?;
        self.flush(buf, cur);
        let a = self.tree.append_element(cur, QName::page("a"));
        self.tree
            .set_attr(a, QName::xlink_href(), Target::classify(&dest.url).href());
        if let Some(title) = &dest.title {
            self.tree.set_attr(a, QName::page("title"), &**title);
            self.tree.set_attr(a, QName::html("title"), &**title);
        }
        self.scan(a, &label);
        Some(dest.end)
    }

    fn try_image(&mut self, cur: NodeId, text: &str, pos: usize, buf: &mut String) -> Option<usize> {
        let (alt, dest) = parse_link_parts(text, pos + 1)?;
        self.flush(buf, cur);
        match Target::classify(&dest.url) {
            Target::External(url) => {
                let obj = self.tree.append_element(cur, QName::page("object"));
                if !alt.is_empty() {
                    self.tree.set_attr(obj, QName::html("alt"), &*alt);
                }
                if let Some(title) = &dest.title {
                    self.tree.set_attr(obj, QName::html("title"), &**title);
                }
                self.tree.set_attr(obj, QName::xlink_href(), &*url);
            }
            Target::WikiLocal(href) => {
                let inc = self.tree.append_element(cur, QName::xinclude_include());
                // An empty alt text omits the attribute entirely.
                if !alt.is_empty() {
                    self.tree.set_attr(inc, QName::html("alt"), &*alt);
                }
                if let Some(title) = &dest.title {
                    self.tree.set_attr(inc, QName::html("title"), &**title);
                }
                self.tree.set_attr(inc, QName::xinclude_href(), &*href);
            }
        }
        Some(dest.end)
    }

    /// Apply a parsed inline HTML token. Returns the scan position, which
    /// advances past dropped content for ignored tags.
    fn handle_tag(
        &mut self,
        token: TagToken,
        text: &str,
        pos: usize,
        cur: &mut NodeId,
        stack: &mut Vec<HtmlFrame>,
    ) -> usize {
        if token.closing {
            if let Some(idx) = stack.iter().rposition(|f| f.name == token.name) {
                *cur = stack[idx].restore;
                stack.truncate(idx);
            }
            return pos;
        }
        match map::classify(&token.name) {
            TagClass::Drop => {
                // Drop the tag and everything up to its end tag.
                let close = format!("</{}", token.name);
                match find_case_insensitive(&text[pos..], &close) {
                    Some(at) => {
                        let after = pos + at + close.len();
                        text[after..]
                            .find('>')
                            .map(|gt| after + gt + 1)
                            .unwrap_or(text.len())
                    }
                    None => text.len(),
                }
            }
            TagClass::LineBreak => {
                self.tree.append_element(*cur, QName::page("line-break"));
                pos
            }
            TagClass::Link => {
                let a = self.tree.append_element(*cur, QName::page("a"));
                if let Some(href) = token.attr("href") {
                    self.tree
                        .set_attr(a, QName::xlink_href(), Target::classify(href).href());
                }
                self.copy_standard_attrs(&token, a);
                if !token.self_closing {
                    stack.push(HtmlFrame {
                        name: token.name,
                        restore: *cur,
                    });
                    *cur = a;
                }
                pos
            }
            TagClass::Image => {
                let src = token.attr("src").unwrap_or_default().to_string();
                let alt = token.attr("alt").unwrap_or_default().to_string();
                let title = token.attr("title").map(str::to_string);
                match Target::classify(&src) {
                    Target::External(url) => {
                        let obj = self.tree.append_element(*cur, QName::page("object"));
                        if !alt.is_empty() {
                            self.tree.set_attr(obj, QName::html("alt"), alt);
                        }
                        if let Some(title) = title {
                            self.tree.set_attr(obj, QName::html("title"), title);
                        }
                        self.tree.set_attr(obj, QName::xlink_href(), url);
                    }
                    Target::WikiLocal(href) => {
                        let inc = self.tree.append_element(*cur, QName::xinclude_include());
                        if !alt.is_empty() {
                            self.tree.set_attr(inc, QName::html("alt"), alt);
                        }
                        if let Some(title) = title {
                            self.tree.set_attr(inc, QName::html("title"), title);
                        }
                        self.tree.set_attr(inc, QName::xinclude_href(), href);
                    }
                }
                pos
            }
            TagClass::Inline(spec) => {
                let id = self.tree.append_element(*cur, spec.element_name());
                if let Some(html_tag) = spec.html_tag {
                    self.tree.set_attr(id, QName::page("html-tag"), html_tag);
                }
                if let Some(class) = spec.class {
                    self.tree.set_attr(id, QName::html("class"), class);
                }
                self.copy_standard_attrs(&token, id);
                if !token.self_closing {
                    stack.push(HtmlFrame {
                        name: token.name,
                        restore: *cur,
                    });
                    *cur = id;
                }
                pos
            }
            // Unknown tags are unwrapped: content is kept and still scanned.
            // Block-level tags appearing mid-line get the same treatment.
            _ => {
                if !token.self_closing {
                    stack.push(HtmlFrame {
                        name: token.name,
                        restore: *cur,
                    });
                }
                pos
            }
        }
    }

    fn copy_standard_attrs(&mut self, token: &TagToken, id: NodeId) {
        for &attr in map::STANDARD_ATTRS {
            if let Some(value) = token.attr(attr)
                && self.tree.attr(id, &QName::html(attr)).is_none()
            {
                self.tree.set_attr(id, QName::html(attr), value);
            }
        }
    }
}

fn run_length(bytes: &[u8], pos: usize, byte: u8) -> usize {
    bytes[pos..].iter().take_while(|&&b| b == byte).count()
}

/// Find a run of exactly `n` backticks at or after `from`.
fn find_backtick_run(text: &str, from: usize, n: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = from;
    while let Some(offset) = memchr::memchr(b'`', &bytes[i..]) {
        let at = i + offset;
        let run = run_length(bytes, at, b'`');
        if run == n {
            return Some(at);
        }
        i = at + run;
    }
    None
}

/// Find a valid closing delimiter for emphasis: not escaped, not preceded by
/// whitespace, and (for underscores) not followed by an alphanumeric.
fn find_delimiter(text: &str, from: usize, delim: &str, marker: char) -> Option<usize> {
    let mut search = from;
    while let Some(found) = text[search..].find(delim) {
        let at = search + found;
        let before = text[..at].chars().next_back();
        let after = text[at + delim.len()..].chars().next();
        let escaped = before == Some('\\');
        let ws_before = before.is_none_or(char::is_whitespace);
        let intraword = marker == '_' && after.is_some_and(char::is_alphanumeric);
        // An overlong marker run is not an exact closer; skip the whole run.
        let run = run_length(text.as_bytes(), at, marker as u8);
        if !escaped && !ws_before && !intraword && run == delim.len() && at > from {
            return Some(at);
        }
        search = at + run.max(1);
    }
    None
}

fn find_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let haystack_lower = haystack.to_ascii_lowercase();
    haystack_lower.find(&needle.to_ascii_lowercase())
}

/// Parsed destination of a link/image: URL, optional title, end position.
struct LinkDest {
    url: String,
    title: Option<String>,
    end: usize,
}

/// Parse `[label](url "title")` starting at the `[`. Returns the raw label
/// and the destination; `None` degrades to literal text at the call site.
fn parse_link_parts(text: &str, pos: usize) -> Option<(String, LinkDest)> {
    let bytes = text.as_bytes();
    if bytes.get(pos) != Some(&b'[') {
        return None;
    }
    // Label: balanced brackets, honoring escapes.
    let mut i = pos + 1;
    let mut depth = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
        i += 1;
    }
    if depth != 0 {
        return None;
    }
    let label = text[pos + 1..i].to_string();

    // Destination: '(' must follow immediately.
    if bytes.get(i + 1) != Some(&b'(') {
        return None;
    }
    let mut j = i + 2;
    while bytes.get(j) == Some(&b' ') {
        j += 1;
    }
    // Unquoted destinations may contain spaces (wiki page names); the URL
    // runs to the closing paren or the start of a quoted title.
    let url_start = j;
    while j < bytes.len() && !matches!(bytes[j], b'\n' | b'"' | b')') {
        j += 1;
    }
    let url = text[url_start..j].trim_end().to_string();
    let title = if bytes.get(j) == Some(&b'"') {
        let title_start = j + 1;
        let close = text[title_start..].find('"')? + title_start;
        j = close + 1;
        while bytes.get(j) == Some(&b' ') {
            j += 1;
        }
        Some(text[title_start..close].to_string())
    } else {
        None
    };
    if bytes.get(j) != Some(&b')') {
        return None;
    }
    Some((
        label,
        LinkDest {
            url,
            title,
            end: j + 1,
        },
    ))
}

/// A lightweight inline HTML tag token.
struct TagToken {
    name: String,
    closing: bool,
    self_closing: bool,
    attrs: Vec<(String, String)>,
}

impl TagToken {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Parse one HTML tag at the start of `text`. Only complete, well-formed
/// tags are recognized; anything else stays literal text.
fn parse_tag(text: &str) -> Option<(TagToken, usize)> {
    let bytes = text.as_bytes();
    if bytes.first() != Some(&b'<') {
        return None;
    }
    let mut i = 1;
    let closing = bytes.get(i) == Some(&b'/');
    if closing {
        i += 1;
    }
    let name_start = i;
    while i < bytes.len() && bytes[i].is_ascii_alphanumeric() {
        i += 1;
    }
    if i == name_start {
        return None;
    }
    let name = text[name_start..i].to_ascii_lowercase();

    let mut attrs = Vec::new();
    let mut self_closing = false;
    loop {
        while bytes.get(i).is_some_and(|b| b.is_ascii_whitespace()) {
            i += 1;
        }
        match bytes.get(i) {
            Some(b'>') => {
                i += 1;
                break;
            }
            Some(b'/') if bytes.get(i + 1) == Some(&b'>') => {
                self_closing = true;
                i += 2;
                break;
            }
            Some(_) if !closing => {
                let attr_start = i;
                while i < bytes.len() && !matches!(bytes[i], b'=' | b'>' | b'/' | b' ' | b'\t' | b'\n')
                {
                    i += 1;
                }
                if i == attr_start {
                    return None;
                }
                let attr_name = text[attr_start..i].to_ascii_lowercase();
                let mut value = String::new();
                if bytes.get(i) == Some(&b'=') {
                    i += 1;
                    if matches!(bytes.get(i), Some(&b'"') | Some(&b'\'')) {
                        let quote = bytes[i];
                        i += 1;
                        let value_start = i;
                        while i < bytes.len() && bytes[i] != quote {
                            i += 1;
                        }
                        if i >= bytes.len() {
                            return None;
                        }
                        value = text[value_start..i].to_string();
                        i += 1;
                    } else {
                        let value_start = i;
                        while i < bytes.len() && !matches!(bytes[i], b'>' | b' ' | b'\t' | b'\n') {
                            i += 1;
                        }
                        value = text[value_start..i].to_string();
                    }
                }
                attrs.push((attr_name, value));
            }
            _ => return None,
        }
    }
    Some((
        TagToken {
            name,
            closing,
            self_closing,
            attrs,
        },
        i,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tag_basic() {
        let (token, len) = parse_tag("<em>rest").expect("tag");
        assert_eq!(token.name, "em");
        assert!(!token.closing);
        assert_eq!(len, 4);

        let (token, _) = parse_tag("</EM>").expect("tag");
        assert_eq!(token.name, "em");
        assert!(token.closing);
    }

    #[test]
    fn test_parse_tag_attrs() {
        let (token, _) = parse_tag(r#"<abbr title="for example">x"#).expect("tag");
        assert_eq!(token.attr("title"), Some("for example"));

        let (token, _) = parse_tag("<br />").expect("tag");
        assert!(token.self_closing);
    }

    #[test]
    fn test_parse_tag_rejects_non_tags() {
        assert!(parse_tag("< two").is_none());
        assert!(parse_tag("<").is_none());
        assert!(parse_tag("<1x>").is_none());
    }

    #[test]
    fn test_parse_link_parts() {
        let (label, dest) = parse_link_parts("[yo](http://x/ \"t\") tail", 0).expect("link");
        assert_eq!(label, "yo");
        assert_eq!(dest.url, "http://x/");
        assert_eq!(dest.title.as_deref(), Some("t"));
        assert_eq!(&" tail"[..], &"[yo](http://x/ \"t\") tail"[dest.end..]);
    }

    #[test]
    fn test_parse_link_parts_url_stops_at_quote() {
        let (_, dest) = parse_link_parts("[yo](javascript:alert(\"xss\"))", 0).expect("link");
        assert_eq!(dest.url, "javascript:alert(");
        assert_eq!(dest.title.as_deref(), Some("xss"));
        // The surplus parenthesis stays outside the link.
        assert_eq!(dest.end, "[yo](javascript:alert(\"xss\")".len());
    }

    #[test]
    fn test_find_delimiter_skips_escaped() {
        assert_eq!(find_delimiter("a\\*b*", 0, "*", '*'), Some(4));
    }
}
