//! Markdown escaping for serialized text runs.

/// Escape characters that would otherwise be parsed as markup.
///
/// `#` only needs escaping at the start of a line, `!` only in front of a
/// bracket; everything else in the set is unconditional.
pub fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + text.len() / 10);
    let mut chars = text.chars().peekable();
    let mut at_line_start = true;

    while let Some(c) = chars.next() {
        match c {
            '\\' => result.push_str("\\\\"),
            '*' | '_' | '`' | '[' | ']' | '<' | '|' => {
                result.push('\\');
                result.push(c);
            }
            '#' if at_line_start => {
                result.push('\\');
                result.push(c);
            }
            '!' if chars.peek() == Some(&'[') => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
        at_line_start = c == '\n';
    }
    result
}

/// Escape a table cell: like [`escape_markdown`], with newlines flattened so
/// the cell stays on its row.
pub fn escape_cell(text: &str) -> String {
    escape_markdown(&text.replace('\n', " "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_emphasis_markers() {
        assert_eq!(escape_markdown("*bold*"), "\\*bold\\*");
        assert_eq!(escape_markdown("a_b"), "a\\_b");
    }

    #[test]
    fn test_hash_only_at_line_start() {
        assert_eq!(escape_markdown("# heading"), "\\# heading");
        assert_eq!(escape_markdown("a # b"), "a # b");
        assert_eq!(escape_markdown("a\n# b"), "a\n\\# b");
    }

    #[test]
    fn test_bang_only_before_bracket() {
        assert_eq!(escape_markdown("![x]"), "\\!\\[x\\]");
        assert_eq!(escape_markdown("hi!"), "hi!");
    }
}
