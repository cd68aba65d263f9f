//! Plain text → document tree.
//!
//! The fallback converter for `text/plain`: blank-line-separated paragraphs,
//! no inline markup of any kind.

use crate::input::InputConverter;
use crate::options::ConvertOptions;
use crate::tree::{QName, Tree};

/// Input converter for `text/plain`.
#[derive(Debug, Default)]
pub struct PlainTextConverter;

impl InputConverter for PlainTextConverter {
    fn convert(&self, input: &str, _options: &ConvertOptions) -> Tree {
        let mut tree = Tree::new();
        let body = tree.body();
        let normalized = input.replace("\r\n", "\n");
        for chunk in normalized.split("\n\n") {
            let chunk = chunk.trim_matches('\n');
            if chunk.is_empty() {
                continue;
            }
            let p = tree.append_element(body, QName::page("p"));
            tree.append_text(p, chunk);
        }
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_split() {
        let tree = PlainTextConverter.convert("one\ntwo\n\nthree", &ConvertOptions::default());
        assert_eq!(
            tree.to_xml_string(),
            "<page><body><p>one\ntwo</p><p>three</p></body></page>"
        );
    }

    #[test]
    fn test_markup_stays_literal() {
        let tree = PlainTextConverter.convert("**not strong**", &ConvertOptions::default());
        assert_eq!(
            tree.to_xml_string(),
            "<page><body><p>**not strong**</p></body></page>"
        );
    }
}
