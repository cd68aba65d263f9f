//! Input converters: raw markup text → document tree.
//!
//! Each converter is a total function: malformed constructs degrade to
//! literal text at the point of ambiguity, so every input string has a
//! defined output tree. Converters emit unresolved `wiki.local:` references
//! and transclusion placeholders only; resolution belongs to the transform
//! stages.

pub mod html;
pub mod markdown;
pub mod text;

pub use html::HtmlConverter;
pub use markdown::MarkdownConverter;
pub use text::PlainTextConverter;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::options::ConvertOptions;
use crate::tree::{LOCAL_SCHEME, Tree};

/// A parser from one source format into the document tree.
pub trait InputConverter {
    fn convert(&self, input: &str, options: &ConvertOptions) -> Tree;
}

/// Schemes allowed to survive as live hyperlinks. Anything else, notably
/// script-execution schemes, is demoted to a wiki-local reference so it
/// renders as inert content instead of an executable link.
const SAFE_SCHEMES: &[&str] = &["http", "https", "ftp", "ftps", "mailto", "file", "irc", "nntp"];

/// Percent-encoding for wiki-local references: everything but unreserved
/// characters, `:` and `/` (so page paths and interwiki prefixes stay
/// readable).
const WIKI_LOCAL_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b':')
    .remove(b'/');

/// Classified destination of a link or transclusion reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    /// Absolute reference with a safe scheme; passes through untouched.
    External(String),
    /// Everything else: a `wiki.local:`-prefixed, percent-encoded reference
    /// awaiting the link-resolution transform.
    WikiLocal(String),
}

impl Target {
    pub(crate) fn classify(raw: &str) -> Self {
        if let Some(scheme) = scheme_of(raw)
            && SAFE_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str())
        {
            return Target::External(raw.to_string());
        }
        let encoded = utf8_percent_encode(raw, WIKI_LOCAL_SET).to_string();
        Target::WikiLocal(format!("{LOCAL_SCHEME}{encoded}"))
    }

    /// The href value to store on the element.
    pub(crate) fn href(&self) -> &str {
        match self {
            Target::External(url) => url,
            Target::WikiLocal(href) => href,
        }
    }
}

/// Extract the URI scheme of `raw`, if it syntactically has one.
fn scheme_of(raw: &str) -> Option<&str> {
    let colon = raw.find(':')?;
    let candidate = &raw[..colon];
    let mut chars = candidate.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    chars
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        .then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_scheme_passes_through() {
        assert_eq!(
            Target::classify("http://moinmo.in/"),
            Target::External("http://moinmo.in/".to_string())
        );
    }

    #[test]
    fn test_script_scheme_demoted() {
        assert_eq!(
            Target::classify("javascript:alert("),
            Target::WikiLocal("wiki.local:javascript:alert%28".to_string())
        );
    }

    #[test]
    fn test_schemeless_reference_quoted() {
        assert_eq!(
            Target::classify("Yesterday: a legacy"),
            Target::WikiLocal("wiki.local:Yesterday:%20a%20legacy".to_string())
        );
        assert_eq!(
            Target::classify("Main/sub"),
            Target::WikiLocal("wiki.local:Main/sub".to_string())
        );
    }
}
