//! Conversion registry and entry points.
//!
//! Maps a `(source type, target type)` pair to the converter chain to run:
//! input converter, transform stages in fixed order, output converter. The
//! only failure that aborts a conversion is a missing converter for one of
//! the two types, raised before any parsing begins; every other problem is
//! recovered into the tree as an inline error marker.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::input::{HtmlConverter, InputConverter, MarkdownConverter, PlainTextConverter};
use crate::options::ConvertOptions;
use crate::oracle::Oracles;
use crate::output::{DocBookSerializer, HtmlSerializer, MarkdownSerializer, OutputConverter};
use crate::transform;
use crate::tree::Tree;

pub const TYPE_MARKDOWN: &str = "text/x-markdown";
pub const TYPE_HTML: &str = "text/html";
pub const TYPE_PLAIN: &str = "text/plain";
pub const TYPE_DOCBOOK: &str = "application/docbook+xml";

/// Registry of input and output converters keyed by MIME-ish base type.
///
/// Content types are matched on their base (`text/x-markdown;charset=utf-8`
/// matches `text/x-markdown`). The default registry knows Markdown, HTML and
/// plain text input, and HTML, Markdown and DocBook output; both sides are
/// extensible for callers carrying their own formats.
pub struct Registry {
    inputs: HashMap<String, Box<dyn InputConverter + Send + Sync>>,
    outputs: HashMap<String, Box<dyn OutputConverter + Send + Sync>>,
}

impl Default for Registry {
    fn default() -> Self {
        let mut registry = Self {
            inputs: HashMap::new(),
            outputs: HashMap::new(),
        };
        registry.register_input(TYPE_MARKDOWN, Box::new(MarkdownConverter));
        // Both markdown registrations share one converter type.
        registry.register_input("text/markdown", Box::new(MarkdownConverter));
        registry.register_input(TYPE_HTML, Box::new(HtmlConverter));
        registry.register_input(TYPE_PLAIN, Box::new(PlainTextConverter));
        registry.register_output(TYPE_HTML, Box::new(HtmlSerializer));
        registry.register_output(TYPE_MARKDOWN, Box::new(MarkdownSerializer));
        registry.register_output(TYPE_DOCBOOK, Box::new(DocBookSerializer));
        registry
    }
}

impl Registry {
    /// An empty registry with no converters at all.
    pub fn empty() -> Self {
        Self {
            inputs: HashMap::new(),
            outputs: HashMap::new(),
        }
    }

    pub fn register_input(
        &mut self,
        content_type: &str,
        converter: Box<dyn InputConverter + Send + Sync>,
    ) {
        self.inputs.insert(base_type(content_type), converter);
    }

    pub fn register_output(
        &mut self,
        content_type: &str,
        converter: Box<dyn OutputConverter + Send + Sync>,
    ) {
        self.outputs.insert(base_type(content_type), converter);
    }

    /// Run the full pipeline: parse, transform, serialize.
    ///
    /// Both converters are looked up before parsing starts, so an
    /// unsupported pair fails fast without touching the input.
    pub fn convert(
        &self,
        text: &str,
        source_type: &str,
        target_type: &str,
        options: &ConvertOptions,
        oracles: &Oracles<'_>,
    ) -> Result<String> {
        let input = self.inputs.get(&base_type(source_type));
        let output = self.outputs.get(&base_type(target_type));
        let (Some(input), Some(output)) = (input, output) else {
            return Err(Error::UnsupportedConversion {
                source_type: source_type.to_string(),
                target_type: target_type.to_string(),
            });
        };
        let mut tree = input.convert(text, options);
        transform::apply(&mut tree, options, oracles);
        Ok(output.serialize(&tree))
    }

    /// Like [`convert`](Self::convert) for raw bytes: the `charset` parameter
    /// of the source type picks the decoder, defaulting to UTF-8 with a
    /// Windows-1252 fallback for malformed input.
    pub fn convert_bytes(
        &self,
        bytes: &[u8],
        source_type: &str,
        target_type: &str,
        options: &ConvertOptions,
        oracles: &Oracles<'_>,
    ) -> Result<String> {
        let text = decode_text(bytes, charset_of(source_type).as_deref());
        self.convert(&text, source_type, target_type, options, oracles)
    }

    /// Parse only: raw text into an untransformed tree.
    pub fn parse(&self, text: &str, source_type: &str, options: &ConvertOptions) -> Result<Tree> {
        match self.inputs.get(&base_type(source_type)) {
            Some(input) => Ok(input.convert(text, options)),
            None => Err(Error::UnsupportedConversion {
                source_type: source_type.to_string(),
                target_type: "*".to_string(),
            }),
        }
    }

    /// Serialize only: a (transformed) tree into the target format.
    pub fn render(&self, tree: &Tree, target_type: &str) -> Result<String> {
        match self.outputs.get(&base_type(target_type)) {
            Some(output) => Ok(output.serialize(tree)),
            None => Err(Error::UnsupportedConversion {
                source_type: "*".to_string(),
                target_type: target_type.to_string(),
            }),
        }
    }
}

/// Convert with the default registry.
pub fn convert(
    text: &str,
    source_type: &str,
    target_type: &str,
    options: &ConvertOptions,
    oracles: &Oracles<'_>,
) -> Result<String> {
    Registry::default().convert(text, source_type, target_type, options, oracles)
}

/// Convert raw bytes with the default registry.
pub fn convert_bytes(
    bytes: &[u8],
    source_type: &str,
    target_type: &str,
    options: &ConvertOptions,
    oracles: &Oracles<'_>,
) -> Result<String> {
    Registry::default().convert_bytes(bytes, source_type, target_type, options, oracles)
}

/// The MIME base of a content type: parameters stripped, lowercased.
fn base_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// The `charset` parameter of a content type, if declared.
fn charset_of(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}

/// Decode bytes to text, honoring a declared charset.
///
/// A bogus charset label falls back to UTF-8 rather than failing; decoding
/// never aborts a conversion.
fn decode_text<'a>(bytes: &'a [u8], charset: Option<&str>) -> Cow<'a, str> {
    if let Some(label) = charset
        && let Some(encoding) = encoding_rs::Encoding::for_label(label.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }
    let (result, _, malformed) = encoding_rs::UTF_8.decode(bytes);
    if !malformed {
        return result;
    }
    // Superset of ISO-8859-1, the most common legacy wiki encoding.
    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_type_strips_parameters() {
        assert_eq!(base_type("text/x-markdown;charset=utf-8"), "text/x-markdown");
        assert_eq!(base_type("Text/HTML"), "text/html");
    }

    #[test]
    fn test_charset_extraction() {
        assert_eq!(
            charset_of("text/x-markdown;charset=utf-8").as_deref(),
            Some("utf-8")
        );
        assert_eq!(charset_of("text/html").as_deref(), None);
    }

    #[test]
    fn test_unsupported_pair_fails_before_parsing() {
        let registry = Registry::default();
        let result = registry.convert(
            "text",
            "application/x-unknown",
            TYPE_HTML,
            &ConvertOptions::default(),
            &Oracles::none(),
        );
        assert!(matches!(result, Err(Error::UnsupportedConversion { .. })));
    }

    #[test]
    fn test_markdown_to_html() {
        let registry = Registry::default();
        let html = registry
            .convert(
                "**Strong**",
                "text/x-markdown;charset=utf-8",
                TYPE_HTML,
                &ConvertOptions::default(),
                &Oracles::none(),
            )
            .expect("conversion should succeed");
        assert_eq!(html, "<p><strong>Strong</strong></p>");
    }

    #[test]
    fn test_convert_bytes_with_latin1_charset() {
        let registry = Registry::default();
        let html = registry
            .convert_bytes(
                b"caf\xe9",
                "text/plain;charset=iso-8859-1",
                TYPE_HTML,
                &ConvertOptions::default(),
                &Oracles::none(),
            )
            .expect("conversion should succeed");
        assert_eq!(html, "<p>caf\u{e9}</p>");
    }

    #[test]
    fn test_decode_falls_back_on_malformed_utf8() {
        let text = decode_text(b"a\xffb", None);
        assert!(text.contains('a') && text.contains('b'));
    }
}
