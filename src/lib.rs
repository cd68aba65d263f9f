//! # wikivert
//!
//! A library for converting wiki content between textual markup dialects
//! (Markdown, HTML, plain text, DocBook) by routing every format through one
//! canonical, in-memory document tree.
//!
//! ## Pipeline
//!
//! Raw text plus a declared content type goes through:
//!
//! 1. an **input converter**, parsing the text into a [`Tree`];
//! 2. the **transform stages** (include expansion, macro expansion, smiley
//!    substitution, link resolution), each an in-place pass over the tree,
//!    driven by caller-supplied [`Oracles`];
//! 3. an **output converter**, serializing the tree into the target format.
//!
//! ## Quick Start
//!
//! ```
//! use wikivert::{ConvertOptions, Oracles, convert};
//!
//! let html = convert(
//!     "**Strong** stuff",
//!     "text/x-markdown;charset=utf-8",
//!     "text/html",
//!     &ConvertOptions::default(),
//!     &Oracles::none(),
//! )
//! .unwrap();
//! assert_eq!(html, "<p><strong>Strong</strong> stuff</p>");
//! ```
//!
//! ## Failure model
//!
//! Input converters are total: malformed markup degrades to literal text.
//! Unresolvable links, transclusions and macros become inline `error`
//! elements, visible in the rendered output. The only hard failure is
//! requesting a conversion pair with no registered converter.
//!
//! ## Working with the tree
//!
//! ```
//! use wikivert::{QName, Tree};
//!
//! let mut tree = Tree::new();
//! let body = tree.body();
//! let p = tree.append_element(body, QName::page("p"));
//! tree.append_text(p, "Hello");
//! assert_eq!(tree.to_xml_string(), "<page><body><p>Hello</p></body></page>");
//! ```

pub mod error;
pub mod input;
pub mod options;
pub mod oracle;
pub mod output;
pub mod registry;
pub mod transform;
pub mod tree;

pub use error::{Error, Result};
pub use input::{HtmlConverter, InputConverter, MarkdownConverter, PlainTextConverter};
pub use options::{ConvertOptions, Extensions};
pub use oracle::{
    IncludeFailure, IncludeOracle, LinkOracle, MacroContext, MacroOracle, Oracles,
};
pub use output::{DocBookSerializer, HtmlSerializer, MarkdownSerializer, OutputConverter};
pub use registry::{
    Registry, TYPE_DOCBOOK, TYPE_HTML, TYPE_MARKDOWN, TYPE_PLAIN, convert, convert_bytes,
};
pub use tree::{LOCAL_SCHEME, NodeData, NodeId, Ns, QName, Tree};
