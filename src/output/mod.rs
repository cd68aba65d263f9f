//! Output converters: document tree → rendered text.
//!
//! Serializers are pure functions of the tree: no oracle calls, no I/O,
//! deterministic for a given tree. Unknown element tags degrade to rendering
//! their children without the wrapping construct, so forward-compatible tags
//! lose their decoration but never their content.

pub mod docbook;
pub mod html;
pub mod markdown;

pub use docbook::DocBookSerializer;
pub use html::HtmlSerializer;
pub use markdown::MarkdownSerializer;

use crate::tree::Tree;

/// A serializer from the document tree into one target format.
pub trait OutputConverter {
    fn serialize(&self, tree: &Tree) -> String;
}
