//! Format-independent tree transform stages.
//!
//! Each stage is an in-place pass over the document tree, independent of the
//! source and target formats. The pipeline order is fixed: include expansion,
//! then macro expansion, then smiley substitution, then link resolution.
//! Expansion stages can introduce new unresolved links, so resolution must
//! run last. A stage whose oracle is absent is skipped; its placeholders
//! survive into the output in their pre-resolution state.

pub mod include;
pub mod link;
pub mod macros;
pub mod smiley;

pub use include::expand_includes;
pub use link::resolve_links;
pub use macros::expand_macros;
pub use smiley::substitute_smileys;

use crate::options::ConvertOptions;
use crate::oracle::{MacroContext, Oracles};
use crate::tree::{NodeId, Ns, QName, Tree};

/// Run the enabled transform stages in pipeline order.
pub fn apply(tree: &mut Tree, options: &ConvertOptions, oracles: &Oracles<'_>) {
    if let Some(oracle) = oracles.include {
        expand_includes(tree, oracle);
    }
    if let Some(oracle) = oracles.macros {
        let context = MacroContext {
            locale: &options.locale_default,
            base_namespace: &options.base_namespace,
        };
        expand_macros(tree, oracle, &context);
    }
    if options.extensions.smileys {
        substitute_smileys(tree);
    }
    if let Some(oracle) = oracles.links {
        resolve_links(tree, oracle);
    }
}

/// Replace `node` with an inline error marker carrying `reason` as text.
pub(crate) fn replace_with_error(tree: &mut Tree, node: NodeId, reason: &str) {
    let marker = tree.new_element(QName::page("error"));
    tree.replace(node, &[marker]);
    tree.append_text(marker, reason);
}

/// Splice the body content of an oracle-returned tree over `placeholder`.
///
/// Block-level content cannot sit inside an inline context, so two
/// placements are special-cased: a placeholder that is the sole child of a
/// paragraph takes block content by replacing the whole paragraph, and a
/// single-paragraph result spliced into an inline context is unwrapped to
/// its inline content.
pub(crate) fn splice_subtree(tree: &mut Tree, placeholder: NodeId, subtree: &Tree) -> Vec<NodeId> {
    let body = subtree.body();
    let mut sources: Vec<NodeId> = subtree.children(body).to_vec();
    let has_block = sources.iter().any(|&n| is_block_element(subtree, n));
    let parent = tree.parent(placeholder);
    let sole_in_paragraph = parent.is_some_and(|p| {
        tree.is_page_element(p, "p") && tree.children(p).len() == 1
    });

    let mut target = placeholder;
    if has_block && sole_in_paragraph {
        target = parent.expect("sole_in_paragraph implies a parent");
    } else if sources.len() == 1
        && subtree.is_page_element(sources[0], "p")
        && parent.is_some_and(|p| is_inline_context(tree, p))
    {
        sources = subtree.children(sources[0]).to_vec();
    }
    let imported: Vec<NodeId> = sources.iter().map(|&n| tree.import(subtree, n)).collect();
    tree.replace(target, &imported);
    imported
}

fn is_block_element(tree: &Tree, id: NodeId) -> bool {
    tree.name(id).is_some_and(|name| {
        name.ns == Ns::Page
            && matches!(
                name.local.as_ref(),
                "p" | "list" | "table" | "blockcode" | "div" | "blockquote" | "separator" | "h"
            )
    })
}

fn is_inline_context(tree: &Tree, id: NodeId) -> bool {
    tree.name(id).is_some_and(|name| {
        name.ns == Ns::Page
            && matches!(
                name.local.as_ref(),
                "p" | "a"
                    | "span"
                    | "emphasis"
                    | "strong"
                    | "code"
                    | "quote"
                    | "u"
                    | "ins"
                    | "del"
                    | "s"
                    | "sub"
                    | "sup"
                    | "kbd"
                    | "samp"
                    | "literal"
                    | "h"
            )
    })
}
