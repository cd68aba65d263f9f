//! Transclusion expansion.
//!
//! Walks the tree in document order and replaces every `xinclude:include`
//! placeholder with the subtree the include oracle returns. Failures become
//! inline error markers and processing continues. The set of references on
//! the active expansion path is threaded explicitly through the recursion,
//! so a reference that (directly or transitively) includes itself is refused
//! with an error marker instead of looping.

use percent_encoding::percent_decode_str;

use crate::oracle::IncludeOracle;
use crate::transform::{replace_with_error, splice_subtree};
use crate::tree::{LOCAL_SCHEME, NodeId, Ns, QName, Tree};

/// Expand all transclusion placeholders in `tree`.
pub fn expand_includes(tree: &mut Tree, oracle: &dyn IncludeOracle) {
    let mut active: Vec<String> = Vec::new();
    let root = tree.root();
    expand_under(tree, root, oracle, &mut active);
}

fn expand_under(
    tree: &mut Tree,
    node: NodeId,
    oracle: &dyn IncludeOracle,
    active: &mut Vec<String>,
) {
    let children: Vec<NodeId> = tree.children(node).to_vec();
    for child in children {
        if is_include(tree, child) {
            expand_placeholder(tree, child, oracle, active);
        } else {
            expand_under(tree, child, oracle, active);
        }
    }
}

fn is_include(tree: &Tree, id: NodeId) -> bool {
    tree.name(id)
        .is_some_and(|name| name.ns == Ns::XInclude && name.local == "include")
}

fn expand_placeholder(
    tree: &mut Tree,
    node: NodeId,
    oracle: &dyn IncludeOracle,
    active: &mut Vec<String>,
) {
    let href = tree
        .attr(node, &QName::xinclude_href())
        .unwrap_or_default()
        .to_string();
    let local = href.strip_prefix(LOCAL_SCHEME).unwrap_or(&href);
    let reference = percent_decode_str(local).decode_utf8_lossy().to_string();
    let arguments = tree
        .attr(node, &QName::new(Ns::XInclude, "xpointer"))
        .unwrap_or_default()
        .to_string();

    if active.contains(&reference) {
        replace_with_error(tree, node, &format!("recursive transclusion: {reference}"));
        return;
    }

    match oracle.resolve_include(&reference, &arguments) {
        Ok(subtree) => {
            let imported = splice_subtree(tree, node, &subtree);
            // The transcluded content may itself contain includes.
            active.push(reference);
            for id in imported {
                if is_include(tree, id) {
                    expand_placeholder(tree, id, oracle, active);
                } else {
                    expand_under(tree, id, oracle, active);
                }
            }
            active.pop();
        }
        Err(failure) => {
            replace_with_error(
                tree,
                node,
                &format!("transclusion of {reference} failed: {}", failure.reason()),
            );
        }
    }
}
