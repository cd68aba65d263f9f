//! Link resolution.
//!
//! Rewrites every `xlink:href` / `xinclude:href` carrying the `wiki.local:`
//! prefix through the link oracle. Absolute references pass through
//! untouched, which makes the stage idempotent. An unresolvable reference
//! keeps its content but is wrapped in an error marker with the href
//! removed, so the failure is visible in the rendered output and a re-run
//! has nothing left to resolve.

use percent_encoding::percent_decode_str;

use crate::oracle::LinkOracle;
use crate::tree::{LOCAL_SCHEME, NodeId, QName, Tree};

/// Resolve all wiki-local references in `tree`.
pub fn resolve_links(tree: &mut Tree, oracle: &dyn LinkOracle) {
    let keys = [QName::xlink_href(), QName::xinclude_href()];
    let candidates: Vec<NodeId> = tree
        .descendants(tree.root())
        .filter(|&id| {
            keys.iter()
                .any(|key| tree.attr(id, key).is_some_and(|v| v.starts_with(LOCAL_SCHEME)))
        })
        .collect();

    for node in candidates {
        for key in &keys {
            let Some(href) = tree.attr(node, key) else {
                continue;
            };
            let Some(local) = href.strip_prefix(LOCAL_SCHEME) else {
                continue;
            };
            let reference = percent_decode_str(local).decode_utf8_lossy().to_string();
            match oracle.resolve_reference(&reference) {
                Some(absolute) => tree.set_attr(node, key.clone(), absolute),
                None => {
                    tree.remove_attr(node, key);
                    wrap_in_error(tree, node, &format!("unresolved reference: {reference}"));
                }
            }
        }
    }
}

/// Wrap `node` in an error marker, preserving its content.
fn wrap_in_error(tree: &mut Tree, node: NodeId, reason: &str) {
    let marker = tree.new_element(QName::page("error"));
    tree.set_attr(marker, QName::page("reason"), reason);
    tree.replace(node, &[marker]);
    tree.attach(marker, node);
}
