//! Macro expansion.
//!
//! `macro` placeholder elements carry a `macro-name` and raw `macro-args`
//! attribute. The macro oracle either returns a subtree to splice in place
//! or reports the name as unknown, which becomes an inline error marker.
//! This is a single pass over the placeholders present when the stage
//! starts; macro results are not re-expanded.

use crate::oracle::{MacroContext, MacroOracle};
use crate::transform::{replace_with_error, splice_subtree};
use crate::tree::{NodeId, QName, Tree};

/// Name of the placeholder element produced by wiki-markup converters.
pub const MACRO_ELEMENT: &str = "macro";

/// Expand all macro placeholders in `tree`.
pub fn expand_macros(tree: &mut Tree, oracle: &dyn MacroOracle, context: &MacroContext<'_>) {
    let placeholders: Vec<NodeId> = tree
        .descendants(tree.root())
        .filter(|&id| tree.is_page_element(id, MACRO_ELEMENT))
        .collect();
    for node in placeholders {
        let name = tree
            .attr(node, &QName::page("macro-name"))
            .unwrap_or_default()
            .to_string();
        let arguments = tree
            .attr(node, &QName::page("macro-args"))
            .unwrap_or_default()
            .to_string();
        match oracle.resolve_macro(&name, &arguments, context) {
            Some(subtree) => {
                splice_subtree(tree, node, &subtree);
            }
            None => replace_with_error(tree, node, &format!("unknown macro: {name}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DateOracle;

    impl MacroOracle for DateOracle {
        fn resolve_macro(
            &self,
            name: &str,
            _arguments: &str,
            context: &MacroContext<'_>,
        ) -> Option<Tree> {
            if name != "Date" {
                return None;
            }
            let mut tree = Tree::new();
            let body = tree.body();
            let p = tree.append_element(body, QName::page("p"));
            tree.append_text(p, if context.locale == "de" { "1. Mai" } else { "May 1" });
            Some(tree)
        }
    }

    fn macro_tree(name: &str) -> Tree {
        let mut tree = Tree::new();
        let body = tree.body();
        let p = tree.append_element(body, QName::page("p"));
        let mac = tree.append_element(p, QName::page(MACRO_ELEMENT));
        tree.set_attr(mac, QName::page("macro-name"), name);
        tree
    }

    #[test]
    fn test_known_macro_expands_inline() {
        let mut tree = macro_tree("Date");
        let context = MacroContext {
            locale: "en",
            base_namespace: "",
        };
        expand_macros(&mut tree, &DateOracle, &context);
        assert_eq!(
            tree.to_xml_string(),
            "<page><body><p>May 1</p></body></page>"
        );
    }

    #[test]
    fn test_locale_reaches_the_oracle() {
        let mut tree = macro_tree("Date");
        let context = MacroContext {
            locale: "de",
            base_namespace: "",
        };
        expand_macros(&mut tree, &DateOracle, &context);
        assert_eq!(
            tree.to_xml_string(),
            "<page><body><p>1. Mai</p></body></page>"
        );
    }

    #[test]
    fn test_unknown_macro_becomes_error_marker() {
        let mut tree = macro_tree("NoSuchMacro");
        let context = MacroContext {
            locale: "en",
            base_namespace: "",
        };
        expand_macros(&mut tree, &DateOracle, &context);
        assert_eq!(
            tree.to_xml_string(),
            "<page><body><p><error>unknown macro: NoSuchMacro</error></p></body></page>"
        );
    }
}
