//! Full-pipeline properties: stage ordering, cycle guard, idempotence,
//! and graceful degradation when oracles are absent or fail.

use std::collections::HashMap;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use wikivert::{
    ConvertOptions, IncludeFailure, IncludeOracle, InputConverter, LinkOracle, MacroContext,
    MacroOracle, MarkdownConverter, Oracles, QName, Registry, TYPE_HTML, Tree, transform,
};

/// Include oracle backed by a map of markdown sources.
struct WikiStore {
    items: HashMap<String, String>,
}

impl WikiStore {
    fn new(items: &[(&str, &str)]) -> Self {
        Self {
            items: items
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl IncludeOracle for WikiStore {
    fn resolve_include(&self, reference: &str, _arguments: &str) -> Result<Tree, IncludeFailure> {
        match self.items.get(reference) {
            Some(source) => Ok(MarkdownConverter.convert(source, &ConvertOptions::default())),
            None => Err(IncludeFailure::NotFound),
        }
    }
}

struct SiteLinks;

impl LinkOracle for SiteLinks {
    fn resolve_reference(&self, local_path: &str) -> Option<String> {
        Some(format!("https://wiki.example.org/{local_path}"))
    }
}

struct NoMacros;

impl MacroOracle for NoMacros {
    fn resolve_macro(
        &self,
        _name: &str,
        _arguments: &str,
        _context: &MacroContext<'_>,
    ) -> Option<Tree> {
        None
    }
}

#[test]
fn test_includes_run_before_link_resolution() {
    // The transcluded item contains an unresolved local link; after the full
    // pipeline that link must be resolved, proving the stage order.
    let store = WikiStore::new(&[("sidebar", "See [[OtherPage]]")]);
    let links = SiteLinks;
    let oracles = Oracles::none().with_include(&store).with_links(&links);

    let html = Registry::default()
        .convert(
            "![](sidebar)",
            "text/x-markdown",
            TYPE_HTML,
            &ConvertOptions::default(),
            &oracles,
        )
        .expect("conversion should succeed");
    assert_eq!(
        html,
        "<p>See <a href=\"https://wiki.example.org/OtherPage\">OtherPage</a></p>"
    );
}

#[test]
fn test_transitive_cycle_renders_error_marker() {
    // a includes b, b includes a. Bounded by a timeout so a regression fails
    // instead of hanging the suite.
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let store = WikiStore::new(&[("a", "![](b)"), ("b", "![](a)")]);
        let oracles = Oracles::none().with_include(&store);
        let result = Registry::default().convert(
            "![](a)",
            "text/x-markdown",
            TYPE_HTML,
            &ConvertOptions::default(),
            &oracles,
        );
        tx.send(result).ok();
    });
    let html = rx
        .recv_timeout(Duration::from_secs(10))
        .expect("cycle guard must terminate")
        .expect("conversion should succeed");
    assert!(
        html.contains("recursive transclusion: a"),
        "expected an error marker, got: {html}"
    );
}

#[test]
fn test_sibling_reuse_is_not_a_cycle() {
    // The same item transcluded twice as siblings is fine; only the active
    // expansion path counts.
    let store = WikiStore::new(&[("note", "shared"), ("page", "![](note)\n\n![](note)")]);
    let oracles = Oracles::none().with_include(&store);
    let html = Registry::default()
        .convert(
            "![](page)",
            "text/x-markdown",
            TYPE_HTML,
            &ConvertOptions::default(),
            &oracles,
        )
        .expect("conversion should succeed");
    assert_eq!(html, "<p>shared</p><p>shared</p>");
}

#[test]
fn test_link_resolution_is_idempotent() {
    let links = SiteLinks;
    let mut tree = MarkdownConverter.convert("[[Page]] and [ext](https://x.org/)", &ConvertOptions::default());
    transform::resolve_links(&mut tree, &links);
    let once = tree.to_xml_string();
    transform::resolve_links(&mut tree, &links);
    assert_eq!(tree.to_xml_string(), once);
}

#[test]
fn test_missing_include_oracle_keeps_placeholder() {
    // With no oracle configured the placeholder survives in its
    // pre-resolution state.
    let tree = MarkdownConverter.convert("![Alt](someitem)", &ConvertOptions::default());
    assert_eq!(
        tree.to_xml_string(),
        "<page><body><p><xinclude:include html:alt=\"Alt\" \
         xinclude:href=\"wiki.local:someitem\" /></p></body></page>"
    );
}

#[test]
fn test_unknown_macro_renders_error_not_failure() {
    let mut tree = Tree::new();
    let body = tree.body();
    let p = tree.append_element(body, QName::page("p"));
    let mac = tree.append_element(p, QName::page("macro"));
    tree.set_attr(mac, QName::page("macro-name"), "TableOfContents");

    let oracles = Oracles::none().with_macros(&NoMacros);
    transform::apply(&mut tree, &ConvertOptions::default(), &oracles);
    assert_eq!(
        tree.to_xml_string(),
        "<page><body><p><error>unknown macro: TableOfContents</error></p></body></page>"
    );
}

#[test]
fn test_access_denied_is_visible_in_output() {
    struct Locked;
    impl IncludeOracle for Locked {
        fn resolve_include(&self, _: &str, _: &str) -> Result<Tree, IncludeFailure> {
            Err(IncludeFailure::AccessDenied)
        }
    }
    let oracles = Oracles::none().with_include(&Locked);
    let html = Registry::default()
        .convert(
            "![](secret)",
            "text/x-markdown",
            TYPE_HTML,
            &ConvertOptions::default(),
            &oracles,
        )
        .expect("conversion should succeed");
    assert_eq!(
        html,
        "<p><span class=\"moin-error\">transclusion of secret failed: access denied</span></p>"
    );
}

#[test]
fn test_smiley_stage_respects_extension_flag() {
    let mut options = ConvertOptions::default();
    options.extensions.smileys = true;
    let html = Registry::default()
        .convert(
            "hello :-) world",
            "text/x-markdown",
            TYPE_HTML,
            &options,
            &Oracles::none(),
        )
        .expect("conversion should succeed");
    assert_eq!(
        html,
        "<p>hello <span class=\"moin-text-icon moin-smile\">:-)</span> world</p>"
    );

    let html = Registry::default()
        .convert(
            "hello :-) world",
            "text/x-markdown",
            TYPE_HTML,
            &ConvertOptions::default(),
            &Oracles::none(),
        )
        .expect("conversion should succeed");
    assert_eq!(html, "<p>hello :-) world</p>");
}

#[test]
fn test_base_namespace_reaches_macro_oracle() {
    struct NamespaceEcho;
    impl MacroOracle for NamespaceEcho {
        fn resolve_macro(
            &self,
            name: &str,
            _arguments: &str,
            context: &MacroContext<'_>,
        ) -> Option<Tree> {
            (name == "Namespace").then(|| {
                let mut tree = Tree::new();
                let body = tree.body();
                let p = tree.append_element(body, QName::page("p"));
                tree.append_text(p, context.base_namespace);
                tree
            })
        }
    }

    let mut tree = Tree::new();
    let body = tree.body();
    let mac = tree.append_element(body, QName::page("macro"));
    tree.set_attr(mac, QName::page("macro-name"), "Namespace");

    let mut options = ConvertOptions::default();
    options.base_namespace = "users/alice".to_string();
    let oracles = Oracles::none().with_macros(&NamespaceEcho);
    transform::apply(&mut tree, &options, &oracles);
    assert_eq!(
        tree.to_xml_string(),
        "<page><body><p>users/alice</p></body></page>"
    );
}
