//! External collaborator interfaces.
//!
//! The core never touches storage, routing or permissions. Everything it
//! needs from the rest of the application comes through these capability
//! traits, injected per conversion request. Each oracle call is synchronous;
//! callers wanting non-blocking I/O should suspend at this boundary.

use crate::tree::Tree;

/// Why a transclusion target could not be provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeFailure {
    NotFound,
    AccessDenied,
}

impl IncludeFailure {
    /// Human-readable reason, used for inline error markers.
    pub fn reason(self) -> &'static str {
        match self {
            IncludeFailure::NotFound => "not found",
            IncludeFailure::AccessDenied => "access denied",
        }
    }
}

/// Resolves transclusion placeholders to subtrees.
pub trait IncludeOracle {
    /// Resolve a wiki-local reference (already percent-decoded) to the tree
    /// of the transcluded item. `arguments` is the placeholder's raw argument
    /// string, empty if none.
    fn resolve_include(&self, reference: &str, arguments: &str) -> Result<Tree, IncludeFailure>;
}

/// Context handed to the macro oracle alongside each invocation.
#[derive(Debug, Clone)]
pub struct MacroContext<'a> {
    /// Default locale; affects date/number macro rendering only.
    pub locale: &'a str,
    /// Base namespace of the item being converted.
    pub base_namespace: &'a str,
}

/// Resolves macro placeholders to subtrees.
pub trait MacroOracle {
    /// Resolve a macro by name. `None` means the macro is unknown, which the
    /// expansion stage turns into an inline error marker.
    fn resolve_macro(&self, name: &str, arguments: &str, context: &MacroContext<'_>)
    -> Option<Tree>;
}

/// Maps wiki-local references to canonical absolute references.
pub trait LinkOracle {
    /// Resolve a wiki-local path (possibly relative, possibly an interwiki
    /// `Prefix:Name` split). `None` means unresolvable.
    fn resolve_reference(&self, local_path: &str) -> Option<String>;
}

/// The set of oracles available to a conversion request.
///
/// Any absent oracle simply disables its transform stage: placeholders and
/// `wiki.local:` references then survive into the output in their
/// pre-resolution state.
#[derive(Default, Clone, Copy)]
pub struct Oracles<'a> {
    pub include: Option<&'a dyn IncludeOracle>,
    pub macros: Option<&'a dyn MacroOracle>,
    pub links: Option<&'a dyn LinkOracle>,
}

impl<'a> Oracles<'a> {
    /// No oracles: parse and serialize only.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_include(mut self, oracle: &'a dyn IncludeOracle) -> Self {
        self.include = Some(oracle);
        self
    }

    pub fn with_macros(mut self, oracle: &'a dyn MacroOracle) -> Self {
        self.macros = Some(oracle);
        self
    }

    pub fn with_links(mut self, oracle: &'a dyn LinkOracle) -> Self {
        self.links = Some(oracle);
        self
    }
}
