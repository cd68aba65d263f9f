//! Per-request conversion configuration.

use serde::{Deserialize, Serialize};

/// Options recognized by the conversion pipeline.
///
/// All fields have serde defaults, so callers that persist configuration can
/// deserialize partial tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Syntax extensions enabled for input converters.
    pub extensions: Extensions,
    /// Default locale, passed to the macro oracle. Affects date/number macro
    /// rendering only, never parsing.
    pub locale_default: String,
    /// Base namespace used by the link oracle to resolve bare item references.
    pub base_namespace: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            extensions: Extensions::default(),
            locale_default: "en".to_string(),
            base_namespace: String::new(),
        }
    }
}

/// Toggleable syntax extensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Extensions {
    pub tables: bool,
    pub admonitions: bool,
    pub wikilinks: bool,
    pub definition_lists: bool,
    pub fenced_code: bool,
    /// Smiley substitution runs as a transform stage, not in the parsers.
    pub smileys: bool,
}

impl Default for Extensions {
    fn default() -> Self {
        Self {
            tables: true,
            admonitions: true,
            wikilinks: true,
            definition_lists: true,
            fenced_code: true,
            smileys: false,
        }
    }
}
