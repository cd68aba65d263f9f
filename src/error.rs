//! Error types for wikivert operations.

use thiserror::Error;

/// Errors that can abort a conversion request.
///
/// Everything that can go wrong *inside* a document (malformed markup,
/// unresolvable links, missing transclusion targets, unknown macros) is
/// recovered locally and recorded in the tree as an `error` element, so the
/// document still renders. The variants here are the only conditions reported
/// to the caller instead.
#[derive(Error, Debug)]
pub enum Error {
    /// No input converter for the source type, or no output converter for
    /// the target type. Raised before any parsing begins.
    #[error("unsupported conversion: {source_type} -> {target_type}")]
    UnsupportedConversion {
        source_type: String,
        target_type: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
