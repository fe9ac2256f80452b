//! Error types for the patch-definition parser

use thiserror::Error;

/// Result type alias for patch-definition parsing
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing a patch document
///
/// Individual malformed entries are not errors: they are skipped, counted,
/// and logged, and parsing continues. Only a document without any patch
/// dictionary is fatal.
#[derive(Error, Debug)]
pub enum Error {
    /// Neither `patches32` nor `patches64` was found in the document
    #[error("malformed patch document: no patch dictionaries found")]
    MalformedDocument,
}
