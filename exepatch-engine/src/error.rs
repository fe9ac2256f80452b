//! Error types for the patching engine

use std::io;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors that abort a patch run
///
/// Per-entry failures (pattern not found, ambiguous match, invalid hex) are
/// not errors; they are accumulated into the run report. Everything here
/// stops the remaining pipeline immediately. Files committed before a fatal
/// error stay committed; there is no cross-file rollback.
#[derive(Error, Debug)]
pub enum Error {
    /// The patch document could not be parsed at all
    #[error(transparent)]
    Definition(#[from] exepatch_def::Error),

    /// The install root could not be classified as 32-bit or 64-bit
    #[error("could not determine the install architecture; refusing to patch blindly")]
    UnsupportedArchitecture,

    /// A file referenced by the selected dictionary is missing on disk
    #[error("required target file missing: {path}")]
    MissingTargetFile {
        /// Path as referenced by the patch document
        path: String,
    },

    /// A patch definition references a path outside the install root
    #[error("patch definition escapes the install root: {path}")]
    UnsafePath {
        /// Offending path from the patch document
        path: String,
    },

    /// A committed file did not read back byte-identical to the patched data
    ///
    /// Usually a locked or write-protected file. The backup written earlier
    /// in the run is left in place.
    #[error(
        "verification failed for {path}: the file on disk does not match the patched data. \
         Close the game if it is running, check file permissions, and restore from the \
         backup at {backup} if needed"
    )]
    VerificationFailed {
        /// File that failed verification
        path: String,
        /// Backup directory holding the pristine copy
        backup: String,
    },

    /// The run was cancelled between units of work
    #[error("patch run cancelled")]
    Cancelled,

    /// I/O failure with file context
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File the operation touched
        path: String,
        /// Underlying error
        source: io::Error,
    },
}

impl Error {
    /// Attach file context to an I/O error
    pub(crate) fn io(path: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
