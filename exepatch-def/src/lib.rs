//! # exepatch-def - Patch Definition Dialect
//!
//! Parser for the constrained literal dialect used to describe community
//! binary patches. A document carries two top-level assignments,
//! `patches32 = { ... }` and `patches64 = { ... }`, mapping file paths to
//! lists of patch entries:
//!
//! ```text
//! patches32 = {
//!     "bin/client.dll": [
//!         # force the version check to pass
//!         [("7401??c3", 0), "eb"],
//!         [[("7512", 0), ("7514", 0)], "eb"],
//!     ],
//! }
//! ```
//!
//! An entry pairs a pattern (or a list of alternative patterns) with a
//! replacement hex string; a pattern is `("hex", offset)` with an optional
//! third element overriding the replacement. `??` in a hex string is a
//! wildcard matching any single byte.
//!
//! Parsing is lenient where the format allows it: malformed entries are
//! skipped, counted, and logged. Only a document containing neither
//! dictionary fails.
//!
//! ## Examples
//!
//! ```
//! use exepatch_def::parse_document;
//!
//! # fn main() -> Result<(), exepatch_def::Error> {
//! let doc = parse_document(r#"patches64 = { "bin64/game.exe": [ [("7401", 0), "eb"] ] }"#)?;
//! assert_eq!(doc.patches64.entry_count(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod document;
pub mod error;
pub mod parser;
pub mod token;
pub mod tokenizer;

pub use document::{FilePatches, PatchDictionary, PatchDocument, PatchEntry, Pattern};
pub use error::{Error, Result};
pub use parser::parse_document;
pub use token::Token;
