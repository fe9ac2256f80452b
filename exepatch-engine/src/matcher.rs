//! Wildcard-aware byte pattern matching
//!
//! Patterns are hex strings in which the two-character token `??` matches
//! any single byte. A parsed [`Signature`] splits the pattern into concrete
//! byte runs separated by wildcard gaps; searching locates the first run
//! with a fast substring search and verifies the remaining runs at their
//! fixed offsets. The naive retry loop is O(n·m), which is fine for binaries
//! of tens of megabytes and patterns of a few hundred bytes.

use memchr::memmem;
use thiserror::Error;

/// Wildcard token in pattern hex
const WILDCARD: &str = "??";

/// Errors for hex literals in patch definitions
///
/// These are soft failures at the engine level: the affected entry is
/// reported as `InvalidHex` and the run continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HexError {
    /// Empty hex string
    #[error("empty hex string")]
    Empty,

    /// Odd number of hex digits
    #[error("hex string has an odd number of digits")]
    OddLength,

    /// Character outside `[0-9a-fA-F?]`
    #[error("invalid character {0:?} in hex string")]
    InvalidDigit(char),

    /// A pattern consisting only of wildcards matches everywhere
    #[error("pattern contains no concrete bytes")]
    AllWildcards,
}

/// Parse a plain hex string (no wildcards) into bytes
pub fn parse_hex(hex: &str) -> Result<Vec<u8>, HexError> {
    if hex.is_empty() {
        return Err(HexError::Empty);
    }
    if !hex.len().is_multiple_of(2) {
        return Err(HexError::OddLength);
    }
    let mut bytes = Vec::with_capacity(hex.len() / 2);
    let chars: Vec<char> = hex.chars().collect();
    for pair in chars.chunks(2) {
        let hi = hex_digit(pair[0])?;
        let lo = hex_digit(pair[1])?;
        bytes.push((hi << 4) | lo);
    }
    Ok(bytes)
}

/// Render bytes as lowercase hex
pub fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

fn hex_digit(c: char) -> Result<u8, HexError> {
    c.to_digit(16)
        .map(|d| d as u8)
        .ok_or(HexError::InvalidDigit(c))
}

/// One concrete byte run inside a pattern
#[derive(Debug, Clone)]
struct Run {
    /// Byte offset of the run from the pattern start
    offset: usize,
    bytes: Vec<u8>,
}

/// A parsed search pattern, possibly containing wildcard bytes
#[derive(Debug, Clone)]
pub struct Signature {
    /// Total pattern length in bytes, wildcards included
    len: usize,
    /// Concrete runs in pattern order; never empty
    runs: Vec<Run>,
}

/// Result of a uniqueness-checked search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueMatch {
    /// Exactly one occurrence
    Found(usize),
    /// No occurrence
    NotFound,
    /// More than one occurrence; patching this site is disallowed
    Ambiguous {
        /// First occurrence
        first: usize,
        /// Second occurrence found by the re-search
        second: usize,
    },
}

impl Signature {
    /// Parse pattern hex, splitting on `??` wildcard tokens
    pub fn parse(hex: &str) -> Result<Self, HexError> {
        if hex.is_empty() {
            return Err(HexError::Empty);
        }
        if !hex.len().is_multiple_of(2) {
            return Err(HexError::OddLength);
        }

        let chars: Vec<char> = hex.chars().collect();
        let mut runs: Vec<Run> = Vec::new();
        let mut current: Option<Run> = None;

        for (i, pair) in chars.chunks(2).enumerate() {
            if pair[0] == '?' || pair[1] == '?' {
                // Only the exact two-character token is a wildcard
                if pair[0] != '?' || pair[1] != '?' {
                    return Err(HexError::InvalidDigit(if pair[0] == '?' {
                        pair[1]
                    } else {
                        pair[0]
                    }));
                }
                if let Some(run) = current.take() {
                    runs.push(run);
                }
                continue;
            }
            let byte = (hex_digit(pair[0])? << 4) | hex_digit(pair[1])?;
            match current.as_mut() {
                Some(run) => run.bytes.push(byte),
                None => {
                    current = Some(Run {
                        offset: i,
                        bytes: vec![byte],
                    });
                }
            }
        }
        if let Some(run) = current.take() {
            runs.push(run);
        }
        if runs.is_empty() {
            return Err(HexError::AllWildcards);
        }

        Ok(Self {
            len: chars.len() / 2,
            runs,
        })
    }

    /// Pattern length in bytes, wildcards included
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for a zero-length pattern (cannot be constructed via `parse`)
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Find the first occurrence at or after `from`
    ///
    /// Returns the position of the pattern start. Wildcard positions match
    /// any byte value.
    pub fn find(&self, haystack: &[u8], from: usize) -> Option<usize> {
        let first = &self.runs[0];
        let finder = memmem::Finder::new(&first.bytes);
        let mut search = from.checked_add(first.offset)?;

        loop {
            if search >= haystack.len() {
                return None;
            }
            let hit = finder.find(&haystack[search..])? + search;

            // Candidate start of the whole pattern
            let Some(start) = hit.checked_sub(first.offset) else {
                search = hit + 1;
                continue;
            };
            if start + self.len <= haystack.len() && self.runs_match(haystack, start) {
                return Some(start);
            }
            search = hit + 1;
        }
    }

    /// Find and require uniqueness: a second search starts just past the
    /// first hit, and any further occurrence rejects the match
    pub fn find_unique(&self, haystack: &[u8]) -> UniqueMatch {
        match self.find(haystack, 0) {
            None => UniqueMatch::NotFound,
            Some(first) => match self.find(haystack, first + 1) {
                Some(second) => UniqueMatch::Ambiguous { first, second },
                None => UniqueMatch::Found(first),
            },
        }
    }

    fn runs_match(&self, haystack: &[u8], start: usize) -> bool {
        self.runs
            .iter()
            .all(|run| &haystack[start + run.offset..start + run.offset + run.bytes.len()] == run.bytes.as_slice())
    }
}
