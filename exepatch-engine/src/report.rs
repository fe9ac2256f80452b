//! Per-run patch report

use std::fmt;
use std::path::PathBuf;

use crate::resolver::Architecture;

/// Outcome of a single patch entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatchOutcome {
    /// Pattern found uniquely; replacement written to the working buffer
    Applied,
    /// No alternative pattern matched
    NotFound,
    /// A pattern matched more than once; the site was rejected as unsafe
    Ambiguous,
    /// Pattern or replacement hex was invalid, or the write fell out of bounds
    InvalidHex,
}

impl fmt::Display for PatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            PatchOutcome::Applied => "applied",
            PatchOutcome::NotFound => "not found",
            PatchOutcome::Ambiguous => "ambiguous",
            PatchOutcome::InvalidHex => "invalid hex",
        };
        f.write_str(text)
    }
}

/// Report line for one attempted patch entry
#[derive(Debug, Clone)]
pub struct ReportEntry {
    /// Normalized path of the target file
    pub file: String,
    /// What happened
    pub outcome: PatchOutcome,
    /// Write position within the file, for applied entries
    pub position: Option<usize>,
    /// Bytes replaced, lowercase hex, for applied entries
    pub original_hex: Option<String>,
    /// Bytes written, lowercase hex, for applied entries
    pub new_hex: Option<String>,
    /// Human-readable description of a recognized opcode transform
    pub description: Option<String>,
}

impl ReportEntry {
    /// A non-applied outcome with no byte detail
    pub(crate) fn failed(file: impl Into<String>, outcome: PatchOutcome) -> Self {
        Self {
            file: file.into(),
            outcome,
            position: None,
            original_hex: None,
            new_hex: None,
            description: None,
        }
    }
}

/// Everything a run produced, soft failures included
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Architecture the run patched for
    pub architecture: Architecture,
    /// One line per attempted entry, in document order
    pub entries: Vec<ReportEntry>,
    /// Files actually rewritten on disk, in commit order
    pub committed: Vec<String>,
    /// Backup directory for this run, if anything was committed
    pub backup_dir: Option<PathBuf>,
    /// Entries dropped while parsing the patch document
    pub skipped_definitions: usize,
}

impl RunReport {
    /// Number of entries with the given outcome
    pub fn count(&self, outcome: PatchOutcome) -> usize {
        self.entries.iter().filter(|e| e.outcome == outcome).count()
    }

    /// Number of applied entries
    pub fn applied(&self) -> usize {
        self.count(PatchOutcome::Applied)
    }

    /// True if every attempted entry was applied
    pub fn is_clean(&self) -> bool {
        self.applied() == self.entries.len() && self.skipped_definitions == 0
    }
}
