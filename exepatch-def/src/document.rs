//! Typed model of a parsed patch document

/// A single search pattern locating a patch site
///
/// The hex string may contain `??` wildcard tokens, each matching exactly one
/// byte. The offset is added to the match start to obtain the write position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    /// Hex byte sequence, optionally containing `??` wildcards
    pub hex: String,
    /// Signed offset from the match start to the write position
    pub offset: i64,
    /// Replacement hex overriding the entry-level replacement, if present
    pub override_hex: Option<String>,
}

impl Pattern {
    /// Create a pattern without a replacement override
    pub fn new(hex: impl Into<String>, offset: i64) -> Self {
        Self {
            hex: hex.into(),
            offset,
            override_hex: None,
        }
    }
}

/// One patch: alternative patterns plus the replacement bytes
///
/// Alternatives model "try the newer binary layout, fall back to the older
/// one". The first pattern that matches uniquely is used; the remaining
/// alternatives are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchEntry {
    /// Alternative patterns, tried in order
    pub patterns: Vec<Pattern>,
    /// Replacement hex written at the accepted position
    pub replacement: String,
}

impl PatchEntry {
    /// The replacement hex effective for a given pattern
    ///
    /// A pattern-level override takes precedence over the entry replacement.
    pub fn replacement_for<'a>(&'a self, pattern: &'a Pattern) -> &'a str {
        pattern.override_hex.as_deref().unwrap_or(&self.replacement)
    }
}

/// All patches targeting one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePatches {
    /// Normalized forward-slash path, relative to the install root
    pub path: String,
    /// Entries in document order
    pub entries: Vec<PatchEntry>,
}

/// Ordered mapping from file path to its patch entries
///
/// Insertion order is preserved for reporting; it carries no semantic weight
/// since entries target independent byte ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchDictionary {
    files: Vec<FilePatches>,
}

impl PatchDictionary {
    /// Create an empty dictionary
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert entries for a path, replacing any earlier binding of that path
    pub fn insert(&mut self, path: impl Into<String>, entries: Vec<PatchEntry>) {
        let path = path.into();
        if let Some(existing) = self.files.iter_mut().find(|f| f.path == path) {
            existing.entries = entries;
        } else {
            self.files.push(FilePatches { path, entries });
        }
    }

    /// Entries for a path, if present
    pub fn get(&self, path: &str) -> Option<&[PatchEntry]> {
        self.files
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.entries.as_slice())
    }

    /// Iterate files in insertion order
    pub fn files(&self) -> impl Iterator<Item = &FilePatches> {
        self.files.iter()
    }

    /// Number of files referenced
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Total number of entries across all files
    pub fn entry_count(&self) -> usize {
        self.files.iter().map(|f| f.entries.len()).sum()
    }

    /// True if no file has any entry
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// A fully parsed patch document: one dictionary per architecture
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchDocument {
    /// Patches for 32-bit installs
    pub patches32: PatchDictionary,
    /// Patches for 64-bit installs
    pub patches64: PatchDictionary,
    /// Entries dropped during parsing because they were malformed
    pub skipped_entries: usize,
}
