//! Install-root classification and file path resolution
//!
//! An install root is classified as 32-bit or 64-bit by probing for marker
//! executables at known relative paths; the 64-bit marker is checked first.
//! An unclassifiable root is always a fatal condition upstream — the engine
//! never guesses an architecture.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Architecture classification of an install root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
    /// Legacy 32-bit install layout
    X86,
    /// 64-bit install layout
    X64,
}

impl Architecture {
    /// Pointer width in bits
    pub fn bits(self) -> u32 {
        match self {
            Architecture::X86 => 32,
            Architecture::X64 => 64,
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// Install layout knowledge used for classification and resolution
///
/// All values are explicit configuration passed in at construction; there
/// are no process-wide tables. The defaults match the known retail layout.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Marker executables proving a 64-bit install, relative to the root
    pub markers64: Vec<PathBuf>,
    /// Marker executables proving a legacy 32-bit install
    pub markers32: Vec<PathBuf>,
    /// Top-level binaries folder referenced by patch definitions
    pub binaries_dir: PathBuf,
    /// Nested install-specific binaries folder used by legacy layouts
    pub legacy_binaries_dir: PathBuf,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            markers64: vec![PathBuf::from("bin64/game64.exe")],
            markers32: vec![PathBuf::from("bin/game.exe")],
            binaries_dir: PathBuf::from("bin"),
            legacy_binaries_dir: PathBuf::from("game/bin"),
        }
    }
}

/// Resolves patch-document file references against an install root
#[derive(Debug, Clone)]
pub struct ArchitectureResolver {
    root: PathBuf,
    config: ResolverConfig,
}

impl ArchitectureResolver {
    /// Create a resolver for an install root
    pub fn new(root: impl Into<PathBuf>, config: ResolverConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// The install root this resolver probes
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Classify the install root, 64-bit markers first
    ///
    /// Returns `None` when no marker is present; callers must treat that as
    /// fatal rather than guessing.
    pub fn classify(&self) -> Option<Architecture> {
        if self.any_marker(&self.config.markers64) {
            return Some(Architecture::X64);
        }
        if self.any_marker(&self.config.markers32) {
            return Some(Architecture::X86);
        }
        None
    }

    fn any_marker(&self, markers: &[PathBuf]) -> bool {
        markers.iter().any(|m| self.root.join(m).is_file())
    }

    /// Resolve a normalized forward-slash reference to an on-disk path
    ///
    /// For legacy 32-bit installs, references under the top-level binaries
    /// folder are re-probed under the nested install-specific binaries
    /// folder; the nested path wins only if it exists.
    pub fn resolve(&self, reference: &str, arch: Architecture) -> Result<PathBuf> {
        let relative = sanitize(reference).ok_or_else(|| Error::UnsafePath {
            path: reference.to_string(),
        })?;

        if arch == Architecture::X86
            && let Ok(inside) = relative.strip_prefix(&self.config.binaries_dir)
        {
            let nested = self
                .root
                .join(&self.config.legacy_binaries_dir)
                .join(inside);
            if nested.exists() {
                return Ok(nested);
            }
        }
        Ok(self.root.join(relative))
    }
}

/// Reject references that could escape the install root
///
/// Absolute paths, drive prefixes, and parent-directory components are all
/// refused; the remaining components are reassembled relative to the root.
fn sanitize(reference: &str) -> Option<PathBuf> {
    use std::path::Component;

    let path = Path::new(reference);
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) | Component::ParentDir => return None,
        }
    }
    if out.as_os_str().is_empty() { None } else { Some(out) }
}
