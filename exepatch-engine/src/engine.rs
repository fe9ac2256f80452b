//! Patch engine orchestration
//!
//! The engine drives the whole pipeline as a state machine:
//!
//! ```text
//! Idle -> DefinitionsLoaded -> FilesLoaded -> Patching -> Committing -> Done
//! ```
//!
//! with `Failed` reachable from any non-terminal state. Soft per-entry
//! outcomes accumulate into the [`RunReport`] and never abort the run; fatal
//! errors abort remaining work immediately. Files committed before a fatal
//! error stay committed — there is no cross-file rollback.

use std::io;
use std::path::PathBuf;
use std::fs;
use std::sync::Arc;

use log::{debug, info, warn};

use exepatch_def::{PatchEntry, parse_document};

use crate::backup::BackupWriter;
use crate::cancel::CancelToken;
use crate::describe::describe_transform;
use crate::error::{Error, Result};
use crate::matcher::{Signature, UniqueMatch, parse_hex, to_hex};
use crate::progress::{NullSink, Phase, ProgressDetail, ProgressEvent, ProgressSink};
use crate::report::{PatchOutcome, ReportEntry, RunReport};
use crate::resolver::{Architecture, ArchitectureResolver, ResolverConfig};

/// Configuration for a patch run
///
/// All knowledge the engine needs arrives here explicitly; nothing is read
/// from process-wide state.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Root directory of the game install
    pub install_root: PathBuf,
    /// Fixed architecture; `None` classifies the install root
    pub architecture: Option<Architecture>,
    /// Install layout used for classification and path resolution
    pub resolver: ResolverConfig,
    /// Where run backup directories are created;
    /// defaults to `<install_root>/patch-backups`
    pub backup_root: Option<PathBuf>,
    /// Stop before the commit phase and report what would change
    pub dry_run: bool,
    /// Patch files on a rayon pool; honored only with the `parallel` feature
    pub parallel: bool,
}

impl EngineConfig {
    /// Configuration with defaults for an install root
    pub fn new(install_root: impl Into<PathBuf>) -> Self {
        Self {
            install_root: install_root.into(),
            architecture: None,
            resolver: ResolverConfig::default(),
            backup_root: None,
            dry_run: false,
            parallel: false,
        }
    }
}

/// Lifecycle state of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No run started
    Idle,
    /// Dictionary selected for the install architecture
    DefinitionsLoaded,
    /// All referenced files resolved and read into memory
    FilesLoaded,
    /// Matching patterns and writing working buffers
    Patching,
    /// Backing up and rewriting files on disk
    Committing,
    /// Run finished
    Done,
    /// A fatal error aborted the run
    Failed,
}

/// A target file held in memory during a run
///
/// The original bytes are read once and never mutated; the working copy is
/// created on the first successful patch. Files whose patterns all fail are
/// never copied and never rewritten.
#[derive(Debug)]
pub(crate) struct TargetFile {
    pub(crate) rel_path: String,
    pub(crate) disk_path: PathBuf,
    pub(crate) original: Vec<u8>,
    pub(crate) working: Option<Vec<u8>>,
}

impl TargetFile {
    /// Current view: the working copy if one exists, the original otherwise
    pub(crate) fn view(&self) -> &[u8] {
        self.working.as_deref().unwrap_or(&self.original)
    }

    fn working_mut(&mut self) -> &mut Vec<u8> {
        let TargetFile {
            original, working, ..
        } = self;
        working.get_or_insert_with(|| original.clone())
    }
}

/// The pattern-based binary patching engine
pub struct PatchEngine {
    config: EngineConfig,
    sink: Arc<dyn ProgressSink>,
    cancel: CancelToken,
    state: RunState,
}

impl std::fmt::Debug for PatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatchEngine")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl PatchEngine {
    /// Create an engine with a silent progress sink
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            sink: Arc::new(NullSink),
            cancel: CancelToken::new(),
            state: RunState::Idle,
        }
    }

    /// Attach a progress sink
    pub fn with_progress(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Attach a cancellation token
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Execute the full pipeline against raw patch-definition text
    ///
    /// Returns the run report on success. On a fatal error the engine moves
    /// to [`RunState::Failed`]; anything committed before the failure stays
    /// committed.
    pub fn run(&mut self, text: &str) -> Result<RunReport> {
        let result = self.run_inner(text);
        match &result {
            Ok(report) => {
                self.state = RunState::Done;
                info!(
                    "patch run finished: {} applied, {} not found, {} ambiguous, {} invalid",
                    report.applied(),
                    report.count(PatchOutcome::NotFound),
                    report.count(PatchOutcome::Ambiguous),
                    report.count(PatchOutcome::InvalidHex),
                );
            }
            Err(err) => {
                self.state = RunState::Failed;
                warn!("patch run aborted: {err}");
            }
        }
        result
    }

    fn run_inner(&mut self, text: &str) -> Result<RunReport> {
        self.ensure_not_cancelled()?;

        // Parse phase: 0-10
        self.emit(Phase::Parse, 0, 1, "parsing patch definitions", None);
        let doc = parse_document(text)?;
        if doc.skipped_entries > 0 {
            warn!(
                "{} malformed definition(s) skipped while parsing",
                doc.skipped_entries
            );
        }

        let resolver =
            ArchitectureResolver::new(&self.config.install_root, self.config.resolver.clone());
        let arch = match self.config.architecture {
            Some(arch) => arch,
            None => resolver.classify().ok_or(Error::UnsupportedArchitecture)?,
        };
        let dict = match arch {
            Architecture::X86 => &doc.patches32,
            Architecture::X64 => &doc.patches64,
        };
        self.state = RunState::DefinitionsLoaded;
        info!(
            "selected {arch} dictionary: {} file(s), {} entr(ies)",
            dict.file_count(),
            dict.entry_count()
        );
        if dict.is_empty() {
            warn!("patch document defines nothing for {arch} installs");
        }
        self.emit(Phase::Parse, 1, 1, "patch definitions loaded", None);

        // Load phase: 10-30
        let total_files = dict.file_count();
        let mut files = Vec::with_capacity(total_files);
        for (index, fp) in dict.files().enumerate() {
            self.ensure_not_cancelled()?;
            let disk_path = resolver.resolve(&fp.path, arch)?;
            let original = fs::read(&disk_path).map_err(|source| {
                if source.kind() == io::ErrorKind::NotFound {
                    Error::MissingTargetFile {
                        path: fp.path.clone(),
                    }
                } else {
                    Error::io(disk_path.display().to_string(), source)
                }
            })?;
            debug!("loaded {} ({} bytes)", disk_path.display(), original.len());
            self.emit(
                Phase::LoadFiles,
                index + 1,
                total_files,
                format!("loaded {}", fp.path),
                Some(ProgressDetail::File {
                    path: fp.path.clone(),
                }),
            );
            files.push(TargetFile {
                rel_path: fp.path.clone(),
                disk_path,
                original,
                working: None,
            });
        }
        self.state = RunState::FilesLoaded;

        // Patch phase: 30-90, weighted by total entry count
        self.state = RunState::Patching;
        let entry_sets: Vec<&[PatchEntry]> =
            dict.files().map(|fp| fp.entries.as_slice()).collect();
        let entries = self.patch_files(&mut files, &entry_sets)?;
        self.emit(
            Phase::ApplyPatches,
            1,
            1,
            "pattern matching finished",
            None,
        );

        // Commit phase: 90-100
        self.state = RunState::Committing;
        let (committed, backup_dir) = if self.config.dry_run {
            self.emit(Phase::Commit, 1, 1, "dry run, skipping commit", None);
            (Vec::new(), None)
        } else {
            self.commit(&files)?
        };

        Ok(RunReport {
            architecture: arch,
            entries,
            committed,
            backup_dir,
            skipped_definitions: doc.skipped_entries,
        })
    }

    /// Apply every entry of every file to the in-memory working buffers
    fn patch_files(
        &self,
        files: &mut [TargetFile],
        entry_sets: &[&[PatchEntry]],
    ) -> Result<Vec<ReportEntry>> {
        let total = entry_sets.iter().map(|e| e.len()).sum();

        #[cfg(feature = "parallel")]
        if self.config.parallel {
            return crate::parallel::apply_files_parallel(
                files,
                entry_sets,
                self.sink.as_ref(),
                &self.cancel,
                total,
            );
        }

        let mut report = Vec::with_capacity(total);
        let mut done = 0usize;
        for (file, entries) in files.iter_mut().zip(entry_sets) {
            for entry in *entries {
                self.ensure_not_cancelled()?;
                let line = apply_entry(file, entry);
                done += 1;
                self.emit(
                    Phase::ApplyPatches,
                    done,
                    total,
                    format!("{}: {}", line.file, line.outcome),
                    Some(ProgressDetail::Entry {
                        path: line.file.clone(),
                        outcome: line.outcome,
                    }),
                );
                report.push(line);
            }
        }
        Ok(report)
    }

    /// Back up and rewrite every file with at least one applied patch
    fn commit(&self, files: &[TargetFile]) -> Result<(Vec<String>, Option<PathBuf>)> {
        let dirty: Vec<&TargetFile> = files.iter().filter(|f| f.working.is_some()).collect();
        if dirty.is_empty() {
            self.emit(Phase::Commit, 1, 1, "no file changed, nothing to commit", None);
            return Ok((Vec::new(), None));
        }

        let backup_root = self
            .config
            .backup_root
            .clone()
            .unwrap_or_else(|| self.config.install_root.join("patch-backups"));
        let backup = BackupWriter::create(&backup_root)?;
        info!("backing up originals to {}", backup.dir().display());

        let total = dirty.len();
        let mut committed = Vec::with_capacity(total);
        for (index, file) in dirty.iter().enumerate() {
            self.ensure_not_cancelled()?;
            let Some(working) = file.working.as_deref() else {
                continue;
            };

            backup.store(&file.rel_path, &file.original)?;
            rewrite(&file.disk_path, working)
                .map_err(|e| Error::io(file.disk_path.display().to_string(), e))?;

            // Read back and compare; a mismatch usually means a locked or
            // write-protected file
            let reread = fs::read(&file.disk_path)
                .map_err(|e| Error::io(file.disk_path.display().to_string(), e))?;
            if reread != working {
                return Err(Error::VerificationFailed {
                    path: file.rel_path.clone(),
                    backup: backup.dir().display().to_string(),
                });
            }

            committed.push(file.rel_path.clone());
            self.emit(
                Phase::Commit,
                index + 1,
                total,
                format!("committed {}", file.rel_path),
                Some(ProgressDetail::File {
                    path: file.rel_path.clone(),
                }),
            );
        }

        Ok((committed, Some(backup.dir().to_path_buf())))
    }

    fn emit(
        &self,
        phase: Phase,
        done: usize,
        total: usize,
        message: impl Into<String>,
        detail: Option<ProgressDetail>,
    ) {
        self.sink.report(ProgressEvent {
            phase,
            percent: phase.percent(done, total),
            message: message.into(),
            detail,
        });
    }

    fn ensure_not_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Try an entry's alternatives in order; first unique match wins
///
/// Later alternatives are not checked once one succeeds, matching the
/// documented first-success-wins policy. When every alternative fails, the
/// reported outcome prefers `Ambiguous` over `InvalidHex` over `NotFound`,
/// so the most actionable failure is surfaced.
pub(crate) fn apply_entry(file: &mut TargetFile, entry: &PatchEntry) -> ReportEntry {
    let mut saw_ambiguous = false;
    let mut saw_invalid = false;

    for pattern in &entry.patterns {
        let signature = match Signature::parse(&pattern.hex) {
            Ok(signature) => signature,
            Err(err) => {
                warn!("invalid pattern hex for {}: {err}", file.rel_path);
                saw_invalid = true;
                continue;
            }
        };
        let replacement = match parse_hex(entry.replacement_for(pattern)) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("invalid replacement hex for {}: {err}", file.rel_path);
                saw_invalid = true;
                continue;
            }
        };

        match signature.find_unique(file.view()) {
            UniqueMatch::NotFound => {}
            UniqueMatch::Ambiguous { first, second } => {
                warn!(
                    "pattern for {} matches at {first:#x} and {second:#x}; refusing ambiguous patch",
                    file.rel_path
                );
                saw_ambiguous = true;
            }
            UniqueMatch::Found(start) => {
                let Some(position) = write_position(
                    start,
                    pattern.offset,
                    replacement.len(),
                    file.view().len(),
                ) else {
                    warn!(
                        "replacement for {} falls outside the file bounds",
                        file.rel_path
                    );
                    saw_invalid = true;
                    continue;
                };

                let working = file.working_mut();
                let original_bytes = working[position..position + replacement.len()].to_vec();
                working[position..position + replacement.len()].copy_from_slice(&replacement);

                return ReportEntry {
                    file: file.rel_path.clone(),
                    outcome: PatchOutcome::Applied,
                    position: Some(position),
                    original_hex: Some(to_hex(&original_bytes)),
                    new_hex: Some(to_hex(&replacement)),
                    description: describe_transform(&original_bytes, &replacement),
                };
            }
        }
    }

    let outcome = if saw_ambiguous {
        PatchOutcome::Ambiguous
    } else if saw_invalid {
        PatchOutcome::InvalidHex
    } else {
        PatchOutcome::NotFound
    };
    ReportEntry::failed(file.rel_path.clone(), outcome)
}

/// Write position for a match, or `None` when the fixed-length overwrite
/// would leave the file bounds
fn write_position(start: usize, offset: i64, len: usize, file_len: usize) -> Option<usize> {
    let position = if offset < 0 {
        start.checked_sub(offset.unsigned_abs() as usize)?
    } else {
        start.checked_add(offset as usize)?
    };
    (position.checked_add(len)? <= file_len).then_some(position)
}

/// Delete and rewrite a file with the working buffer
fn rewrite(path: &std::path::Path, bytes: &[u8]) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    fs::write(path, bytes)
}
