//! Parallel per-file patch application
//!
//! Each file's working buffer is independent, so files can be patched on a
//! rayon pool. Results are collected in file order (the merge barrier), so
//! the commit phase behaves identically to a sequential run. The progress
//! sink is the only shared resource; percent values are derived from an
//! atomic entry counter and may arrive slightly out of order across files.

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use exepatch_def::PatchEntry;

use crate::cancel::CancelToken;
use crate::engine::{TargetFile, apply_entry};
use crate::error::{Error, Result};
use crate::progress::{Phase, ProgressDetail, ProgressEvent, ProgressSink};
use crate::report::ReportEntry;

/// Apply entries to all files in parallel, preserving report order
pub(crate) fn apply_files_parallel(
    files: &mut [TargetFile],
    entry_sets: &[&[PatchEntry]],
    sink: &dyn ProgressSink,
    cancel: &CancelToken,
    total: usize,
) -> Result<Vec<ReportEntry>> {
    let counter = AtomicUsize::new(0);

    let nested: Vec<Vec<ReportEntry>> = files
        .par_iter_mut()
        .zip(entry_sets.par_iter())
        .map(|(file, entries)| {
            let mut lines = Vec::with_capacity(entries.len());
            for entry in *entries {
                if cancel.is_cancelled() {
                    return Err(Error::Cancelled);
                }
                let line = apply_entry(file, entry);
                let done = counter.fetch_add(1, Ordering::Relaxed) + 1;
                sink.report(ProgressEvent {
                    phase: Phase::ApplyPatches,
                    percent: Phase::ApplyPatches.percent(done, total),
                    message: format!("{}: {}", line.file, line.outcome),
                    detail: Some(ProgressDetail::Entry {
                        path: line.file.clone(),
                        outcome: line.outcome,
                    }),
                });
                lines.push(line);
            }
            Ok(lines)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(nested.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullSink;
    use exepatch_def::Pattern;
    use std::path::PathBuf;

    fn file_with(name: &str, bytes: Vec<u8>) -> TargetFile {
        TargetFile {
            rel_path: name.into(),
            disk_path: PathBuf::from(name),
            original: bytes,
            working: None,
        }
    }

    #[test]
    fn parallel_results_preserve_file_order() {
        let mut files: Vec<TargetFile> = (0..8)
            .map(|i| {
                let mut bytes = vec![0u8; 256];
                bytes[10] = 0x74;
                bytes[11] = 0x01;
                file_with(&format!("bin/f{i}.dll"), bytes)
            })
            .collect();
        let entry = PatchEntry {
            patterns: vec![Pattern::new("7401", 0)],
            replacement: "eb".into(),
        };
        let sets: Vec<Vec<PatchEntry>> = (0..8).map(|_| vec![entry.clone()]).collect();
        let set_refs: Vec<&[PatchEntry]> = sets.iter().map(Vec::as_slice).collect();

        let report =
            apply_files_parallel(&mut files, &set_refs, &NullSink, &CancelToken::new(), 8)
                .unwrap();

        let order: Vec<&str> = report.iter().map(|l| l.file.as_str()).collect();
        let expected: Vec<String> = (0..8).map(|i| format!("bin/f{i}.dll")).collect();
        assert_eq!(order, expected.iter().map(String::as_str).collect::<Vec<_>>());
        assert!(files.iter().all(|f| f.working.is_some()));
    }

    #[test]
    fn cancellation_stops_parallel_work() {
        let token = CancelToken::new();
        token.cancel();
        let mut files = vec![file_with("bin/a.dll", vec![0u8; 32])];
        let entry = PatchEntry {
            patterns: vec![Pattern::new("7401", 0)],
            replacement: "eb".into(),
        };
        let sets = [std::slice::from_ref(&entry)];

        let result = apply_files_parallel(&mut files, &sets, &NullSink, &token, 1);
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
