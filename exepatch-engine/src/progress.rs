//! Structured progress reporting
//!
//! The engine emits [`ProgressEvent`]s at every phase transition and after
//! every file and entry processed. Percent ranges are allocated contiguously
//! across phases so a consumer can render one continuous 0-100 bar.

use std::sync::mpsc::Sender;

use crate::report::PatchOutcome;

/// Pipeline phase, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Parsing the patch document and selecting a dictionary
    Parse,
    /// Resolving and reading target files
    LoadFiles,
    /// Matching patterns and writing working buffers
    ApplyPatches,
    /// Backing up originals and rewriting files on disk
    Commit,
}

impl Phase {
    /// Inclusive percent range assigned to this phase
    pub fn range(self) -> (u8, u8) {
        match self {
            Phase::Parse => (0, 10),
            Phase::LoadFiles => (10, 30),
            Phase::ApplyPatches => (30, 90),
            Phase::Commit => (90, 100),
        }
    }

    /// Percent after completing `done` of `total` units of this phase
    pub(crate) fn percent(self, done: usize, total: usize) -> u8 {
        let (lo, hi) = self.range();
        if total == 0 {
            return hi;
        }
        let span = u64::from(hi - lo);
        lo + (span * done.min(total) as u64 / total as u64) as u8
    }
}

/// Structured detail attached to some events
#[derive(Debug, Clone)]
pub enum ProgressDetail {
    /// A target file was loaded or committed
    File {
        /// Normalized path of the file
        path: String,
    },
    /// A patch entry was attempted
    Entry {
        /// Normalized path of the target file
        path: String,
        /// Outcome of the attempt
        outcome: PatchOutcome,
    },
}

/// One progress update
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Current phase
    pub phase: Phase,
    /// Overall progress, 0-100
    pub percent: u8,
    /// Short human-readable message
    pub message: String,
    /// Structured detail, when an event concerns a specific file or entry
    pub detail: Option<ProgressDetail>,
}

/// Consumer of progress events
///
/// Sinks may be called from worker threads when parallel patching is
/// enabled, hence the `Send + Sync` bound. The sink is the only resource
/// shared across workers.
pub trait ProgressSink: Send + Sync {
    /// Deliver one event; implementations should not block
    fn report(&self, event: ProgressEvent);
}

/// Sink that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn report(&self, _event: ProgressEvent) {}
}

/// Sink delivering events over an mpsc channel
///
/// Decouples the engine from its consumer: the receiving end can live on a
/// UI thread and drain events at its own pace. A disconnected receiver is
/// ignored; progress is best-effort.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<ProgressEvent>,
}

impl ChannelSink {
    /// Wrap a channel sender
    pub fn new(sender: Sender<ProgressEvent>) -> Self {
        Self { sender }
    }
}

impl ProgressSink for ChannelSink {
    fn report(&self, event: ProgressEvent) {
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_ranges_are_contiguous() {
        let phases = [Phase::Parse, Phase::LoadFiles, Phase::ApplyPatches, Phase::Commit];
        assert_eq!(phases[0].range().0, 0);
        assert_eq!(phases[3].range().1, 100);
        for pair in phases.windows(2) {
            assert_eq!(pair[0].range().1, pair[1].range().0);
        }
    }

    #[test]
    fn percent_interpolates_within_range() {
        assert_eq!(Phase::ApplyPatches.percent(0, 4), 30);
        assert_eq!(Phase::ApplyPatches.percent(2, 4), 60);
        assert_eq!(Phase::ApplyPatches.percent(4, 4), 90);
    }

    #[test]
    fn empty_phase_reports_completion() {
        assert_eq!(Phase::LoadFiles.percent(0, 0), 30);
    }

    #[test]
    fn channel_sink_delivers_events() {
        let (tx, rx) = std::sync::mpsc::channel();
        let sink = ChannelSink::new(tx);
        sink.report(ProgressEvent {
            phase: Phase::Parse,
            percent: 5,
            message: "parsing".into(),
            detail: None,
        });
        let event = rx.recv().unwrap();
        assert_eq!(event.phase, Phase::Parse);
        assert_eq!(event.percent, 5);
    }
}
