//! Patch application command
//!
//! Runs the whole engine pipeline on a worker thread and drives a single
//! continuous progress bar from the engine's event channel, then prints the
//! per-entry report.

use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result, anyhow};

use exepatch_engine::{
    Architecture, ChannelSink, EngineConfig, PatchEngine, PatchOutcome, RunReport,
};

use crate::cli::{ApplyArgs, ArchChoice};
use crate::utils::progress::create_run_bar;
use crate::utils::read_patch_text;

pub fn execute(args: ApplyArgs) -> Result<()> {
    let text = read_patch_text(&args.patches)?;
    let dry_run = args.dry_run;

    let mut config = EngineConfig::new(args.root);
    config.architecture = match args.arch {
        ArchChoice::Auto => None,
        ArchChoice::X86 => Some(Architecture::X86),
        ArchChoice::X64 => Some(Architecture::X64),
    };
    config.backup_root = args.backup_dir;
    config.dry_run = dry_run;
    config.parallel = args.parallel;

    let (tx, rx) = mpsc::channel();
    // The pipeline runs off-thread; this thread only renders progress. The
    // channel closes when the engine (and its sink) is dropped.
    let worker = thread::spawn(move || {
        let mut engine = PatchEngine::new(config).with_progress(ChannelSink::new(tx));
        engine.run(&text)
    });

    let bar = create_run_bar();
    for event in rx {
        bar.set_position(u64::from(event.percent));
        bar.set_message(event.message);
    }
    let result = worker.join().map_err(|_| anyhow!("patch worker panicked"))?;
    bar.finish_and_clear();

    let report = result.context("patch run failed")?;
    print_report(&report, dry_run);
    Ok(())
}

fn print_report(report: &RunReport, dry_run: bool) {
    println!("Architecture: {}", report.architecture);
    if report.skipped_definitions > 0 {
        println!(
            "warning: {} malformed definition(s) were skipped",
            report.skipped_definitions
        );
    }
    println!();

    for entry in &report.entries {
        let position = entry
            .position
            .map_or(String::new(), |p| format!(" @ {p:#x}"));
        let bytes = match (&entry.original_hex, &entry.new_hex) {
            (Some(original), Some(new)) => format!("  {original} -> {new}"),
            _ => String::new(),
        };
        let description = entry
            .description
            .as_deref()
            .map_or(String::new(), |d| format!("  ({d})"));
        println!(
            "{:<12} {}{}{}{}",
            entry.outcome.to_string(),
            entry.file,
            position,
            bytes,
            description
        );
    }

    println!();
    println!(
        "{} applied, {} not found, {} ambiguous, {} invalid",
        report.applied(),
        report.count(PatchOutcome::NotFound),
        report.count(PatchOutcome::Ambiguous),
        report.count(PatchOutcome::InvalidHex)
    );
    if let Some(dir) = &report.backup_dir {
        println!("Backups: {}", dir.display());
    }
    if dry_run {
        println!("Dry run: no files were modified");
    }
}
