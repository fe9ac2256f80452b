//! Root CLI structure for exepatch

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "exepatch")]
#[command(about = "Apply community binary patches to game installs", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply a patch definition file to an install
    Apply(ApplyArgs),

    /// Parse a patch definition file and summarize its contents
    Inspect(InspectArgs),

    /// Detect the architecture of an install root
    Detect(DetectArgs),
}

/// Architecture selection for `apply`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ArchChoice {
    /// Probe the install root for marker executables
    Auto,
    /// Force the legacy 32-bit dictionary and layout
    #[value(name = "32")]
    X86,
    /// Force the 64-bit dictionary and layout
    #[value(name = "64")]
    X64,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Root directory of the game install
    #[arg(short, long)]
    pub root: PathBuf,

    /// Patch definition file ("-" reads from stdin)
    #[arg(short, long)]
    pub patches: PathBuf,

    /// Architecture to patch for
    #[arg(long, value_enum, default_value_t = ArchChoice::Auto)]
    pub arch: ArchChoice,

    /// Directory for run backups (default: <root>/patch-backups)
    #[arg(long)]
    pub backup_dir: Option<PathBuf>,

    /// Match and report without writing anything to disk
    #[arg(long)]
    pub dry_run: bool,

    /// Patch files in parallel
    #[arg(long)]
    pub parallel: bool,
}

#[derive(Args)]
pub struct InspectArgs {
    /// Patch definition file ("-" reads from stdin)
    #[arg(short, long)]
    pub patches: PathBuf,

    /// List every entry instead of per-file totals
    #[arg(short, long)]
    pub detailed: bool,
}

#[derive(Args)]
pub struct DetectArgs {
    /// Root directory of the game install
    #[arg(short, long)]
    pub root: PathBuf,
}
