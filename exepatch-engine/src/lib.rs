//! # exepatch-engine - Binary Patching Engine
//!
//! Applies declaratively-described byte patches to game binaries. Patch
//! sites are located by hex patterns with `??` wildcards; a site is only
//! patched when the pattern occurs exactly once in the target file, trading
//! recall for safety. Originals are backed up before anything is rewritten,
//! and every commit is read back and verified.
//!
//! The pipeline runs as one logical operation:
//!
//! 1. Parse the patch document ([`exepatch_def`])
//! 2. Classify the install root and select the matching dictionary
//! 3. Resolve and load every referenced file
//! 4. Match patterns and build per-file working buffers
//! 5. Back up originals, rewrite changed files, verify the written bytes
//!
//! Per-entry failures (pattern not found, ambiguous, invalid hex) never
//! abort the run; they are accumulated into the [`RunReport`]. Fatal errors
//! abort immediately, and files committed beforehand stay committed.
//!
//! ## Examples
//!
//! ```no_run
//! use exepatch_engine::{EngineConfig, PatchEngine};
//!
//! # fn main() -> exepatch_engine::Result<()> {
//! let text = r#"patches64 = { "bin64/client.dll": [ [("7401", 0), "eb"] ] }"#;
//! let mut engine = PatchEngine::new(EngineConfig::new("/games/example"));
//! let report = engine.run(text)?;
//! println!("{} patch(es) applied", report.applied());
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

mod backup;
pub mod cancel;
pub mod describe;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod progress;
pub mod report;
pub mod resolver;

#[cfg(feature = "parallel")]
mod parallel;

pub use cancel::CancelToken;
pub use describe::describe_transform;
pub use engine::{EngineConfig, PatchEngine, RunState};
pub use error::{Error, Result};
pub use matcher::{HexError, Signature, UniqueMatch, parse_hex, to_hex};
pub use progress::{ChannelSink, NullSink, Phase, ProgressDetail, ProgressEvent, ProgressSink};
pub use report::{PatchOutcome, ReportEntry, RunReport};
pub use resolver::{Architecture, ArchitectureResolver, ResolverConfig};
