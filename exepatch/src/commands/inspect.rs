//! Patch document inspection command

use anyhow::{Context, Result};

use exepatch_def::parse_document;

use crate::cli::InspectArgs;
use crate::utils::read_patch_text;

pub fn execute(args: InspectArgs) -> Result<()> {
    let text = read_patch_text(&args.patches)?;
    let doc = parse_document(&text).context("could not parse patch definitions")?;

    for (name, dict) in [("patches32", &doc.patches32), ("patches64", &doc.patches64)] {
        println!(
            "{name}: {} file(s), {} entries",
            dict.file_count(),
            dict.entry_count()
        );
        for fp in dict.files() {
            println!("  {} ({} entries)", fp.path, fp.entries.len());
            if args.detailed {
                for entry in &fp.entries {
                    for (index, pattern) in entry.patterns.iter().enumerate() {
                        let label = if index == 0 { "pattern" } else { "    alt" };
                        println!(
                            "    {label} {} @ {:+} -> {}",
                            pattern.hex,
                            pattern.offset,
                            entry.replacement_for(pattern)
                        );
                    }
                }
            }
        }
    }

    if doc.skipped_entries > 0 {
        println!(
            "warning: {} malformed definition(s) were skipped",
            doc.skipped_entries
        );
    }
    Ok(())
}
