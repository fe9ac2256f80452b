//! Shared CLI utilities

pub mod progress;

use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

/// Read a patch definition file, or stdin when the path is `-`
pub fn read_patch_text(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read patch definitions from stdin")?;
        Ok(text)
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("failed to read patch definitions from {}", path.display()))
    }
}
