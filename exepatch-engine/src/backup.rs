//! Pre-patch backups
//!
//! Each run that commits anything gets one timestamped directory holding
//! byte-identical copies of every file it rewrote, mirroring the files'
//! relative paths. Backups are never deleted by the engine, not even when a
//! later step of the same run fails.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::{Error, Result};

/// Writes pristine originals into the run's backup directory
#[derive(Debug)]
pub(crate) struct BackupWriter {
    dir: PathBuf,
}

impl BackupWriter {
    /// Create the timestamped backup directory for this run under `root`
    pub(crate) fn create(root: &Path) -> Result<Self> {
        let name = Local::now().format("backup-%Y%m%d-%H%M%S").to_string();
        let dir = root.join(name);
        fs::create_dir_all(&dir).map_err(|e| Error::io(dir.display().to_string(), e))?;
        Ok(Self { dir })
    }

    /// The backup directory
    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store one file's pre-patch bytes, mirroring its relative path
    pub(crate) fn store(&self, rel_path: &str, bytes: &[u8]) -> Result<()> {
        let mut dest = self.dir.clone();
        for segment in rel_path.split('/') {
            dest.push(segment);
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent.display().to_string(), e))?;
        }
        fs::write(&dest, bytes).map_err(|e| Error::io(dest.display().to_string(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn stores_files_mirroring_relative_paths() {
        let root = TempDir::new().unwrap();
        let writer = BackupWriter::create(root.path()).unwrap();
        writer.store("bin64/client.dll", b"original bytes").unwrap();

        let stored = fs::read(writer.dir().join("bin64/client.dll")).unwrap();
        assert_eq!(stored, b"original bytes");
    }

    #[test]
    fn backup_directory_is_timestamped() {
        let root = TempDir::new().unwrap();
        let writer = BackupWriter::create(root.path()).unwrap();
        let name = writer.dir().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("backup-"), "unexpected name {name}");
    }
}
