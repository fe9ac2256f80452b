//! CLI integration tests
//!
//! These exercise real invocations of the exepatch binary against synthetic
//! install roots built in temporary directories.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const PATCHES: &str = r#"
patches64 = {
    "bin64/client.dll": [
        [("7401", 0), "eb"],
    ],
}
"#;

fn write(path: &Path, bytes: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bytes).unwrap();
}

/// 64-bit install root with one patchable binary; returns the root dir
fn install_64() -> TempDir {
    let root = TempDir::new().unwrap();
    write(&root.path().join("bin64/game64.exe"), b"marker");
    let mut client = vec![0u8; 1024];
    client[100] = 0x74;
    client[101] = 0x01;
    write(&root.path().join("bin64/client.dll"), &client);
    root
}

fn patches_file(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("patches.txt");
    fs::write(&path, PATCHES).unwrap();
    path
}

#[test]
fn apply_patches_an_install_end_to_end() {
    let root = install_64();
    let patches = patches_file(&root);

    Command::cargo_bin("exepatch")
        .unwrap()
        .args(["apply", "--root"])
        .arg(root.path())
        .arg("--patches")
        .arg(&patches)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 applied"))
        .stdout(predicate::str::contains("Architecture: 64-bit"));

    let patched = fs::read(root.path().join("bin64/client.dll")).unwrap();
    assert_eq!(patched[100], 0xeb);
}

#[test]
fn dry_run_leaves_the_install_untouched() {
    let root = install_64();
    let patches = patches_file(&root);

    Command::cargo_bin("exepatch")
        .unwrap()
        .args(["apply", "--dry-run", "--root"])
        .arg(root.path())
        .arg("--patches")
        .arg(&patches)
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));

    let untouched = fs::read(root.path().join("bin64/client.dll")).unwrap();
    assert_eq!(untouched[100], 0x74);
}

#[test]
fn detect_reports_the_install_architecture() {
    let root = install_64();

    Command::cargo_bin("exepatch")
        .unwrap()
        .args(["detect", "--root"])
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("64-bit"));
}

#[test]
fn detect_fails_on_an_unclassifiable_root() {
    let root = TempDir::new().unwrap();

    Command::cargo_bin("exepatch")
        .unwrap()
        .args(["detect", "--root"])
        .arg(root.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot classify"));
}

#[test]
fn inspect_summarizes_the_document() {
    let root = TempDir::new().unwrap();
    let patches = root.path().join("patches.txt");
    fs::write(&patches, PATCHES).unwrap();

    Command::cargo_bin("exepatch")
        .unwrap()
        .args(["inspect", "--detailed", "--patches"])
        .arg(&patches)
        .assert()
        .success()
        .stdout(predicate::str::contains("patches64: 1 file(s), 1 entries"))
        .stdout(predicate::str::contains("7401"));
}

#[test]
fn apply_fails_cleanly_on_garbage_definitions() {
    let root = install_64();
    let patches = root.path().join("patches.txt");
    fs::write(&patches, "not a patch document").unwrap();

    Command::cargo_bin("exepatch")
        .unwrap()
        .args(["apply", "--root"])
        .arg(root.path())
        .arg("--patches")
        .arg(&patches)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no patch dictionaries"));
}
