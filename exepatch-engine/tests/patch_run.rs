//! End-to-end pipeline tests against a synthetic install root
//!
//! Each test builds a throwaway install layout with marker executables and
//! target binaries, runs the engine against real patch-definition text, and
//! checks the on-disk results: patched bytes, backups, and report contents.

use std::fs;
use std::path::{Path, PathBuf};

use exepatch_engine::{
    Architecture, CancelToken, ChannelSink, EngineConfig, Error, PatchOutcome, PatchEngine,
    RunState,
};
use tempfile::TempDir;

/// A 64-bit install root with one patchable client binary
fn install_64(target_bytes: &[u8]) -> (TempDir, PathBuf) {
    let root = TempDir::new().unwrap();
    write(&root.path().join("bin64/game64.exe"), b"marker");
    let target = root.path().join("bin64/client.dll");
    write(&target, target_bytes);
    (root, target)
}

fn write(path: &Path, bytes: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bytes).unwrap();
}

/// 1 KiB of zeros with `74 01` planted at each given offset
fn buffer_with_je(offsets: &[usize]) -> Vec<u8> {
    let mut bytes = vec![0u8; 1024];
    for &at in offsets {
        bytes[at] = 0x74;
        bytes[at + 1] = 0x01;
    }
    bytes
}

const FORCE_JUMP: &str = r#"
patches64 = {
    "bin64/client.dll": [
        [("7401", 0), "eb"],
    ],
}
"#;

#[test]
fn unique_pattern_is_patched_backed_up_and_verified() {
    let original = buffer_with_je(&[100]);
    let (root, target) = install_64(&original);

    let mut engine = PatchEngine::new(EngineConfig::new(root.path()));
    let report = engine.run(FORCE_JUMP).unwrap();

    assert_eq!(engine.state(), RunState::Done);
    assert_eq!(report.architecture, Architecture::X64);
    assert_eq!(report.applied(), 1);
    assert_eq!(report.committed, vec!["bin64/client.dll".to_string()]);

    // Byte 100 flipped on disk, everything else untouched
    let patched = fs::read(&target).unwrap();
    assert_eq!(patched[100], 0xeb);
    assert_eq!(patched[101], 0x01);
    assert_eq!(patched.len(), original.len());

    // Backup is byte-identical to the pre-run original
    let backup_dir = report.backup_dir.unwrap();
    let backed_up = fs::read(backup_dir.join("bin64/client.dll")).unwrap();
    assert_eq!(backed_up, original);
}

#[test]
fn ambiguous_pattern_changes_nothing_on_disk() {
    let original = buffer_with_je(&[100, 500]);
    let (root, target) = install_64(&original);

    let mut engine = PatchEngine::new(EngineConfig::new(root.path()));
    let report = engine.run(FORCE_JUMP).unwrap();

    assert_eq!(report.count(PatchOutcome::Ambiguous), 1);
    assert_eq!(report.applied(), 0);
    assert!(report.committed.is_empty());
    assert!(report.backup_dir.is_none());
    assert_eq!(fs::read(&target).unwrap(), original);
}

#[test]
fn rerun_after_patching_finds_nothing_and_never_mutates() {
    let (root, target) = install_64(&buffer_with_je(&[100]));

    let mut engine = PatchEngine::new(EngineConfig::new(root.path()));
    engine.run(FORCE_JUMP).unwrap();
    let after_first = fs::read(&target).unwrap();

    let mut engine = PatchEngine::new(EngineConfig::new(root.path()));
    let second = engine.run(FORCE_JUMP).unwrap();

    assert_eq!(second.count(PatchOutcome::NotFound), 1);
    assert_eq!(second.applied(), 0);
    assert!(second.committed.is_empty());
    assert_eq!(fs::read(&target).unwrap(), after_first);
}

#[test]
fn every_patched_file_has_a_backup() {
    let root = TempDir::new().unwrap();
    write(&root.path().join("bin64/game64.exe"), b"marker");
    let originals: Vec<(String, Vec<u8>)> = (0..3)
        .map(|i| {
            let rel = format!("bin64/part{i}.dll");
            let bytes = buffer_with_je(&[64 * (i + 1)]);
            write(&root.path().join(&rel), &bytes);
            (rel, bytes)
        })
        .collect();

    let text = r#"
patches64 = {
    "bin64/part0.dll": [ [("7401", 0), "eb"] ],
    "bin64/part1.dll": [ [("7401", 0), "eb"] ],
    "bin64/part2.dll": [ [("7401", 0), "eb"] ],
}
"#;
    let mut engine = PatchEngine::new(EngineConfig::new(root.path()));
    let report = engine.run(text).unwrap();

    assert_eq!(report.applied(), 3);
    assert_eq!(report.committed.len(), 3);

    let backup_dir = report.backup_dir.unwrap();
    for (rel, original) in &originals {
        let stored = fs::read(backup_dir.join(rel)).unwrap();
        assert_eq!(&stored, original, "{rel} backup differs");
    }
}

#[test]
fn missing_target_file_aborts_before_patching() {
    let (root, target) = install_64(&buffer_with_je(&[100]));

    let text = r#"
patches64 = {
    "bin64/client.dll": [ [("7401", 0), "eb"] ],
    "bin64/absent.dll": [ [("7401", 0), "eb"] ],
}
"#;
    let mut engine = PatchEngine::new(EngineConfig::new(root.path()));
    let err = engine.run(text).unwrap_err();

    assert!(matches!(err, Error::MissingTargetFile { ref path } if path == "bin64/absent.dll"));
    assert_eq!(engine.state(), RunState::Failed);
    // Fail-fast: the present file was not patched either
    assert_eq!(fs::read(&target).unwrap(), buffer_with_je(&[100]));
}

#[test]
fn unclassifiable_root_is_fatal() {
    let root = TempDir::new().unwrap();
    let mut engine = PatchEngine::new(EngineConfig::new(root.path()));
    assert!(matches!(
        engine.run(FORCE_JUMP),
        Err(Error::UnsupportedArchitecture)
    ));
}

#[test]
fn document_without_dictionaries_is_fatal() {
    let (root, _) = install_64(&buffer_with_je(&[100]));
    let mut engine = PatchEngine::new(EngineConfig::new(root.path()));
    assert!(matches!(engine.run("junk"), Err(Error::Definition(_))));
}

#[test]
fn other_architectures_dictionary_yields_an_empty_run() {
    // Document only defines 64-bit patches; force a 32-bit run
    let root = TempDir::new().unwrap();
    write(&root.path().join("bin/game.exe"), b"marker");

    let mut config = EngineConfig::new(root.path());
    config.architecture = Some(Architecture::X86);
    let mut engine = PatchEngine::new(config);
    let report = engine.run(FORCE_JUMP).unwrap();

    assert!(report.entries.is_empty());
    assert!(report.committed.is_empty());
}

#[test]
fn dry_run_reports_but_does_not_commit() {
    let original = buffer_with_je(&[100]);
    let (root, target) = install_64(&original);

    let mut config = EngineConfig::new(root.path());
    config.dry_run = true;
    let mut engine = PatchEngine::new(config);
    let report = engine.run(FORCE_JUMP).unwrap();

    assert_eq!(report.applied(), 1);
    assert!(report.committed.is_empty());
    assert!(report.backup_dir.is_none());
    assert_eq!(fs::read(&target).unwrap(), original);
}

#[test]
fn progress_covers_the_full_bar_monotonically() {
    let (root, _) = install_64(&buffer_with_je(&[100]));

    let (tx, rx) = std::sync::mpsc::channel();
    let mut engine =
        PatchEngine::new(EngineConfig::new(root.path())).with_progress(ChannelSink::new(tx));
    engine.run(FORCE_JUMP).unwrap();

    let events: Vec<_> = rx.try_iter().collect();
    assert!(!events.is_empty());
    assert_eq!(events.first().unwrap().percent, 0);
    assert_eq!(events.last().unwrap().percent, 100);
    for pair in events.windows(2) {
        assert!(
            pair[0].percent <= pair[1].percent,
            "progress went backwards: {} then {}",
            pair[0].percent,
            pair[1].percent
        );
    }
}

#[test]
fn cancelled_token_stops_the_run() {
    let (root, target) = install_64(&buffer_with_je(&[100]));

    let token = CancelToken::new();
    token.cancel();
    let mut engine =
        PatchEngine::new(EngineConfig::new(root.path())).with_cancel_token(token);

    assert!(matches!(engine.run(FORCE_JUMP), Err(Error::Cancelled)));
    assert_eq!(fs::read(&target).unwrap(), buffer_with_je(&[100]));
}

#[test]
fn wildcard_patterns_match_independent_of_wildcard_bytes() {
    let mut bytes = vec![0u8; 512];
    bytes[200] = 0x90;
    bytes[201] = 0x5a; // arbitrary wildcard byte
    bytes[202] = 0x90;
    let (root, target) = install_64(&bytes);

    let text = r#"
patches64 = {
    "bin64/client.dll": [ [("90??90", 1), "cc"] ],
}
"#;
    let mut engine = PatchEngine::new(EngineConfig::new(root.path()));
    let report = engine.run(text).unwrap();

    assert_eq!(report.applied(), 1);
    assert_eq!(fs::read(&target).unwrap()[201], 0xcc);
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_run_matches_sequential_results() {
    let build = |root: &TempDir| {
        write(&root.path().join("bin64/game64.exe"), b"marker");
        for i in 0..4 {
            write(
                &root.path().join(format!("bin64/part{i}.dll")),
                &buffer_with_je(&[128]),
            );
        }
    };
    let text = r#"
patches64 = {
    "bin64/part0.dll": [ [("7401", 0), "eb"] ],
    "bin64/part1.dll": [ [("7401", 0), "eb"] ],
    "bin64/part2.dll": [ [("7401", 0), "eb"] ],
    "bin64/part3.dll": [ [("7401", 0), "eb"] ],
}
"#;

    let sequential_root = TempDir::new().unwrap();
    build(&sequential_root);
    let mut engine = PatchEngine::new(EngineConfig::new(sequential_root.path()));
    let sequential = engine.run(text).unwrap();

    let parallel_root = TempDir::new().unwrap();
    build(&parallel_root);
    let mut config = EngineConfig::new(parallel_root.path());
    config.parallel = true;
    let mut engine = PatchEngine::new(config);
    let parallel = engine.run(text).unwrap();

    assert_eq!(parallel.applied(), sequential.applied());
    assert_eq!(parallel.committed, sequential.committed);
    for i in 0..4 {
        let rel = format!("bin64/part{i}.dll");
        assert_eq!(
            fs::read(parallel_root.path().join(&rel)).unwrap(),
            fs::read(sequential_root.path().join(&rel)).unwrap(),
        );
    }
}
