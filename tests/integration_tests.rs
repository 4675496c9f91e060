use std::fs;
/// Integration tests for wavsort
///
/// These tests drive the library the way the binary does, against real
/// temporary directories.
///
/// Test categories:
/// 1. Basic organization workflows
/// 2. File name matching
/// 3. Overwrites and source safety
/// 4. Dry-run mode
/// 5. Configuration and filtering
/// 6. Undo
/// 7. Error scenarios
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wavsort::cli::{OrganizeCommand, run_cli_with_config};

// ============================================================================
// Test Utilities
// ============================================================================

/// A source directory, a destination directory and a config file, all
/// temporary. The config lives in its own directory so the destination only
/// ever holds what a run put there.
struct TestFixture {
    source: TempDir,
    destination: TempDir,
    _config_dir: TempDir,
    config_path: PathBuf,
}

impl TestFixture {
    /// Create a fixture with an empty configuration.
    fn new() -> Self {
        Self::with_config("")
    }

    /// Create a fixture whose configuration file holds `config`.
    fn with_config(config: &str) -> Self {
        let source = TempDir::new().expect("Failed to create temp directory");
        let destination = TempDir::new().expect("Failed to create temp directory");
        let config_dir = TempDir::new().expect("Failed to create temp directory");
        let config_path = config_dir.path().join("wavsort.toml");
        fs::write(&config_path, config).expect("Failed to write config");
        TestFixture {
            source,
            destination,
            _config_dir: config_dir,
            config_path,
        }
    }

    fn src(&self) -> &Path {
        self.source.path()
    }

    fn dest(&self) -> &Path {
        self.destination.path()
    }

    /// Create a file with content in the source directory.
    fn create_recording(&self, name: &str, content: &[u8]) {
        fs::write(self.src().join(name), content).expect("Failed to create file");
    }

    fn organize(&self, dry_run: bool) -> Result<(), String> {
        self.run_organize(dry_run, false)
    }

    /// Real run that also records history, so it can be undone.
    fn organize_with_history(&self) -> Result<(), String> {
        self.run_organize(false, true)
    }

    fn run_organize(&self, dry_run: bool, record_history: bool) -> Result<(), String> {
        run_cli_with_config(
            OrganizeCommand::Organize {
                source: self.src().to_path_buf(),
                destination: self.dest().to_path_buf(),
                dry_run,
                verify_wav: false,
                record_history,
            },
            Some(&self.config_path),
        )
    }

    fn undo(&self) -> Result<(), String> {
        run_cli_with_config(
            OrganizeCommand::Undo {
                destination: self.dest().to_path_buf(),
            },
            Some(&self.config_path),
        )
    }

    /// Assert that a file exists under the destination.
    fn assert_copied(&self, rel_path: &str) {
        let path = self.dest().join(rel_path);
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    fn assert_not_in_dest(&self, rel_path: &str) {
        let path = self.dest().join(rel_path);
        assert!(!path.exists(), "Path should not exist: {}", path.display());
    }

    /// All files under the destination, relative to it.
    fn dest_files(&self) -> Vec<String> {
        let mut files = Vec::new();
        walk_dir(self.dest(), self.dest(), &mut files);
        files.sort();
        files
    }

    /// Names directly under the destination root.
    fn dest_top_level(&self) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(self.dest())
            .expect("Failed to read directory")
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Snapshot of every source file name and its bytes.
    fn source_snapshot(&self) -> Vec<(String, Vec<u8>)> {
        let mut snapshot: Vec<_> = fs::read_dir(self.src())
            .expect("Failed to read directory")
            .flatten()
            .filter(|e| e.path().is_file())
            .map(|e| {
                (
                    e.file_name().to_string_lossy().into_owned(),
                    fs::read(e.path()).expect("Failed to read file"),
                )
            })
            .collect();
        snapshot.sort();
        snapshot
    }
}

fn walk_dir(root: &Path, dir: &Path, files: &mut Vec<String>) {
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() {
                let rel = path.strip_prefix(root).expect("path under root");
                files.push(rel.to_string_lossy().replace('\\', "/"));
            } else if path.is_dir() {
                walk_dir(root, &path, files);
            }
        }
    }
}

/// Smallest RIFF/WAVE header that content sniffing recognizes.
const WAV_HEADER: &[u8] = b"RIFF\x24\x00\x00\x00WAVEfmt \x10\x00\x00\x00\x01\x00\x01\x00\x44\xac\x00\x00\x88\x58\x01\x00\x02\x00\x10\x00data\x00\x00\x00\x00";

// ============================================================================
// Test Suite 1: Basic Organization
// ============================================================================

#[test]
fn test_organize_empty_directory() {
    let fixture = TestFixture::new();

    assert!(fixture.organize(false).is_ok());
    assert!(fixture.dest_files().is_empty());
}

#[test]
fn test_organize_mixed_scenario() {
    let fixture = TestFixture::new();
    fixture.create_recording("X_10_00001.wav", WAV_HEADER);
    fixture.create_recording("X_10_00002.wav", WAV_HEADER);
    fixture.create_recording("Y_02_00099.wav", WAV_HEADER);
    fixture.create_recording("readme.md", b"# field notes");

    assert!(fixture.organize(false).is_ok());

    assert_eq!(
        fixture.dest_files(),
        [
            "X/10/X_10_00001.wav",
            "X/10/X_10_00002.wav",
            "Y/02/Y_02_00099.wav",
        ]
    );
    assert_eq!(fixture.dest_top_level(), ["X", "Y"]);
}

#[test]
fn test_destination_path_is_deterministic() {
    let fixture = TestFixture::new();
    fixture.create_recording("B7_03_00042.wav", WAV_HEADER);

    assert!(fixture.organize(false).is_ok());
    fixture.assert_copied("B7/03/B7_03_00042.wav");
}

#[test]
fn test_shared_day_directory_created_once() {
    let fixture = TestFixture::new();
    fixture.create_recording("A_01_00001.wav", b"one");
    fixture.create_recording("A_01_00002.wav", b"two");

    assert!(fixture.organize(false).is_ok());

    let day_entries = fs::read_dir(fixture.dest().join("A"))
        .expect("bird directory exists")
        .count();
    assert_eq!(day_entries, 1);
    assert_eq!(fixture.dest_files(), ["A/01/A_01_00001.wav", "A/01/A_01_00002.wav"]);
}

#[test]
fn test_destination_root_created_when_missing() {
    let fixture = TestFixture::new();
    fixture.create_recording("A_01_00001.wav", b"one");
    let nested = fixture.dest().join("season").join("2024");

    let result = run_cli_with_config(
        OrganizeCommand::Organize {
            source: fixture.src().to_path_buf(),
            destination: nested.clone(),
            dry_run: false,
            verify_wav: false,
            record_history: false,
        },
        Some(&fixture.config_path),
    );

    assert!(result.is_ok(), "Result error: {:?}", result.err());
    assert!(nested.join("A/01/A_01_00001.wav").is_file());
}

#[test]
fn test_organize_twice_is_stable() {
    let fixture = TestFixture::new();
    fixture.create_recording("A_01_00001.wav", b"one");

    assert!(fixture.organize(false).is_ok());
    assert!(fixture.organize(false).is_ok());

    assert_eq!(fixture.dest_files(), ["A/01/A_01_00001.wav"]);
}

// ============================================================================
// Test Suite 2: File Name Matching
// ============================================================================

#[test]
fn test_greedy_bird_id() {
    let fixture = TestFixture::new();
    fixture.create_recording("A1_02_01_00001.wav", b"data");

    assert!(fixture.organize(false).is_ok());
    fixture.assert_copied("A1_02/01/A1_02_01_00001.wav");
}

#[test]
fn test_non_matching_files_are_skipped() {
    let fixture = TestFixture::new();
    fixture.create_recording("notes.txt", b"notes");
    fixture.create_recording("bird1_1_00001.wav", b"short day");
    fixture.create_recording("bird1_02_001.wav", b"short serial");
    fixture.create_recording("bird1_02_00001.WAV", b"upper case");

    assert!(fixture.organize(false).is_ok());

    assert!(fixture.dest_files().is_empty());
    fixture.assert_not_in_dest("bird1");
}

#[test]
fn test_subdirectories_are_not_descended() {
    let fixture = TestFixture::new();
    fs::create_dir(fixture.src().join("card2")).expect("Failed to create subdirectory");
    fs::write(fixture.src().join("card2").join("A_01_00001.wav"), b"nested")
        .expect("Failed to write nested file");
    fs::create_dir(fixture.src().join("B_01_00001.wav")).expect("Failed to create subdirectory");

    assert!(fixture.organize(false).is_ok());
    assert!(fixture.dest_files().is_empty());
}

// ============================================================================
// Test Suite 3: Overwrites and Source Safety
// ============================================================================

#[test]
fn test_existing_copy_is_overwritten() {
    let fixture = TestFixture::new();
    fs::create_dir_all(fixture.dest().join("A/01")).expect("Failed to create dirs");
    fs::write(fixture.dest().join("A/01/A_01_00001.wav"), b"stale").expect("Failed to write");
    fixture.create_recording("A_01_00001.wav", b"fresh");

    assert!(fixture.organize(false).is_ok());

    let content = fs::read(fixture.dest().join("A/01/A_01_00001.wav")).expect("copy exists");
    assert_eq!(content, b"fresh");
}

#[test]
fn test_source_is_untouched() {
    let fixture = TestFixture::new();
    fixture.create_recording("A_01_00001.wav", WAV_HEADER);
    fixture.create_recording("B_02_00002.wav", b"not really audio");
    fixture.create_recording("readme.md", b"notes");
    let before = fixture.source_snapshot();

    assert!(fixture.organize(false).is_ok());

    assert_eq!(fixture.source_snapshot(), before);
}

// ============================================================================
// Test Suite 4: Dry-run Mode
// ============================================================================

#[test]
fn test_dry_run_copies_nothing() {
    let fixture = TestFixture::new();
    fixture.create_recording("A_01_00001.wav", b"one");
    fixture.create_recording("B_02_00001.wav", b"two");

    assert!(fixture.organize(true).is_ok());

    assert!(fixture.dest_files().is_empty());
    fixture.assert_not_in_dest("A");
    fixture.assert_not_in_dest(".wavsort_history.json");
}

#[test]
fn test_dry_run_then_real_run() {
    let fixture = TestFixture::new();
    fixture.create_recording("A_01_00001.wav", b"one");

    assert!(fixture.organize(true).is_ok());
    assert!(fixture.dest_files().is_empty());

    assert!(fixture.organize(false).is_ok());
    assert_eq!(fixture.dest_files(), ["A/01/A_01_00001.wav"]);
}

// ============================================================================
// Test Suite 5: Configuration and Filtering
// ============================================================================

#[test]
fn test_exclude_pattern() {
    let fixture = TestFixture::with_config(
        r#"
[filters.exclude]
patterns = ["calib_*"]
"#,
    );
    fixture.create_recording("calib_01_00001.wav", b"tone");
    fixture.create_recording("robin_01_00001.wav", b"song");

    assert!(fixture.organize(false).is_ok());
    assert_eq!(fixture.dest_files(), ["robin/01/robin_01_00001.wav"]);
}

#[test]
fn test_hidden_files_can_be_excluded() {
    let fixture = TestFixture::with_config(
        r#"
[filters]
enable_hidden_files = false
"#,
    );
    fixture.create_recording(".robin_01_00001.wav", b"metadata fork");
    fixture.create_recording("robin_01_00001.wav", b"song");

    assert!(fixture.organize(false).is_ok());
    assert_eq!(fixture.dest_files(), ["robin/01/robin_01_00001.wav"]);
}

#[test]
fn test_hidden_files_matched_by_default() {
    let fixture = TestFixture::new();
    fixture.create_recording(".robin_01_00001.wav", b"data");

    assert!(fixture.organize(false).is_ok());
    fixture.assert_copied(".robin/01/.robin_01_00001.wav");
}

#[test]
fn test_verify_wav_header_from_config() {
    let fixture = TestFixture::with_config(
        r#"
[organize]
verify_wav_header = true
"#,
    );
    fixture.create_recording("A_01_00001.wav", WAV_HEADER);
    fixture.create_recording("A_01_00002.wav", b"truncated junk");

    assert!(fixture.organize(false).is_ok());
    assert_eq!(fixture.dest_files(), ["A/01/A_01_00001.wav"]);
}

#[test]
fn test_invalid_config_fails_before_copying() {
    let fixture = TestFixture::with_config(
        r#"
[filters.exclude]
regex = ["(unclosed"]
"#,
    );
    fixture.create_recording("A_01_00001.wav", b"data");

    assert!(fixture.organize(false).is_err());
    assert!(fixture.dest_files().is_empty());
}

#[test]
fn test_no_history_by_default() {
    let fixture = TestFixture::new();
    fixture.create_recording("A_01_00001.wav", b"data");

    assert!(fixture.organize(false).is_ok());
    fixture.assert_not_in_dest(".wavsort_history.json");
    assert!(fixture.undo().is_err());
}

#[test]
fn test_history_enabled_from_config() {
    let fixture = TestFixture::with_config(
        r#"
[organize]
record_history = true
"#,
    );
    fixture.create_recording("A_01_00001.wav", b"data");

    assert!(fixture.organize(false).is_ok());
    fixture.assert_copied(".wavsort_history.json");
    assert!(fixture.undo().is_ok());
    assert!(fixture.dest_files().is_empty());
}

// ============================================================================
// Test Suite 6: Undo
// ============================================================================

#[test]
fn test_full_workflow_organize_then_undo() {
    let fixture = TestFixture::new();
    fixture.create_recording("X_10_00001.wav", b"one");
    fixture.create_recording("Y_02_00099.wav", b"two");
    let before = fixture.source_snapshot();

    assert!(fixture.organize_with_history().is_ok());
    fixture.assert_copied(".wavsort_history.json");

    assert!(fixture.undo().is_ok());

    assert!(fixture.dest_files().is_empty());
    fixture.assert_not_in_dest("X");
    fixture.assert_not_in_dest("Y");
    fixture.assert_not_in_dest(".wavsort_history.json");
    assert_eq!(fixture.source_snapshot(), before);
}

#[test]
fn test_undo_without_history() {
    let fixture = TestFixture::new();
    assert!(fixture.undo().is_err());
}

#[test]
fn test_undo_keeps_files_that_predate_the_run() {
    let fixture = TestFixture::new();
    fs::create_dir_all(fixture.dest().join("A/01")).expect("Failed to create dirs");
    fs::write(fixture.dest().join("A/01/A_01_00001.wav"), b"earlier").expect("Failed to write");
    fixture.create_recording("A_01_00001.wav", b"later");
    fixture.create_recording("A_01_00002.wav", b"new");

    assert!(fixture.organize_with_history().is_ok());
    assert!(fixture.undo().is_ok());

    // The partial undo keeps its history so it can be inspected.
    assert_eq!(
        fixture.dest_files(),
        [".wavsort_history.json", "A/01/A_01_00001.wav"]
    );
}

// ============================================================================
// Test Suite 7: Error Scenarios
// ============================================================================

#[test]
fn test_missing_source_directory() {
    let fixture = TestFixture::new();

    let result = run_cli_with_config(
        OrganizeCommand::Organize {
            source: fixture.src().join("does-not-exist"),
            destination: fixture.dest().to_path_buf(),
            dry_run: false,
            verify_wav: false,
            record_history: false,
        },
        Some(&fixture.config_path),
    );

    assert!(result.is_err());
    assert!(fixture.dest_files().is_empty());
}

#[test]
fn test_blocked_destination_aborts_run() {
    let fixture = TestFixture::new();
    fixture.create_recording("A_01_00001.wav", b"one");
    fixture.create_recording("B_01_00001.wav", b"two");
    fixture.create_recording("C_01_00001.wav", b"three");
    // A plain file where the bird directory for B should go.
    fs::write(fixture.dest().join("B"), b"in the way").expect("Failed to write blocker");

    let result = fixture.organize(false);

    assert!(result.is_err());
    let err = result.unwrap_err();
    assert!(err.contains("Failed to create directory"), "unexpected error: {}", err);
    // Copies made before the failure stay; later ones never happen.
    fixture.assert_copied("A/01/A_01_00001.wav");
    fixture.assert_not_in_dest("C");
}

#[test]
fn test_source_that_is_a_target_day_directory() {
    let fixture = TestFixture::new();
    let day_dir = fixture.dest().join("A").join("01");
    fs::create_dir_all(&day_dir).expect("Failed to create day directory");
    fs::write(day_dir.join("A_01_00001.wav"), b"precious audio").expect("Failed to write");

    let result = run_cli_with_config(
        OrganizeCommand::Organize {
            source: day_dir.clone(),
            destination: fixture.dest().to_path_buf(),
            dry_run: false,
            verify_wav: false,
            record_history: false,
        },
        Some(&fixture.config_path),
    );

    let err = result.expect_err("copying a file onto itself must fail");
    assert!(err.contains("same file"), "unexpected error: {}", err);
    assert_eq!(
        fs::read(day_dir.join("A_01_00001.wav")).expect("source still readable"),
        b"precious audio"
    );
}

#[test]
fn test_source_nested_inside_destination() {
    let fixture = TestFixture::new();
    let card = fixture.dest().join("card1");
    fs::create_dir(&card).expect("Failed to create card directory");
    fs::write(card.join("A_01_00001.wav"), b"one").expect("Failed to write");

    let result = run_cli_with_config(
        OrganizeCommand::Organize {
            source: card.clone(),
            destination: fixture.dest().to_path_buf(),
            dry_run: false,
            verify_wav: false,
            record_history: false,
        },
        Some(&fixture.config_path),
    );

    assert!(result.is_ok(), "Result error: {:?}", result.err());
    assert_eq!(
        fixture.dest_files(),
        ["A/01/A_01_00001.wav", "card1/A_01_00001.wav"]
    );
    assert_eq!(fs::read(card.join("A_01_00001.wav")).unwrap(), b"one");
}
