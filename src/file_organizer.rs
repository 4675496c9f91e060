/// Copying recordings into the `<BirdID>/<Day>` destination tree.
///
/// This module holds the single pass over a source directory: list its
/// entries, keep the files whose names follow the recording format, create
/// the bird and day directories on demand and copy each file into place.
/// It also records what a run did so the run can be undone later.
use crate::config::CompiledFilters;
use crate::output::OutputFormatter;
use crate::recording::RecordingName;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the history file written into the destination root.
pub const HISTORY_FILE_NAME: &str = ".wavsort_history.json";

/// MIME type `infer` reports for RIFF/WAVE content.
const WAV_MIME_TYPE: &str = "audio/x-wav";

/// A single copy performed (or planned, in a dry run) by the organizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyOperation {
    /// The file in the source directory.
    pub source_path: PathBuf,
    /// The copy in the destination tree.
    pub destination_path: PathBuf,
    /// Bird ID parsed from the file name.
    pub bird_id: String,
    /// Whether a file already existed at `destination_path` and was overwritten.
    pub replaced_existing: bool,
    /// Directories that did not exist before this copy, outermost first.
    pub created_dirs: Vec<PathBuf>,
}

/// The persisted record of one organize run, used by undo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationLog {
    /// RFC 3339 timestamp of when the run started.
    pub timestamp: String,
    /// The directory recordings were copied from.
    pub source_root: PathBuf,
    /// The directory the tree was built under.
    pub destination_root: PathBuf,
    /// All copies performed in this run, in order.
    pub operations: Vec<CopyOperation>,
}

impl OperationLog {
    /// Creates an empty log for a run from `source_root` into `destination_root`.
    pub fn new(source_root: PathBuf, destination_root: PathBuf) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            source_root,
            destination_root,
            operations: Vec::new(),
        }
    }

    /// Adds an operation to this log.
    pub fn add_operation(&mut self, operation: CopyOperation) {
        self.operations.push(operation);
    }

    /// Returns the path to the history file for a destination root.
    pub fn history_file_path(destination_root: &Path) -> PathBuf {
        destination_root.join(HISTORY_FILE_NAME)
    }

    /// Saves this log as pretty-printed JSON in the destination root.
    pub fn save(&self) -> OrganizeResult<()> {
        let json_string = serde_json::to_string_pretty(self).map_err(|e| {
            OrganizeError::HistoryWriteFailed {
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("JSON serialization failed: {}", e),
                ),
            }
        })?;

        fs::write(Self::history_file_path(&self.destination_root), json_string)
            .map_err(|e| OrganizeError::HistoryWriteFailed { source: e })
    }

    /// Loads the most recent log from a destination root, if one exists.
    pub fn load(destination_root: &Path) -> OrganizeResult<Option<Self>> {
        let history_path = Self::history_file_path(destination_root);

        if !history_path.exists() {
            return Ok(None);
        }

        let json_string = fs::read_to_string(&history_path)
            .map_err(|e| OrganizeError::HistoryReadFailed { source: e })?;

        serde_json::from_str(&json_string)
            .map(Some)
            .map_err(|e| OrganizeError::InvalidHistoryFormat {
                reason: format!("JSON parse error: {}", e),
            })
    }

    /// Deletes the history file for a destination root.
    pub fn delete(destination_root: &Path) -> OrganizeResult<()> {
        let history_path = Self::history_file_path(destination_root);
        if history_path.exists() {
            fs::remove_file(&history_path)
                .map_err(|e| OrganizeError::HistoryWriteFailed { source: e })?;
        }
        Ok(())
    }
}

/// Errors that can occur while organizing recordings.
#[derive(Debug)]
pub enum OrganizeError {
    /// The source directory is missing or cannot be listed.
    DirectoryAccess {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A directory in the destination tree could not be created.
    DirectoryCreation {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A recording could not be read or its copy could not be written.
    Copy {
        source: PathBuf,
        destination: PathBuf,
        source_error: std::io::Error,
    },
    /// Failed to write or delete the history file.
    HistoryWriteFailed { source: std::io::Error },
    /// Failed to read the history file.
    HistoryReadFailed { source: std::io::Error },
    /// History file has invalid format.
    InvalidHistoryFormat { reason: String },
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DirectoryAccess { path, source } => {
                write!(f, "Cannot read directory {}: {}", path.display(), source)
            }
            Self::DirectoryCreation { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::Copy {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to copy {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::HistoryWriteFailed { source } => {
                write!(f, "Failed to write history file: {}", source)
            }
            Self::HistoryReadFailed { source } => {
                write!(f, "Failed to read history file: {}", source)
            }
            Self::InvalidHistoryFormat { reason } => {
                write!(f, "Invalid history file format: {}", reason)
            }
        }
    }
}

impl std::error::Error for OrganizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DirectoryAccess { source, .. }
            | Self::DirectoryCreation { source, .. }
            | Self::HistoryWriteFailed { source }
            | Self::HistoryReadFailed { source } => Some(source),
            Self::Copy { source_error, .. } => Some(source_error),
            Self::InvalidHistoryFormat { .. } => None,
        }
    }
}

/// Result type for organize operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Knobs for a single organize run.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrganizeOptions {
    /// Plan the copies without touching the destination.
    pub dry_run: bool,
    /// Skip matched files whose content is not RIFF/WAVE.
    pub verify_wav_header: bool,
    /// Write the history file so the run can be undone.
    pub record_history: bool,
}

/// What an organize run did.
#[derive(Debug, Default)]
pub struct OrganizeReport {
    /// Copies performed, or planned in a dry run, in processing order.
    pub copied: Vec<CopyOperation>,
    /// Entries whose names do not follow the recording format.
    pub unmatched: usize,
    /// Entries dropped by the configured filters.
    pub excluded: usize,
    /// Matched files rejected by WAV header verification.
    pub rejected: Vec<PathBuf>,
}

/// Copies recordings into the destination tree.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Runs the classify-and-copy pass from `source_dir` into `destination_dir`.
    ///
    /// Entries are processed in file name order. Files that do not follow the
    /// recording format, directories and entries dropped by `filters` are
    /// skipped silently. Each copy prints `Copied <file> to <path>`.
    ///
    /// The first directory creation or copy failure aborts the run. Copies
    /// made before that point stay in place; when history recording is on,
    /// they are still written to the history file so they can be undone.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use wavsort::config::CompiledFilters;
    /// use wavsort::file_organizer::{FileOrganizer, OrganizeOptions};
    /// use std::path::Path;
    ///
    /// let report = FileOrganizer::organize(
    ///     Path::new("/recordings/card1"),
    ///     Path::new("/recordings/sorted"),
    ///     &OrganizeOptions::default(),
    ///     &CompiledFilters::default(),
    /// );
    /// match report {
    ///     Ok(report) => println!("{} recordings copied", report.copied.len()),
    ///     Err(e) => eprintln!("Organization failed: {}", e),
    /// }
    /// ```
    pub fn organize(
        source_dir: &Path,
        destination_dir: &Path,
        options: &OrganizeOptions,
        filters: &CompiledFilters,
    ) -> OrganizeResult<OrganizeReport> {
        let entries = Self::list_entries(source_dir)?;

        let mut report = OrganizeReport::default();
        let mut log = OperationLog::new(source_dir.to_path_buf(), destination_dir.to_path_buf());

        let outcome = Self::process_entries(
            &entries,
            destination_dir,
            options,
            filters,
            &mut report,
            &mut log,
        );

        if options.record_history && !options.dry_run && !log.operations.is_empty() {
            let saved = log.save();
            if let Err(e) = outcome {
                // The copy failure is returned; the history failure is only reported.
                if let Err(history_error) = saved {
                    OutputFormatter::warning(&format!(
                        "Could not save history, undo will not be available: {}",
                        history_error
                    ));
                }
                return Err(e);
            }
            saved?;
        } else {
            outcome?;
        }

        Ok(report)
    }

    fn process_entries(
        entries: &[PathBuf],
        destination_dir: &Path,
        options: &OrganizeOptions,
        filters: &CompiledFilters,
        report: &mut OrganizeReport,
        log: &mut OperationLog,
    ) -> OrganizeResult<()> {
        for path in entries {
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                report.unmatched += 1;
                continue;
            };

            if !filters.should_include(file_name) {
                report.excluded += 1;
                continue;
            }

            let Some(recording) = RecordingName::parse(file_name) else {
                report.unmatched += 1;
                continue;
            };

            if !path.is_file() {
                report.unmatched += 1;
                continue;
            }

            if options.verify_wav_header && !Self::has_wav_header(path) {
                OutputFormatter::warning(&format!(
                    "Skipping {}: content is not a WAV file",
                    file_name
                ));
                report.rejected.push(path.clone());
                continue;
            }

            if options.dry_run {
                let operation = Self::plan_copy(destination_dir, path, &recording);
                OutputFormatter::dry_run_notice(&format!(
                    "Would copy {} to {}",
                    file_name,
                    operation.destination_path.display()
                ));
                report.copied.push(operation);
                continue;
            }

            let operation =
                Self::copy_to_destination_with_record(destination_dir, path, &recording)?;
            OutputFormatter::plain(&format!(
                "Copied {} to {}",
                file_name,
                operation.destination_path.display()
            ));
            log.add_operation(operation.clone());
            report.copied.push(operation);
        }

        Ok(())
    }

    /// Lists the direct entries of `source_dir`, sorted by path.
    fn list_entries(source_dir: &Path) -> OrganizeResult<Vec<PathBuf>> {
        let access_error = |source| OrganizeError::DirectoryAccess {
            path: source_dir.to_path_buf(),
            source,
        };

        let mut entries = fs::read_dir(source_dir)
            .map_err(access_error)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(access_error)?;

        entries.sort();
        Ok(entries)
    }

    fn has_wav_header(path: &Path) -> bool {
        matches!(
            infer::get_from_path(path),
            Ok(Some(kind)) if kind.mime_type() == WAV_MIME_TYPE
        )
    }

    /// Works out what copying `file_path` would do without doing it.
    fn plan_copy(
        destination_root: &Path,
        file_path: &Path,
        recording: &RecordingName,
    ) -> CopyOperation {
        let day_dir = recording.destination_dir(destination_root);
        let destination_path = recording.destination_path(destination_root);

        let created_dirs = [destination_root.join(&recording.bird_id), day_dir]
            .into_iter()
            .filter(|dir| !dir.exists())
            .collect();

        CopyOperation {
            source_path: file_path.to_path_buf(),
            replaced_existing: destination_path.exists(),
            destination_path,
            bird_id: recording.bird_id.clone(),
            created_dirs,
        }
    }

    /// Copies one recording to `<root>/<bird_id>/<day>/<file_name>` and records the copy.
    ///
    /// Missing bird and day directories are created; an existing directory is
    /// not an error. An existing file at the destination is overwritten,
    /// unless it is the source file itself, which fails with
    /// [`OrganizeError::Copy`] and leaves the file alone.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use wavsort::file_organizer::FileOrganizer;
    /// use wavsort::recording::RecordingName;
    /// use std::path::Path;
    ///
    /// let recording = RecordingName::parse("B7_03_00042.wav").unwrap();
    /// let op = FileOrganizer::copy_to_destination_with_record(
    ///     Path::new("/out"),
    ///     Path::new("/in/B7_03_00042.wav"),
    ///     &recording,
    /// );
    /// ```
    pub fn copy_to_destination_with_record(
        destination_root: &Path,
        file_path: &Path,
        recording: &RecordingName,
    ) -> OrganizeResult<CopyOperation> {
        let operation = Self::plan_copy(destination_root, file_path, recording);
        let day_dir = recording.destination_dir(destination_root);

        fs::create_dir_all(&day_dir).map_err(|e| OrganizeError::DirectoryCreation {
            path: day_dir.clone(),
            source: e,
        })?;

        if operation.replaced_existing && is_same_file(file_path, &operation.destination_path) {
            return Err(OrganizeError::Copy {
                source: file_path.to_path_buf(),
                destination: operation.destination_path.clone(),
                source_error: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "source and destination are the same file",
                ),
            });
        }

        fs::copy(file_path, &operation.destination_path).map_err(|e| OrganizeError::Copy {
            source: file_path.to_path_buf(),
            destination: operation.destination_path.clone(),
            source_error: e,
        })?;

        Ok(operation)
    }
}

/// Whether two paths name the same file, following symlinks.
#[cfg(unix)]
fn is_same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (fs::metadata(a), fs::metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

/// Whether two paths name the same file, following symlinks.
#[cfg(not(unix))]
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
