/// Undo for the most recent organize run.
///
/// A run only ever adds copies to the destination tree, so undoing it means
/// deleting those copies and the directories the run created. Source
/// recordings are never touched.
use crate::file_organizer::{CopyOperation, OperationLog, OrganizeError, OrganizeResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Represents the result of an undo operation.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Number of copies deleted.
    pub removed_files: usize,
    /// Number of empty directories deleted.
    pub removed_dirs: usize,
    /// Copies that could not be deleted, with the reason.
    pub failed_removals: Vec<(PathBuf, String)>,
    /// Copies that were left alone, with the reason.
    pub skipped_files: Vec<(PathBuf, String)>,
}

impl UndoReport {
    /// Returns true if every recorded copy was deleted.
    pub fn is_complete_success(&self) -> bool {
        self.failed_removals.is_empty() && self.skipped_files.is_empty()
    }
}

/// Manages undo operations for organize runs.
pub struct UndoManager;

impl UndoManager {
    /// Undoes the most recent organize run into `destination_root`.
    ///
    /// # Edge Cases Handled
    ///
    /// * **Copy already gone**: skipped
    /// * **Copy replaced an older file**: skipped, since the older contents no
    ///   longer exist and deleting would lose data
    /// * **Permission denied**: recorded as a failure with the error reason
    /// * **Directory not empty**: left in place
    /// * **Missing history**: returns an error indicating no undo is available
    ///
    /// The history file is deleted only when every copy was removed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use wavsort::undo::UndoManager;
    /// use std::path::Path;
    ///
    /// match UndoManager::undo(Path::new("/recordings/sorted")) {
    ///     Ok(report) => println!("Removed {} copies", report.removed_files),
    ///     Err(e) => eprintln!("Undo failed: {}", e),
    /// }
    /// ```
    pub fn undo(destination_root: &Path) -> OrganizeResult<UndoReport> {
        if !destination_root.is_dir() {
            return Err(OrganizeError::DirectoryAccess {
                path: destination_root.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "destination directory does not exist",
                ),
            });
        }

        let log = OperationLog::load(destination_root)?.ok_or_else(|| {
            OrganizeError::InvalidHistoryFormat {
                reason: "No previous organization found to undo".to_string(),
            }
        })?;

        let mut report = UndoReport::default();
        for operation in log.operations.iter().rev() {
            match Self::remove_copy(operation) {
                Ok(()) => report.removed_files += 1,
                Err(Unremoved::Skipped(path, reason)) => report.skipped_files.push((path, reason)),
                Err(Unremoved::Failed(path, reason)) => report.failed_removals.push((path, reason)),
            }
        }

        // Innermost first so a day directory goes before its bird directory.
        for dir in log
            .operations
            .iter()
            .rev()
            .flat_map(|op| op.created_dirs.iter().rev())
        {
            if dir.is_dir() && fs::remove_dir(dir).is_ok() {
                report.removed_dirs += 1;
            }
        }

        if report.is_complete_success()
            && let Err(e) = OperationLog::delete(destination_root)
        {
            eprintln!("Warning: Could not delete history file: {}", e);
        }

        Ok(report)
    }

    fn remove_copy(operation: &CopyOperation) -> Result<(), Unremoved> {
        let path = &operation.destination_path;

        if operation.replaced_existing {
            return Err(Unremoved::Skipped(
                path.clone(),
                "Copy overwrote an existing file; left in place".to_string(),
            ));
        }

        if !path.exists() {
            return Err(Unremoved::Skipped(
                path.clone(),
                "File not found at expected location".to_string(),
            ));
        }

        fs::remove_file(path)
            .map_err(|e| Unremoved::Failed(path.clone(), format!("Failed to remove copy: {}", e)))
    }
}

enum Unremoved {
    Skipped(PathBuf, String),
    Failed(PathBuf, String),
}
