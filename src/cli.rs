//! Command-line interface module for wavsort.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Directory selection when paths are not given
//! - Organization orchestration
//! - Undo operation handling

use crate::config::SortConfig;
use crate::file_organizer::{FileOrganizer, OrganizeOptions, OrganizeReport};
use crate::output::OutputFormatter;
use crate::picker::{DirectoryPicker, PromptPicker};
use crate::undo::UndoManager;
use clap::Parser;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "wavsort",
    version,
    about = "Copy <BirdID>_<Day>_<Serial>.wav recordings into a <BirdID>/<Day> directory tree"
)]
pub struct Args {
    /// Directory holding the recordings. Prompted for when omitted.
    pub source: Option<PathBuf>,

    /// Root of the sorted tree. Prompted for when omitted.
    pub destination: Option<PathBuf>,

    /// Show what would be copied without touching the destination.
    #[arg(long)]
    pub dry_run: bool,

    /// Skip matched files whose content is not a WAV file.
    #[arg(long)]
    pub verify_wav: bool,

    /// Write a history file into DESTINATION so the run can be undone.
    #[arg(long)]
    pub record_history: bool,

    /// Path to a TOML configuration file.
    #[arg(long, short, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Use the platform folder picker instead of a terminal prompt.
    #[cfg(feature = "native-dialog")]
    #[arg(long)]
    pub native_dialog: bool,

    /// Remove the copies made by the last run into DEST.
    #[arg(
        long,
        value_name = "DEST",
        conflicts_with_all = ["source", "destination", "dry_run", "verify_wav", "record_history"]
    )]
    pub undo: Option<PathBuf>,
}

impl Args {
    /// Builds the directory picker for this invocation.
    #[cfg(feature = "native-dialog")]
    pub fn picker(&self) -> Box<dyn DirectoryPicker> {
        if self.native_dialog {
            Box::new(crate::picker::NativePicker)
        } else {
            Box::new(PromptPicker)
        }
    }

    /// Builds the directory picker for this invocation.
    #[cfg(not(feature = "native-dialog"))]
    pub fn picker(&self) -> Box<dyn DirectoryPicker> {
        Box::new(PromptPicker)
    }
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone)]
pub enum OrganizeCommand {
    /// Copy recordings from `source` into the tree under `destination`.
    Organize {
        source: PathBuf,
        destination: PathBuf,
        /// If true, simulate the operation without making changes.
        dry_run: bool,
        /// Check WAV headers regardless of configuration.
        verify_wav: bool,
        /// Record history regardless of configuration.
        record_history: bool,
    },
    /// Undo the previous run into `destination`.
    Undo { destination: PathBuf },
}

/// Runs a command with configuration discovered from the usual locations.
///
/// # Examples
///
/// ```no_run
/// use wavsort::cli::{run_cli, OrganizeCommand};
/// use std::path::PathBuf;
///
/// let result = run_cli(OrganizeCommand::Organize {
///     source: PathBuf::from("/recordings/card1"),
///     destination: PathBuf::from("/recordings/sorted"),
///     dry_run: false,
///     verify_wav: false,
///     record_history: false,
/// });
/// if let Err(e) = result {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(command: OrganizeCommand) -> Result<(), String> {
    run_cli_with_config(command, None)
}

/// Runs a command with an optional explicit configuration file.
pub fn run_cli_with_config(
    command: OrganizeCommand,
    config_path: Option<&Path>,
) -> Result<(), String> {
    match command {
        OrganizeCommand::Organize {
            source,
            destination,
            dry_run,
            verify_wav,
            record_history,
        } => organize_with_config(
            &source,
            &destination,
            OrganizeOptions {
                dry_run,
                verify_wav_header: verify_wav,
                record_history,
            },
            config_path,
        ),
        OrganizeCommand::Undo { destination } => undo_organization(&destination),
    }
}

/// Copies recordings from `source` into `destination`.
///
/// Loads configuration, then runs the copy pass. Flags in `requested` switch
/// options on even when the configuration leaves them off. In dry-run mode a
/// per-bird summary of the planned copies is printed afterwards.
fn organize_with_config(
    source: &Path,
    destination: &Path,
    requested: OrganizeOptions,
    config_path: Option<&Path>,
) -> Result<(), String> {
    let config = SortConfig::load(config_path)
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let filters = config
        .compile_filters()
        .map_err(|e| format!("Error compiling filters: {}", e))?;

    let options = OrganizeOptions {
        dry_run: requested.dry_run,
        verify_wav_header: requested.verify_wav_header || config.organize.verify_wav_header,
        record_history: requested.record_history || config.organize.record_history,
    };
    let dry_run = options.dry_run;

    if dry_run {
        OutputFormatter::info(&format!(
            "DRY RUN: Analyzing {} -> {}",
            source.display(),
            destination.display()
        ));
    }

    let report = FileOrganizer::organize(source, destination, &options, &filters)
        .map_err(|e| e.to_string())?;

    if !report.rejected.is_empty() {
        OutputFormatter::warning(&format!(
            "{} recording(s) skipped: not WAV content",
            report.rejected.len()
        ));
    }

    if dry_run {
        print_dry_run_summary(&report);
    }

    Ok(())
}

fn print_dry_run_summary(report: &OrganizeReport) {
    if report.copied.is_empty() {
        OutputFormatter::plain("No recordings found to organize.");
        return;
    }

    let mut bird_counts: BTreeMap<String, usize> = BTreeMap::new();
    for operation in &report.copied {
        *bird_counts.entry(operation.bird_id.clone()).or_insert(0) += 1;
    }

    OutputFormatter::summary_table(&bird_counts, report.copied.len());
    OutputFormatter::plain("\nDry run complete. No files were copied.");
}

/// Removes the copies made by the last run into `destination`.
fn undo_organization(destination: &Path) -> Result<(), String> {
    OutputFormatter::info("Undoing previous organization...");

    let report = UndoManager::undo(destination).map_err(|e| format!("Error: {}", e))?;

    OutputFormatter::success("Undo complete!");
    OutputFormatter::plain(&format!("  Removed copies: {}", report.removed_files));
    OutputFormatter::plain(&format!("  Removed directories: {}", report.removed_dirs));

    if !report.skipped_files.is_empty() {
        OutputFormatter::plain(&format!("  Skipped: {}", report.skipped_files.len()));
        for (path, reason) in &report.skipped_files {
            OutputFormatter::plain(&format!("    - {}: {}", path.display(), reason));
        }
    }

    if !report.failed_removals.is_empty() {
        OutputFormatter::plain(&format!("  Failed: {}", report.failed_removals.len()));
        for (path, reason) in &report.failed_removals {
            OutputFormatter::error(&format!("    - {}: {}", path.display(), reason));
        }
    }

    if !report.is_complete_success() {
        OutputFormatter::warning("History file was kept because some copies were not removed.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positional_paths() {
        let args = Args::try_parse_from(["wavsort", "/in", "/out", "--dry-run"]).unwrap();
        assert_eq!(args.source, Some(PathBuf::from("/in")));
        assert_eq!(args.destination, Some(PathBuf::from("/out")));
        assert!(args.dry_run);
        assert!(!args.verify_wav);
        assert!(!args.record_history);
        assert!(args.undo.is_none());
    }

    #[test]
    fn test_parse_record_history() {
        let args = Args::try_parse_from(["wavsort", "--record-history", "/in", "/out"]).unwrap();
        assert!(args.record_history);
        assert!(Args::try_parse_from(["wavsort", "--record-history", "--undo", "/out"]).is_err());
    }

    #[test]
    fn test_parse_without_paths() {
        let args = Args::try_parse_from(["wavsort"]).unwrap();
        assert!(args.source.is_none());
        assert!(args.destination.is_none());
    }

    #[test]
    fn test_parse_undo() {
        let args = Args::try_parse_from(["wavsort", "--undo", "/out"]).unwrap();
        assert_eq!(args.undo, Some(PathBuf::from("/out")));
    }

    #[test]
    fn test_undo_conflicts_with_paths() {
        assert!(Args::try_parse_from(["wavsort", "/in", "--undo", "/out"]).is_err());
        assert!(Args::try_parse_from(["wavsort", "--dry-run", "--undo", "/out"]).is_err());
    }

    #[test]
    fn test_parse_config_flag() {
        let args = Args::try_parse_from(["wavsort", "-c", "sort.toml", "/in", "/out"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("sort.toml")));
    }
}
