//! Interactive directory selection.
//!
//! When source or destination are not given on the command line the user is
//! asked for them, either with a terminal prompt or (with the `native-dialog`
//! feature) a native folder picker. A picker is created for the prompts of a
//! single run and dropped before any file is copied.

use std::path::PathBuf;

/// Title of the source directory prompt.
pub const SOURCE_PROMPT: &str = "Select Source Directory";
/// Title of the destination directory prompt.
pub const DESTINATION_PROMPT: &str = "Select Destination Directory";

/// Errors raised while asking the user for a directory.
#[derive(Debug)]
pub enum PickerError {
    /// The terminal prompt could not be shown or read.
    Prompt(dialoguer::Error),
}

impl std::fmt::Display for PickerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PickerError::Prompt(e) => write!(f, "Directory prompt failed: {}", e),
        }
    }
}

impl std::error::Error for PickerError {}

impl From<dialoguer::Error> for PickerError {
    fn from(e: dialoguer::Error) -> Self {
        PickerError::Prompt(e)
    }
}

/// Something that can ask the user for a directory.
pub trait DirectoryPicker {
    /// Blocks until the user picks a directory. `Ok(None)` means the user
    /// cancelled.
    fn pick_directory(&mut self, title: &str) -> Result<Option<PathBuf>, PickerError>;
}

/// Asks for a path on the terminal. Empty input cancels.
#[derive(Debug, Default)]
pub struct PromptPicker;

impl DirectoryPicker for PromptPicker {
    fn pick_directory(&mut self, title: &str) -> Result<Option<PathBuf>, PickerError> {
        let answer: String = dialoguer::Input::new()
            .with_prompt(title)
            .allow_empty(true)
            .interact_text()?;

        let answer = answer.trim();
        if answer.is_empty() {
            Ok(None)
        } else {
            Ok(Some(PathBuf::from(answer)))
        }
    }
}

/// Shows the platform's folder picker.
#[cfg(feature = "native-dialog")]
#[derive(Debug, Default)]
pub struct NativePicker;

#[cfg(feature = "native-dialog")]
impl DirectoryPicker for NativePicker {
    fn pick_directory(&mut self, title: &str) -> Result<Option<PathBuf>, PickerError> {
        Ok(rfd::FileDialog::new().set_title(title).pick_folder())
    }
}

/// Outcome of asking for the two directories of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectorySelection {
    /// Both directories are known.
    Selected {
        source: PathBuf,
        destination: PathBuf,
    },
    /// The user cancelled the source prompt.
    SourceCanceled,
    /// The user cancelled the destination prompt.
    DestinationCanceled,
}

/// Fills in whichever of `source` and `destination` is missing by asking
/// `picker`, source first. The destination is not asked for once the source
/// prompt has been cancelled.
pub fn select_directories(
    picker: &mut dyn DirectoryPicker,
    source: Option<PathBuf>,
    destination: Option<PathBuf>,
) -> Result<DirectorySelection, PickerError> {
    let source = match source {
        Some(path) => path,
        None => match picker.pick_directory(SOURCE_PROMPT)? {
            Some(path) => path,
            None => return Ok(DirectorySelection::SourceCanceled),
        },
    };

    let destination = match destination {
        Some(path) => path,
        None => match picker.pick_directory(DESTINATION_PROMPT)? {
            Some(path) => path,
            None => return Ok(DirectorySelection::DestinationCanceled),
        },
    };

    Ok(DirectorySelection::Selected {
        source,
        destination,
    })
}
