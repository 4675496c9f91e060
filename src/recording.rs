//! Recording file name parsing.
//!
//! Recorders write files named `<BirdID>_<Day>_<Serial>.wav`, where `Day` is a
//! two digit relative recording day and `Serial` a five digit counter. This
//! module turns such a name into a [`RecordingName`] and derives the place the
//! file belongs in the destination tree.
//!
//! # Examples
//!
//! ```
//! use wavsort::recording::RecordingName;
//! use std::path::Path;
//!
//! let name = RecordingName::parse("B7_03_00042.wav").unwrap();
//! assert_eq!(name.bird_id, "B7");
//! assert_eq!(
//!     name.destination_path(Path::new("/out")),
//!     Path::new("/out/B7/03/B7_03_00042.wav")
//! );
//! ```

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Greedy on the bird ID: the last `_##_#####.wav` suffix wins.
static RECORDING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+)_([0-9]{2})_([0-9]{5})\.wav$").expect("recording pattern is valid")
});

/// The fields of a recording file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordingName {
    /// The full, original file name.
    pub file_name: String,
    /// Everything before the day and serial groups.
    pub bird_id: String,
    /// Two digit relative recording day, leading zeros kept.
    pub day: String,
    /// Five digit serial number. Not used for collision detection.
    pub serial: String,
}

impl RecordingName {
    /// Parses a file name, returning `None` when it does not follow the
    /// recording naming format.
    ///
    /// Matching is case-sensitive and anchored at both ends. A bird ID of
    /// `.` or `..` is rejected since it would resolve outside its own
    /// directory in the destination tree.
    ///
    /// The bird ID must be non-empty: `_01_00001.wav` does not match, where
    /// the older script filed it directly under `<dest>/01/`.
    ///
    /// Names are `&str`, so callers holding a file name that is not valid
    /// UTF-8 cannot match it; such files are skipped as non-matching.
    pub fn parse(file_name: &str) -> Option<Self> {
        let captures = RECORDING_PATTERN.captures(file_name)?;
        let bird_id = &captures[1];

        if bird_id == "." || bird_id == ".." {
            return None;
        }

        Some(Self {
            file_name: file_name.to_string(),
            bird_id: bird_id.to_string(),
            day: captures[2].to_string(),
            serial: captures[3].to_string(),
        })
    }

    /// Returns `<root>/<bird_id>/<day>`.
    pub fn destination_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.bird_id).join(&self.day)
    }

    /// Returns `<root>/<bird_id>/<day>/<file_name>`.
    pub fn destination_path(&self, root: &Path) -> PathBuf {
        self.destination_dir(root).join(&self.file_name)
    }
}
