//! wavsort - sort field recordings into a per-bird, per-day directory tree
//!
//! Recordings named `<BirdID>_<Day>_<Serial>.wav` are copied from a flat
//! source directory into `<dest>/<BirdID>/<Day>/`. The library covers file
//! name parsing, the copy pass, run history with undo, TOML configuration and
//! the directory prompts used by the binary.

pub mod cli;
pub mod config;
pub mod file_organizer;
pub mod output;
pub mod picker;
pub mod recording;
pub mod undo;

pub use config::{CompiledFilters, ConfigError, SortConfig};
pub use file_organizer::{FileOrganizer, OrganizeError, OrganizeOptions, OrganizeReport};
pub use recording::RecordingName;
pub use undo::{UndoManager, UndoReport};

pub use cli::{OrganizeCommand, run_cli};
