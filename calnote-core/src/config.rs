//! calnote configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CalNoteError, CalNoteResult};

static DEFAULT_NOTES_DIR: &str = ".";
static DEFAULT_STORE_PATH: &str = "tasks.db";
static DEFAULT_NOTE_EXTENSION: &str = "md";
static DEFAULT_SETTLE_DELAY: &str = "500ms";
static DEFAULT_FETCH_TIMEOUT: &str = "10s";

fn default_notes_dir() -> PathBuf {
    PathBuf::from(DEFAULT_NOTES_DIR)
}

fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

fn default_note_extension() -> String {
    DEFAULT_NOTE_EXTENSION.to_string()
}

fn default_settle_delay() -> String {
    DEFAULT_SETTLE_DELAY.to_string()
}

fn default_fetch_timeout() -> String {
    DEFAULT_FETCH_TIMEOUT.to_string()
}

/// Configuration at ~/.config/calnote/config.toml
///
/// Every component receives the pieces it needs from this struct at
/// construction time; nothing reads it globally.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CalnoteConfig {
    /// Remote calendar to pull events from. `webcal://` is accepted.
    #[serde(default)]
    pub calendar_url: String,

    /// Directory tree holding the daily notes, watched recursively.
    #[serde(default = "default_notes_dir")]
    pub notes_dir: PathBuf,

    /// SQLite file recording which tasks were already emitted.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Extension (without the dot) of files treated as daily notes.
    #[serde(default = "default_note_extension")]
    pub note_extension: String,

    /// Pause before touching a freshly created note, e.g. "500ms".
    #[serde(default = "default_settle_delay")]
    pub settle_delay: String,

    /// Upper bound on a single calendar fetch, e.g. "10s".
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout: String,
}

impl Default for CalnoteConfig {
    fn default() -> Self {
        CalnoteConfig {
            calendar_url: String::new(),
            notes_dir: default_notes_dir(),
            store_path: default_store_path(),
            note_extension: default_note_extension(),
            settle_delay: default_settle_delay(),
            fetch_timeout: default_fetch_timeout(),
        }
    }
}

impl CalnoteConfig {
    pub fn config_path() -> CalNoteResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalNoteError::Config("Could not determine config directory".into()))?
            .join("calnote");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the config at `path`, or at the default location when `None`.
    /// A missing file is not an error: defaults are used.
    pub fn load(path: Option<&Path>) -> CalNoteResult<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !path.exists() {
            return Ok(CalnoteConfig::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            CalNoteError::Config(format!("Could not read {}: {e}", path.display()))
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> CalNoteResult<Self> {
        toml::from_str(content).map_err(|e| CalNoteError::Config(e.to_string()))
    }

    /// The calendar URL, or an error telling the user how to set one.
    pub fn require_calendar_url(&self) -> CalNoteResult<&str> {
        let url = self.calendar_url.trim();
        if url.is_empty() {
            return Err(CalNoteError::Config(
                "No calendar_url configured. Set it in the config file or pass --url".into(),
            ));
        }
        Ok(url)
    }

    /// `notes_dir` with a leading `~` and environment variables expanded.
    pub fn expanded_notes_dir(&self) -> CalNoteResult<PathBuf> {
        expand_path(&self.notes_dir)
    }

    pub fn expanded_store_path(&self) -> CalNoteResult<PathBuf> {
        expand_path(&self.store_path)
    }

    /// Note extension without a leading dot.
    pub fn note_extension(&self) -> &str {
        self.note_extension.trim_start_matches('.')
    }

    pub fn settle_delay(&self) -> CalNoteResult<Duration> {
        parse_duration("settle_delay", &self.settle_delay)
    }

    pub fn fetch_timeout(&self) -> CalNoteResult<Duration> {
        parse_duration("fetch_timeout", &self.fetch_timeout)
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> CalNoteResult<()> {
        let contents = format!(
            "\
# calnote configuration

# Calendar to pull events from (webcal:// links are fine):
# calendar_url = \"webcal://example.com/calendar.ics\"

# Folder containing your daily notes (watched recursively):
# notes_dir = \"{DEFAULT_NOTES_DIR}\"

# Where already-added tasks are remembered:
# store_path = \"{DEFAULT_STORE_PATH}\"

# Only files named YYYY-MM-DD.<note_extension> are filled in:
# note_extension = \"{DEFAULT_NOTE_EXTENSION}\"

# How long to wait for a new note to be written before appending:
# settle_delay = \"{DEFAULT_SETTLE_DELAY}\"

# Give up on a calendar download after:
# fetch_timeout = \"{DEFAULT_FETCH_TIMEOUT}\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CalNoteError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CalNoteError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

fn expand_path(path: &Path) -> CalNoteResult<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .map_err(|e| CalNoteError::Config(format!("Could not expand {raw}: {e}")))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

fn parse_duration(field: &str, value: &str) -> CalNoteResult<Duration> {
    humantime::parse_duration(value.trim())
        .map_err(|e| CalNoteError::Config(format!("Invalid {field} '{value}': {e}")))
}
