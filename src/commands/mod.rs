pub mod config;
pub mod sync;
pub mod tasks;
pub mod watch;

use std::path::PathBuf;

use calnote_core::CalnoteConfig;
use clap::Args;

/// Command-line values that take precedence over the config file.
#[derive(Args, Default)]
pub struct Overrides {
    /// Calendar URL (http, https or webcal)
    #[arg(long)]
    pub url: Option<String>,

    /// Folder containing the daily notes
    #[arg(long)]
    pub notes_dir: Option<PathBuf>,

    /// Task store file
    #[arg(long)]
    pub store: Option<PathBuf>,
}

impl Overrides {
    pub fn apply(self, mut config: CalnoteConfig) -> CalnoteConfig {
        if let Some(url) = self.url {
            config.calendar_url = url;
        }
        if let Some(notes_dir) = self.notes_dir {
            config.notes_dir = notes_dir;
        }
        if let Some(store) = self.store {
            config.store_path = store;
        }
        config
    }
}
