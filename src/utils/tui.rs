use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Spinner shown while a one-shot sync talks to the calendar server.
pub fn sync_spinner(note: &Path) -> ProgressBar {
    let name = note
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| note.display().to_string());

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["-", "\\", "|", "/", "-"])
            .template("{msg} {spinner}")
            .expect("spinner template is valid"),
    );
    spinner.set_message(format!("Syncing {name}"));
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}
