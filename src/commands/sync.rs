use std::path::PathBuf;

use anyhow::{Result, bail};
use calnote_core::note::daily_note_date;
use calnote_core::{
    CalnoteConfig, CycleOutcome, HttpSource, NoteAppender, Pipeline, Reconciler, TaskStore,
};
use owo_colors::OwoColorize;

use crate::utils::tui;

pub async fn run(config: CalnoteConfig, note: PathBuf) -> Result<()> {
    let extension = config.note_extension();
    if daily_note_date(&note, extension).is_none() {
        bail!(
            "{} is not a daily note (expected a name like 2024-03-15.{})",
            note.display(),
            extension
        );
    }
    if !note.is_file() {
        bail!("{} does not exist", note.display());
    }

    let url = config.require_calendar_url()?;
    let store = TaskStore::open(config.expanded_store_path()?)?;
    let source = HttpSource::new(url, config.fetch_timeout()?)?;
    let pipeline = Pipeline::new(Reconciler::new(source, store.clone()), NoteAppender::new());

    let spinner = tui::sync_spinner(&note);
    let outcome = pipeline.run_cycle(&note).await;
    spinner.finish_and_clear();
    store.close();

    match outcome {
        CycleOutcome::NoNewTasks => {
            println!("{}", "No new tasks".dimmed());
            Ok(())
        }
        CycleOutcome::Appended(tasks) => {
            println!("Added {} task(s) to {}", tasks.len(), note.display().bold());
            for task in &tasks {
                println!("  {}", task.checklist_line().green());
            }
            Ok(())
        }
        CycleOutcome::AppendFailed(tasks) => bail!(
            "Could not write {} task(s) to {}; they are recorded and will not be offered again",
            tasks.len(),
            note.display()
        ),
    }
}
