use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use calnote_core::{
    CalnoteConfig, HttpSource, NoteAppender, NoteQueue, NoteWatcher, Pipeline, QueueSettings,
    Reconciler, TaskStore,
};
use owo_colors::OwoColorize;
use tokio::runtime::Handle;

use crate::singleton;

/// Extra time the worker gets, on top of one settle delay and one fetch, to
/// finish the cycle it is in when Ctrl-C arrives.
const SHUTDOWN_SLACK: Duration = Duration::from_secs(5);

pub async fn run(config: CalnoteConfig) -> Result<()> {
    let url = config.require_calendar_url()?;
    let notes_dir = config.expanded_notes_dir()?;
    if !notes_dir.is_dir() {
        bail!("Notes folder {} does not exist", notes_dir.display());
    }

    let settle_delay = config.settle_delay()?;
    let fetch_timeout = config.fetch_timeout()?;
    let store_path = config.expanded_store_path()?;

    let _lock = singleton::acquire_lock(&store_path)?;
    let store = TaskStore::open(&store_path)?;
    let source = HttpSource::new(url, fetch_timeout)?;
    tracing::info!(url = %source.url(), store = %store.path().display(), "Task store ready");

    let pipeline = Arc::new(Pipeline::new(
        Reconciler::new(source, store.clone()),
        NoteAppender::new(),
    ));
    let settings = QueueSettings {
        note_extension: config.note_extension().to_string(),
        settle_delay,
    };
    let queue = Arc::new(NoteQueue::new(pipeline, settings, Handle::current()));
    let watcher = NoteWatcher::start(&notes_dir, Arc::clone(&queue))?;

    println!(
        "Watching {} for new daily notes {}",
        notes_dir.display().bold(),
        "(Ctrl-C to stop)".dimmed()
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Stopping watcher");

    drop(watcher);
    queue.shutdown(settle_delay + fetch_timeout + SHUTDOWN_SLACK).await;
    store.close();

    println!("Stopped");
    Ok(())
}
