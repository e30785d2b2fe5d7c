//! Watching the notes folder and feeding new daily notes to a single worker.
//!
//! The filesystem callback only enqueues paths. One worker task drains the
//! queue in arrival order and runs at most one cycle at a time, so the store
//! and the notes are never touched by two cycles at once.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use notify::event::CreateKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::error::CalNoteResult;
use crate::note::{daily_note_date, note_key};
use crate::pipeline::{CycleOutcome, Pipeline};
use crate::source::CalendarSource;

/// How the worker decides what to process.
#[derive(Debug, Clone)]
pub struct QueueSettings {
    /// Extension of daily notes, without the dot.
    pub note_extension: String,
    /// Pause between picking up a note and appending to it.
    pub settle_delay: Duration,
}

/// Pending-path queue with a lazily started, single consumer.
pub struct NoteQueue<S> {
    tx: mpsc::UnboundedSender<PathBuf>,
    shutdown: watch::Sender<bool>,
    state: Mutex<WorkerState<S>>,
    runtime: Handle,
}

enum WorkerState<S> {
    Idle(Worker<S>),
    Running(JoinHandle<()>),
    Stopped,
}

impl<S: CalendarSource> NoteQueue<S> {
    /// The worker is spawned on `runtime` when the first path arrives.
    pub fn new(pipeline: Arc<Pipeline<S>>, settings: QueueSettings, runtime: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);

        let worker = Worker {
            rx,
            shutdown: shutdown_rx,
            pipeline,
            settings,
        };

        NoteQueue {
            tx,
            shutdown,
            state: Mutex::new(WorkerState::Idle(worker)),
            runtime,
        }
    }

    /// Called for every created file. Never blocks.
    pub fn on_file_created(&self, path: PathBuf) {
        self.ensure_worker();
        if let Err(e) = self.tx.send(path) {
            tracing::warn!(path = %e.0.display(), "Queue is shut down, dropping path");
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.lock_state(), WorkerState::Running(_))
    }

    fn ensure_worker(&self) {
        let mut state = self.lock_state();
        if !matches!(*state, WorkerState::Idle(_)) {
            return;
        }
        if let WorkerState::Idle(worker) = std::mem::replace(&mut *state, WorkerState::Stopped) {
            tracing::debug!("Starting note worker");
            *state = WorkerState::Running(self.runtime.spawn(worker.run()));
        }
    }

    /// Ask the worker to stop once its current cycle is done and wait up to
    /// `grace` for it. Paths still queued are dropped.
    ///
    /// If the grace period runs out the worker is left detached and its cycle
    /// is cut short wherever it is when the runtime shuts down.
    pub async fn shutdown(&self, grace: Duration) {
        let _ = self.shutdown.send(true);

        let previous = std::mem::replace(&mut *self.lock_state(), WorkerState::Stopped);
        if let WorkerState::Running(handle) = previous {
            match tokio::time::timeout(grace, handle).await {
                Ok(Ok(())) => tracing::debug!("Note worker stopped"),
                Ok(Err(e)) => tracing::warn!("Note worker ended abnormally: {e}"),
                Err(_) => tracing::warn!("Note worker still busy after {grace:?}, leaving it"),
            }
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, WorkerState<S>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct Worker<S> {
    rx: mpsc::UnboundedReceiver<PathBuf>,
    shutdown: watch::Receiver<bool>,
    pipeline: Arc<Pipeline<S>>,
    settings: QueueSettings,
}

impl<S: CalendarSource> Worker<S> {
    async fn run(self) {
        let Worker {
            mut rx,
            mut shutdown,
            pipeline,
            settings,
        } = self;

        // Notes handled since startup. Not persisted: a restart re-arms every
        // note, and the task store keeps that from producing duplicates.
        let mut processed: HashSet<PathBuf> = HashSet::new();

        loop {
            let path = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                next = rx.recv() => match next {
                    Some(path) => path,
                    None => break,
                },
            };
            process(&pipeline, &settings, path, &mut processed).await;
        }
    }
}

async fn process<S: CalendarSource>(
    pipeline: &Arc<Pipeline<S>>,
    settings: &QueueSettings,
    path: PathBuf,
    processed: &mut HashSet<PathBuf>,
) {
    let Some(date) = daily_note_date(&path, &settings.note_extension) else {
        tracing::debug!(path = %path.display(), "Not a daily note, ignoring");
        return;
    };

    if !processed.insert(note_key(&path)) {
        tracing::debug!(path = %path.display(), "Already processed, ignoring");
        return;
    }

    tracing::info!(path = %path.display(), %date, "New daily note");
    tokio::time::sleep(settings.settle_delay).await;

    // A separate task so a panic inside one cycle cannot take the worker down.
    let cycle = {
        let pipeline = Arc::clone(pipeline);
        let target = path.clone();
        tokio::spawn(async move { pipeline.run_cycle(&target).await })
    };

    match cycle.await {
        Ok(CycleOutcome::Appended(tasks)) => {
            tracing::info!(path = %path.display(), count = tasks.len(), "Cycle complete");
        }
        Ok(CycleOutcome::NoNewTasks) => {}
        Ok(CycleOutcome::AppendFailed(tasks)) => {
            tracing::warn!(path = %path.display(), lost = tasks.len(), "Cycle finished without writing its tasks");
        }
        Err(e) => tracing::warn!(path = %path.display(), "Cycle aborted: {e}"),
    }
}

/// Recursive filesystem watch feeding a [`NoteQueue`]. Watching stops on drop.
pub struct NoteWatcher {
    _watcher: RecommendedWatcher,
}

impl NoteWatcher {
    pub fn start<S: CalendarSource>(root: &Path, queue: Arc<NoteQueue<S>>) -> CalNoteResult<Self> {
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for path in created_files(&event) {
                    queue.on_file_created(path.clone());
                }
            }
            Err(e) => tracing::warn!("Watch error: {e}"),
        })?;

        watcher.watch(root, RecursiveMode::Recursive)?;
        tracing::info!(root = %root.display(), "Watching for new notes");

        Ok(NoteWatcher { _watcher: watcher })
    }
}

/// Paths of files (not directories) that `event` reports as created.
fn created_files(event: &Event) -> Vec<&PathBuf> {
    match event.kind {
        EventKind::Create(CreateKind::Folder) => Vec::new(),
        EventKind::Create(_) => event.paths.iter().filter(|p| !p.is_dir()).collect(),
        _ => Vec::new(),
    }
}
