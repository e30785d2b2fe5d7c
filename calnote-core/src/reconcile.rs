//! Reconciling the remote calendar against the task store.

use crate::error::{CalNoteError, CalNoteResult};
use crate::ics::parse_tasks;
use crate::source::CalendarSource;
use crate::store::TaskStore;
use crate::task::TaskRecord;

/// Fetches the calendar and works out which of its events are new.
pub struct Reconciler<S> {
    source: S,
    store: TaskStore,
}

impl<S: CalendarSource> Reconciler<S> {
    pub fn new(source: S, store: TaskStore) -> Self {
        Reconciler { source, store }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Tasks not seen before, in calendar order. Each one is recorded in the
    /// store before it is returned.
    ///
    /// Never fails: a fetch or parse problem is logged and yields no tasks,
    /// and the next trigger simply tries again.
    pub async fn fetch_new_tasks(&self) -> Vec<TaskRecord> {
        match self.try_fetch_new_tasks().await {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::warn!("Could not reconcile calendar: {e}");
                Vec::new()
            }
        }
    }

    async fn try_fetch_new_tasks(&self) -> CalNoteResult<Vec<TaskRecord>> {
        let body = self.source.fetch().await?;
        let tasks = parse_tasks(&body)?;
        tracing::info!(events = tasks.len(), "Fetched calendar");

        let store = self.store.clone();
        let new_tasks = tokio::task::spawn_blocking(move || record_new(&store, tasks))
            .await
            .map_err(|e| CalNoteError::Io(std::io::Error::other(e)))??;

        tracing::info!(new = new_tasks.len(), "Reconciled calendar");
        Ok(new_tasks)
    }
}

/// Record each task, keeping the ones this call inserted.
///
/// If the store fails partway, the tasks already inserted are still returned:
/// they are committed and would otherwise never reach a note.
fn record_new(store: &TaskStore, tasks: Vec<TaskRecord>) -> CalNoteResult<Vec<TaskRecord>> {
    let handle = store.handle()?;
    let mut new_tasks = Vec::new();

    for task in tasks {
        match handle.record_if_new(&task) {
            Ok(true) => {
                tracing::info!("New task: {task}");
                new_tasks.push(task);
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!("Stopped recording tasks at {task}: {e}");
                break;
            }
        }
    }

    Ok(new_tasks)
}
