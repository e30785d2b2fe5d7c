//! One reconciliation cycle: fetch, diff, record, append.

use std::path::Path;

use crate::note::NoteAppender;
use crate::reconcile::Reconciler;
use crate::source::CalendarSource;
use crate::task::TaskRecord;

/// What a cycle did to its note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing new in the calendar (or it could not be fetched).
    NoNewTasks,
    /// These tasks were recorded and appended.
    Appended(Vec<TaskRecord>),
    /// These tasks were recorded but could not be written to the note.
    AppendFailed(Vec<TaskRecord>),
}

/// Reconciler plus appender, shared by the queue worker and one-shot syncs.
pub struct Pipeline<S> {
    reconciler: Reconciler<S>,
    appender: NoteAppender,
}

impl<S: CalendarSource> Pipeline<S> {
    pub fn new(reconciler: Reconciler<S>, appender: NoteAppender) -> Self {
        Pipeline {
            reconciler,
            appender,
        }
    }

    pub fn reconciler(&self) -> &Reconciler<S> {
        &self.reconciler
    }

    /// Run a full cycle for the note at `path`.
    ///
    /// Tasks are marked as seen before the append. If the append fails they
    /// stay seen and are not retried, so a task can go missing from a note but
    /// is never written twice.
    pub async fn run_cycle(&self, path: &Path) -> CycleOutcome {
        let tasks = self.reconciler.fetch_new_tasks().await;
        if tasks.is_empty() {
            tracing::info!(path = %path.display(), "No new tasks");
            return CycleOutcome::NoNewTasks;
        }

        let appender = self.appender.clone();
        let target = path.to_path_buf();
        let joined = tokio::task::spawn_blocking(move || {
            let result = appender.append_tasks(&target, &tasks);
            (result, tasks)
        })
        .await;

        match joined {
            Ok((Ok(()), tasks)) => CycleOutcome::Appended(tasks),
            Ok((Err(e), tasks)) => {
                tracing::warn!("{e}; {} task(s) stay recorded but were not written", tasks.len());
                CycleOutcome::AppendFailed(tasks)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "Append did not complete: {e}");
                CycleOutcome::AppendFailed(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::tests::{FakeSource, TWO_EVENTS};
    use crate::store::TaskStore;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_two_notes_same_calendar() {
        let dir = tempfile::tempdir().unwrap();
        let store = TaskStore::open(dir.path().join("tasks.db")).unwrap();
        let pipeline = Pipeline::new(
            Reconciler::new(FakeSource::serving(TWO_EVENTS), store.clone()),
            NoteAppender::new(),
        );

        let friday = dir.path().join("2024-03-15.md");
        std::fs::write(&friday, "").unwrap();
        let outcome = pipeline.run_cycle(&friday).await;

        assert_eq!(
            outcome,
            CycleOutcome::Appended(vec![
                TaskRecord::new("Team sync", date(2024, 3, 15)),
                TaskRecord::new("Dentist", date(2024, 3, 16)),
            ])
        );
        assert_eq!(
            std::fs::read_to_string(&friday).unwrap(),
            "\n- [ ] Team sync(@2024-03-15)\n- [ ] Dentist(@2024-03-16)\n"
        );
        let handle = store.handle().unwrap();
        assert!(handle.has("Team sync", date(2024, 3, 15)).unwrap());
        assert!(handle.has("Dentist", date(2024, 3, 16)).unwrap());

        let saturday = dir.path().join("2024-03-16.md");
        std::fs::write(&saturday, "# Saturday\n").unwrap();
        assert_eq!(pipeline.run_cycle(&saturday).await, CycleOutcome::NoNewTasks);
        assert_eq!(std::fs::read_to_string(&saturday).unwrap(), "# Saturday\n");
    }

    #[tokio::test]
    async fn test_append_failure_keeps_tasks_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let store = TaskStore::open(dir.path().join("tasks.db")).unwrap();
        let pipeline = Pipeline::new(
            Reconciler::new(FakeSource::serving(TWO_EVENTS), store.clone()),
            NoteAppender::new(),
        );

        let gone = dir.path().join("2024-03-15.md");
        let outcome = pipeline.run_cycle(&gone).await;

        assert!(matches!(outcome, CycleOutcome::AppendFailed(ref tasks) if tasks.len() == 2));
        assert_eq!(store.handle().unwrap().count().unwrap(), 2);

        let note = dir.path().join("2024-03-16.md");
        std::fs::write(&note, "").unwrap();
        assert_eq!(pipeline.run_cycle(&note).await, CycleOutcome::NoNewTasks);
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_note_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = TaskStore::open(dir.path().join("tasks.db")).unwrap();
        let pipeline = Pipeline::new(
            Reconciler::new(FakeSource::failing(), store),
            NoteAppender::new(),
        );

        let note = dir.path().join("2024-03-15.md");
        std::fs::write(&note, "draft").unwrap();
        assert_eq!(pipeline.run_cycle(&note).await, CycleOutcome::NoNewTasks);
        assert_eq!(std::fs::read_to_string(&note).unwrap(), "draft");
    }
}
