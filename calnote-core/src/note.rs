//! Daily notes: recognising them and appending tasks to them.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use fs2::FileExt;

use crate::error::{CalNoteError, CalNoteResult};
use crate::task::TaskRecord;

/// The date a daily note is for, if `path` is one.
///
/// A daily note is a file named `YYYY-MM-DD.<extension>`.
pub fn daily_note_date(path: &Path, extension: &str) -> Option<NaiveDate> {
    let ext = path.extension()?.to_str()?;
    if ext != extension {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
}

/// Render tasks as the block appended to a note: a blank line, one checklist
/// line per task, and a trailing newline.
pub fn render_block(tasks: &[TaskRecord]) -> String {
    let lines: Vec<String> = tasks.iter().map(TaskRecord::checklist_line).collect();
    format!("\n{}\n", lines.join("\n"))
}

/// Appends task blocks to note files.
#[derive(Debug, Clone, Default)]
pub struct NoteAppender;

impl NoteAppender {
    pub fn new() -> Self {
        NoteAppender
    }

    /// Append `tasks` to the note at `path` in a single write.
    ///
    /// Does nothing for an empty slice. The file is held under an exclusive
    /// advisory lock for the duration of the write so a cooperating writer
    /// never observes half a block.
    pub fn append_tasks(&self, path: &Path, tasks: &[TaskRecord]) -> CalNoteResult<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let block = render_block(tasks);
        let append_err = |source: std::io::Error| CalNoteError::Append {
            path: path.to_path_buf(),
            source,
        };

        // No `create`: a note removed before we got to it stays removed.
        let mut file = OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(append_err)?;

        file.lock_exclusive().map_err(append_err)?;
        let written = file
            .write_all(block.as_bytes())
            .and_then(|_| file.sync_data());
        let unlocked = FileExt::unlock(&file);
        written.map_err(append_err)?;
        unlocked.map_err(append_err)?;

        tracing::info!(path = %path.display(), count = tasks.len(), "Appended tasks to note");
        Ok(())
    }
}

/// Canonical form of a note path, used as the key for "already processed".
pub fn note_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_daily_note_date_filters_names() {
        assert_eq!(
            daily_note_date(Path::new("/vault/2024-03-15.md"), "md"),
            Some(date(2024, 3, 15))
        );
        assert_eq!(daily_note_date(Path::new("/vault/notes.txt"), "md"), None);
        assert_eq!(daily_note_date(Path::new("/vault/abc.md"), "md"), None);
        assert_eq!(daily_note_date(Path::new("/vault/2024-03-15.txt"), "md"), None);
        assert_eq!(daily_note_date(Path::new("/vault/2024-02-30.md"), "md"), None);
        assert_eq!(daily_note_date(Path::new("/vault/2024-03-15"), "md"), None);
    }

    #[test]
    fn test_render_block() {
        let tasks = vec![
            TaskRecord::new("Team sync", date(2024, 3, 15)),
            TaskRecord::new("Dentist", date(2024, 3, 16)),
        ];
        assert_eq!(
            render_block(&tasks),
            "\n- [ ] Team sync(@2024-03-15)\n- [ ] Dentist(@2024-03-16)\n"
        );
    }

    #[test]
    fn test_append_tasks_appends_after_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2024-03-15.md");
        std::fs::write(&path, "# Friday").unwrap();

        NoteAppender::new()
            .append_tasks(&path, &[TaskRecord::new("Team sync", date(2024, 3, 15))])
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "# Friday\n- [ ] Team sync(@2024-03-15)\n");
    }

    #[test]
    fn test_append_nothing_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2024-03-15.md");
        std::fs::write(&path, "unchanged").unwrap();

        NoteAppender::new().append_tasks(&path, &[]).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "unchanged");
    }

    #[test]
    fn test_append_to_missing_file_is_append_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2024-03-15.md");

        let result = NoteAppender::new()
            .append_tasks(&path, &[TaskRecord::new("Team sync", date(2024, 3, 15))]);

        assert!(matches!(result, Err(CalNoteError::Append { .. })));
        assert!(!path.exists());
    }
}
