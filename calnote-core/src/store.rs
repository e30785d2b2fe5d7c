//! Durable record of which tasks have already been written to a note.
//!
//! Backed by a single SQLite file in WAL mode. Each caller checks out its own
//! connection from [`TaskStore`]; SQLite serializes the writers, and
//! [`StoreHandle::record_if_new`] is a single `INSERT OR IGNORE`, so two
//! overlapping reconciliations can never both claim the same task.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{CalNoteError, CalNoteResult};
use crate::task::TaskRecord;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Pool of connections to the task database.
///
/// Cloning is cheap and shares the pool.
#[derive(Clone, Debug)]
pub struct TaskStore {
    inner: Arc<Pool>,
}

#[derive(Debug)]
struct Pool {
    path: PathBuf,
    idle: Mutex<Vec<Connection>>,
}

impl TaskStore {
    /// Open (creating if needed) the store at `path` and make sure the schema exists.
    ///
    /// Anything that prevents that, from a missing parent directory to a file
    /// that is not a database, is reported as `StorageUnavailable`.
    pub fn open(path: impl AsRef<Path>) -> CalNoteResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| unavailable(&path, e))?;
        }

        let conn = connect(&path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
              name TEXT NOT NULL,
              due_date TEXT NOT NULL,
              PRIMARY KEY (name, due_date)
            ) WITHOUT ROWID;
            "#,
        )
        .map_err(|e| unavailable(&path, e))?;

        Ok(TaskStore {
            inner: Arc::new(Pool {
                path,
                idle: Mutex::new(vec![conn]),
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Check out a connection. It goes back to the pool when the handle drops.
    pub fn handle(&self) -> CalNoteResult<StoreHandle> {
        let pooled = self.inner.idle.lock().ok().and_then(|mut idle| idle.pop());
        let conn = match pooled {
            Some(conn) => conn,
            None => connect(&self.inner.path)?,
        };
        Ok(StoreHandle {
            conn: Some(conn),
            pool: Arc::clone(&self.inner),
        })
    }

    /// Drop every idle connection. Handles still checked out close when dropped.
    pub fn close(&self) {
        if let Ok(mut idle) = self.inner.idle.lock() {
            idle.clear();
        }
    }
}

/// One connection to the task database, owned by a single caller.
pub struct StoreHandle {
    conn: Option<Connection>,
    pool: Arc<Pool>,
}

impl StoreHandle {
    fn conn(&self) -> &Connection {
        // Only `Drop` takes the connection out.
        self.conn.as_ref().expect("store handle used after drop")
    }

    /// Whether `(name, due_date)` was recorded before.
    pub fn has(&self, name: &str, due_date: NaiveDate) -> CalNoteResult<bool> {
        let found = self
            .conn()
            .query_row(
                "SELECT 1 FROM tasks WHERE name = ?1 AND due_date = ?2",
                params![name, date_key(due_date)],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Record the task if it is not there yet. Returns `true` only for the
    /// caller that actually inserted it. The row is durable once this returns.
    pub fn record_if_new(&self, task: &TaskRecord) -> CalNoteResult<bool> {
        let changed = self.conn().execute(
            "INSERT OR IGNORE INTO tasks (name, due_date) VALUES (?1, ?2)",
            params![task.name, task.due_date_key()],
        )?;
        Ok(changed == 1)
    }

    /// Every recorded task, ordered by due date then name.
    pub fn list(&self) -> CalNoteResult<Vec<TaskRecord>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT name, due_date FROM tasks ORDER BY due_date, name")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut tasks = Vec::new();
        for row in rows {
            let (name, due_date) = row?;
            // Rows are only ever written through `record_if_new`.
            let Ok(due_date) = NaiveDate::parse_from_str(&due_date, "%Y-%m-%d") else {
                tracing::warn!(name = %name, due_date = %due_date, "Skipping task with unreadable date");
                continue;
            };
            tasks.push(TaskRecord { name, due_date });
        }
        Ok(tasks)
    }

    pub fn count(&self) -> CalNoteResult<u64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl Drop for StoreHandle {
    fn drop(&mut self) {
        if let (Some(conn), Ok(mut idle)) = (self.conn.take(), self.pool.idle.lock()) {
            idle.push(conn);
        }
    }
}

fn connect(path: &Path) -> CalNoteResult<Connection> {
    let conn = Connection::open(path).map_err(|e| unavailable(path, e))?;
    conn.busy_timeout(BUSY_TIMEOUT)
        .map_err(|e| unavailable(path, e))?;
    // synchronous=FULL: a recorded task must survive a crash before it is appended.
    conn.execute_batch(
        r#"
        PRAGMA journal_mode=WAL;
        PRAGMA synchronous=FULL;
        "#,
    )
    .map_err(|e| unavailable(path, e))?;
    Ok(conn)
}

fn unavailable(path: &Path, err: impl std::fmt::Display) -> CalNoteError {
    CalNoteError::StorageUnavailable {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
