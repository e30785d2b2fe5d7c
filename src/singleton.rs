//! Ensure only one watcher runs against a given task store.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// A lock guard that releases the lock when dropped
pub struct LockGuard {
    _file: File,
}

/// `tasks.db` -> `tasks.db.lock`, next to the store.
fn lock_path(store_path: &Path) -> PathBuf {
    let mut name = store_path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("calnote"));
    name.push(".lock");
    store_path.with_file_name(name)
}

/// Acquire an exclusive lock, failing if another watcher holds it
pub fn acquire_lock(store_path: &Path) -> Result<LockGuard> {
    let path = lock_path(store_path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = File::create(&path).context("Failed to create lock file")?;

    file.try_lock_exclusive().map_err(|_| {
        anyhow::anyhow!(
            "Another calnote watcher is already using {}.\n\
            If you believe this is an error, remove: {}",
            store_path.display(),
            path.display()
        )
    })?;

    Ok(LockGuard { _file: file })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_path_sits_next_to_store() {
        assert_eq!(
            lock_path(Path::new("/data/tasks.db")),
            PathBuf::from("/data/tasks.db.lock")
        );
        assert_eq!(lock_path(Path::new("tasks.db")), PathBuf::from("tasks.db.lock"));
    }

    #[test]
    fn test_second_lock_is_refused_until_first_drops() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("tasks.db");

        let first = acquire_lock(&store).unwrap();
        assert!(acquire_lock(&store).is_err());
        drop(first);
        assert!(acquire_lock(&store).is_ok());
    }
}
