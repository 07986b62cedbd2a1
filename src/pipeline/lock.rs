//! Output-directory run lock
//!
//! An exclusive OS advisory lock on `.live-catalog.lock`. Holding a `RunLock`
//! means no other run is writing to the same output directory. The kernel
//! drops the lock when its holder exits, so a run that was killed or aborted
//! never blocks later runs; a lock file left on disk without a holder is
//! simply taken over.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use fs2::FileExt;
use tracing::{debug, warn};

use crate::errors::{AppError, AppResult};

pub const LOCK_FILENAME: &str = ".live-catalog.lock";

#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    // the advisory lock lives as long as this handle
    file: File,
}

impl RunLock {
    pub fn lock_path(directory: &Path) -> PathBuf {
        directory.join(LOCK_FILENAME)
    }

    /// Take the lock for `directory`, creating the directory if needed
    ///
    /// Blocking; async callers go through [`RunLock::acquire_async`].
    pub fn acquire(directory: &Path) -> AppResult<Self> {
        fs::create_dir_all(directory)?;
        let path = Self::lock_path(directory);

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        if let Err(e) = file.try_lock_exclusive() {
            if e.kind() == fs2::lock_contended_error().kind() {
                return Err(AppError::operation_in_progress(
                    "catalog run",
                    path.display().to_string(),
                ));
            }
            return Err(e.into());
        }

        let previous = fs::read_to_string(&path).unwrap_or_default();
        if !previous.trim().is_empty() {
            warn!(
                "Taking over run lock {} left by an earlier run ({})",
                path.display(),
                previous.lines().next().unwrap_or_default()
            );
        }

        file.set_len(0)?;
        writeln!(
            file,
            "pid={}\nstarted_at={}",
            std::process::id(),
            Utc::now().to_rfc3339()
        )?;
        debug!("Acquired run lock {}", path.display());

        Ok(Self { path, file })
    }

    /// Take the lock on the blocking thread pool
    pub async fn acquire_async(directory: PathBuf) -> AppResult<Self> {
        tokio::task::spawn_blocking(move || Self::acquire(&directory))
            .await
            .map_err(|e| AppError::internal(format!("Run lock task failed: {e}")))?
    }

    /// Remove the lock file so the next run starts on a fresh one
    ///
    /// Only needed when a live process still holds the lock but is known to
    /// be stuck. Returns whether a lock file was present.
    pub fn force_release(directory: &Path) -> AppResult<bool> {
        let path = Self::lock_path(directory);
        match fs::remove_file(&path) {
            Ok(()) => {
                warn!("Removed existing run lock {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        // clear the holder record; the lock itself goes with the handle
        if let Err(e) = self.file.set_len(0) {
            warn!("Failed to clear run lock {}: {}", self.path.display(), e);
        }
        debug!("Released run lock {}", self.path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_acquire_fails_until_released() {
        let temp = TempDir::new().unwrap();

        let lock = RunLock::acquire(temp.path()).unwrap();
        let content = fs::read_to_string(lock.path()).unwrap();
        assert!(content.starts_with(&format!("pid={}", std::process::id())));

        let err = RunLock::acquire(temp.path()).unwrap_err();
        assert!(matches!(err, AppError::OperationInProgress { .. }));

        drop(lock);
        assert!(RunLock::acquire(temp.path()).is_ok());
    }

    #[test]
    fn test_lock_file_without_holder_is_taken_over() {
        let temp = TempDir::new().unwrap();
        let path = RunLock::lock_path(temp.path());
        // left behind by a process that no longer exists
        fs::write(&path, "pid=4194303\nstarted_at=2026-01-01T00:00:00+00:00\n").unwrap();

        let lock = RunLock::acquire(temp.path()).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(&format!("pid={}\n", std::process::id())));
        assert!(!content.contains("4194303"));

        drop(lock);
        assert!(fs::read_to_string(&path).unwrap().is_empty());
        assert!(RunLock::acquire(temp.path()).is_ok());
    }

    #[test]
    fn test_force_release_removes_lock_file() {
        let temp = TempDir::new().unwrap();
        fs::write(RunLock::lock_path(temp.path()), "pid=1\n").unwrap();

        assert!(RunLock::force_release(temp.path()).unwrap());
        assert!(!RunLock::force_release(temp.path()).unwrap());
        assert!(RunLock::acquire(temp.path()).is_ok());
    }

    #[test]
    fn test_acquire_creates_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("data");
        let _lock = RunLock::acquire(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn test_acquire_async_refuses_held_lock() {
        let temp = TempDir::new().unwrap();
        let _held = RunLock::acquire(temp.path()).unwrap();

        let err = RunLock::acquire_async(temp.path().to_path_buf())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::OperationInProgress { .. }));
    }
}
