//! Advisory file locks around the journal database.
//!
//! Mutating commands hold a [`StoreLock`] for the whole
//! load → mutate → persist cycle; read-only commands take a
//! [`StoreReadLock`] so they never observe a half-applied command.

use crate::error::ErrorCode;
use fs2::FileExt;
use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

/// How long commands wait for the journal lock by default.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Advisory lock errors for the journal lock file.
#[derive(Debug)]
pub enum LockError {
    Timeout { path: PathBuf, waited: Duration },
    IoError(io::Error),
}

impl From<io::Error> for LockError {
    fn from(err: io::Error) -> Self {
        Self::IoError(err)
    }
}

impl LockError {
    /// Machine-readable code associated with this lock error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout { .. } => ErrorCode::LockContention,
            Self::IoError(_) => ErrorCode::StoreWriteFailed,
        }
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

impl std::fmt::Display for LockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout { path, waited } => {
                write!(
                    f,
                    "{}: lock timed out after {:?} at {}",
                    self.code().code(),
                    waited,
                    path.display()
                )
            }
            Self::IoError(err) => write!(f, "{}: {}", self.code().code(), err),
        }
    }
}

impl std::error::Error for LockError {}

#[derive(Clone, Copy)]
enum LockKind {
    Shared,
    Exclusive,
}

#[derive(Debug)]
struct FileGuard {
    file: File,
    path: PathBuf,
}

impl FileGuard {
    fn acquire(path: &Path, timeout: Duration, kind: LockKind) -> Result<Self, LockError> {
        let parent = path.parent().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "lock path has no parent")
        })?;
        fs::create_dir_all(parent)?;

        let start = Instant::now();
        loop {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(path)?;

            let busy = match kind {
                LockKind::Shared => file.try_lock_shared().is_err(),
                LockKind::Exclusive => file.try_lock_exclusive().is_err(),
            };

            if !busy {
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                });
            }

            if start.elapsed() >= timeout {
                return Err(LockError::Timeout {
                    path: path.to_path_buf(),
                    waited: start.elapsed(),
                });
            }

            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Drop for FileGuard {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Exclusive lock held by commands that write to the journal.
#[derive(Debug)]
pub struct StoreLock {
    guard: FileGuard,
}

impl StoreLock {
    /// Acquire an exclusive advisory lock on `path`, waiting up to `timeout`.
    ///
    /// # Errors
    ///
    /// [`LockError::Timeout`] when another command holds the lock for
    /// longer than `timeout`, or an I/O error creating the lock file.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        let guard = FileGuard::acquire(path, timeout, LockKind::Exclusive)?;
        tracing::trace!(path = %path.display(), "journal write lock acquired");
        Ok(Self { guard })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.guard.path
    }
}

/// Shared lock held by read-only commands.
#[derive(Debug)]
pub struct StoreReadLock {
    guard: FileGuard,
}

impl StoreReadLock {
    /// Acquire a shared advisory lock on `path`.
    ///
    /// # Errors
    ///
    /// [`LockError::Timeout`] while a writer holds the lock, or an I/O error.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Ok(Self {
            guard: FileGuard::acquire(path, timeout, LockKind::Shared)?,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.guard.path
    }
}

#[cfg(test)]
mod tests {
    use super::{LockError, StoreLock, StoreReadLock};
    use crate::error::ErrorCode;
    use std::time::Duration;

    #[test]
    fn store_lock_acquire_and_drop() -> Result<(), LockError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(".ease").join("lock");
        {
            let lock = StoreLock::acquire(&path, Duration::from_millis(50))?;
            assert_eq!(lock.path(), path.as_path());
        }
        let again = StoreLock::acquire(&path, Duration::from_millis(50))?;
        drop(again);
        Ok(())
    }

    #[test]
    fn store_lock_times_out_when_held() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lock");
        let _guard = StoreLock::acquire(&path, Duration::from_millis(50)).unwrap();
        let err = StoreLock::acquire(&path, Duration::from_millis(20)).unwrap_err();

        assert!(matches!(err, LockError::Timeout { path: p, .. } if p == path));
    }

    #[test]
    fn readers_share_but_exclude_writers() -> Result<(), LockError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("lock");
        let first = StoreReadLock::acquire(&path, Duration::from_millis(50))?;
        let second = StoreReadLock::acquire(&path, Duration::from_millis(50))?;
        assert_eq!(first.path(), second.path());

        let err = StoreLock::acquire(&path, Duration::from_millis(20)).unwrap_err();
        assert!(matches!(err, LockError::Timeout { .. }));
        Ok(())
    }

    #[test]
    fn lock_error_maps_to_machine_code() {
        let timeout = LockError::Timeout {
            path: "lock".into(),
            waited: Duration::from_millis(10),
        };
        assert_eq!(timeout.code(), ErrorCode::LockContention);
        assert!(timeout.hint().is_some());
        assert!(timeout.to_string().starts_with("E5002"));
    }
}
