//! Advisory lock files
//!
//! A [`LockFile`] holds an exclusive `fs2` lock on a dedicated file next to
//! the resource it guards. Other processes (and other handles in this
//! process) cannot take the same lock until it is released.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use fs2::FileExt;

use crate::{Error, Result, RobustnessConfig};

/// An exclusive advisory lock on a lock file.
///
/// The lock is released by [`LockFile::release`] or when the value is dropped.
#[derive(Debug)]
pub struct LockFile {
    file: File,
    path: PathBuf,
}

impl LockFile {
    /// Lock file used to guard writes to `target`: `<target>.lock`.
    pub fn path_for(target: &Path) -> PathBuf {
        let mut name = target.as_os_str().to_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Try to take the lock without waiting.
    ///
    /// Returns `Ok(None)` when another owner holds it.
    pub fn try_acquire(path: impl Into<PathBuf>) -> Result<Option<Self>> {
        let path = path.into();
        let file = open_lock_file(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file, path })),
            Err(e) if is_contended(&e) => Ok(None),
            Err(_) => Err(Error::LockFailed { path }),
        }
    }

    /// Take the lock, retrying with exponential backoff until
    /// `config.lock_timeout` has elapsed.
    pub fn acquire(path: impl Into<PathBuf>, config: RobustnessConfig) -> Result<Self> {
        let path = path.into();
        let file = open_lock_file(&path)?;

        let mut backoff = ExponentialBackoff {
            current_interval: Duration::from_millis(10),
            initial_interval: Duration::from_millis(10),
            max_interval: Duration::from_millis(250),
            max_elapsed_time: Some(config.lock_timeout),
            ..ExponentialBackoff::default()
        };

        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(Self { file, path }),
                Err(e) if is_contended(&e) => match backoff.next_backoff() {
                    Some(wait) => {
                        tracing::debug!(?path, ?wait, "Lock contended, retrying");
                        std::thread::sleep(wait);
                    }
                    None => return Err(Error::LockContended { path }),
                },
                Err(_) => return Err(Error::LockFailed { path }),
            }
        }
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock explicitly.
    pub fn release(self) -> Result<()> {
        self.file
            .unlock()
            .map_err(|_| Error::LockFailed { path: self.path.clone() })
    }
}

fn open_lock_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
    }

    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| Error::io(path, e))
}

fn is_contended(err: &std::io::Error) -> bool {
    err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
        || err.kind() == std::io::ErrorKind::WouldBlock
}
