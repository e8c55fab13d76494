//! Lock collaborator and scoped acquisition
//!
//! The manager only needs `acquire() -> bool` and `release()`. How mutual
//! exclusion is achieved is up to the implementation: [`FileLock`] uses an
//! advisory lock file shared across processes, [`MemoryLock`] an atomic flag
//! inside one process.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use repo_fs::{LockFile, RobustnessConfig};

use crate::{Error, Result};

/// Mutual-exclusion gate around the read-modify-flush critical section.
pub trait Lock {
    /// Try to take the lock. `true` means it was granted.
    fn acquire(&self) -> bool;

    /// Give the lock back. Calling it when the lock is not held is a no-op.
    fn release(&self);
}

impl<T: Lock + ?Sized> Lock for &T {
    fn acquire(&self) -> bool {
        (**self).acquire()
    }

    fn release(&self) {
        (**self).release()
    }
}

impl<T: Lock + ?Sized> Lock for Box<T> {
    fn acquire(&self) -> bool {
        (**self).acquire()
    }

    fn release(&self) {
        (**self).release()
    }
}

impl<T: Lock + ?Sized> Lock for Arc<T> {
    fn acquire(&self) -> bool {
        (**self).acquire()
    }

    fn release(&self) {
        (**self).release()
    }
}

/// A granted lock. Releases it when dropped, on every exit path.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard<'a, L: Lock + ?Sized> {
    lock: &'a L,
}

impl<'a, L: Lock + ?Sized> LockGuard<'a, L> {
    /// Acquire `lock`, failing with [`Error::LockAcquisition`] when refused.
    pub fn acquire(lock: &'a L) -> Result<Self> {
        if lock.acquire() {
            Ok(Self { lock })
        } else {
            tracing::warn!("Configuration lock refused");
            Err(Error::LockAcquisition)
        }
    }
}

impl<L: Lock + ?Sized> Drop for LockGuard<'_, L> {
    fn drop(&mut self) {
        self.lock.release();
    }
}

/// In-process lock backed by an atomic flag.
#[derive(Debug, Default)]
pub struct MemoryLock {
    held: AtomicBool,
}

impl MemoryLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

impl Lock for MemoryLock {
    fn acquire(&self) -> bool {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn release(&self) {
        self.held.store(false, Ordering::Release);
    }
}

/// Cross-process lock on an advisory lock file.
///
/// By default `acquire` does not wait: a lock held elsewhere is refused
/// immediately. [`FileLock::with_robustness`] makes it retry with backoff
/// for up to the configured timeout.
#[derive(Debug)]
pub struct FileLock {
    path: PathBuf,
    robustness: Option<RobustnessConfig>,
    handle: Mutex<Option<LockFile>>,
}

impl FileLock {
    /// Lock on an explicit lock file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            robustness: None,
            handle: Mutex::new(None),
        }
    }

    /// Lock guarding mutations of `document`: `<document>.manager.lock`.
    ///
    /// Distinct from the `<document>.lock` taken by atomic writes, so a
    /// flush can run while this lock is held.
    pub fn for_document(document: &Path) -> Self {
        let mut name = document.as_os_str().to_os_string();
        name.push(".manager.lock");
        Self::new(name)
    }

    /// Wait for a contended lock up to `robustness.lock_timeout`.
    pub fn with_robustness(mut self, robustness: RobustnessConfig) -> Self {
        self.robustness = Some(robustness);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this handle currently holds the lock.
    pub fn is_held(&self) -> bool {
        self.handle().is_some()
    }

    fn handle(&self) -> MutexGuard<'_, Option<LockFile>> {
        self.handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Lock for FileLock {
    fn acquire(&self) -> bool {
        let mut handle = self.handle();
        if handle.is_some() {
            return false;
        }

        let result = match self.robustness {
            Some(config) => LockFile::acquire(&self.path, config).map(Some),
            None => LockFile::try_acquire(&self.path),
        };

        match result {
            Ok(Some(lock)) => {
                *handle = Some(lock);
                true
            }
            Ok(None) => {
                tracing::debug!(path = ?self.path, "Lock file held by another owner");
                false
            }
            Err(e) => {
                tracing::warn!(path = ?self.path, "Failed to take lock file: {}", e);
                false
            }
        }
    }

    fn release(&self) {
        if let Some(lock) = self.handle().take() {
            if let Err(e) = lock.release() {
                tracing::warn!(path = ?self.path, "Failed to release lock file: {}", e);
            }
        }
    }
}
