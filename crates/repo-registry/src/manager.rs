//! Configuration manager
//!
//! Reads come from a lazily loaded, cached [`Configuration`]. Every
//! mutation follows the same critical section:
//!
//! 1. acquire the [`Lock`] (refusal fails fast with [`Error::LockAcquisition`])
//! 2. mutate the cached configuration
//! 3. flush the whole document through the [`Persister`], restoring the
//!    cache if the flush fails
//! 4. release the lock, including when the flush fails
//!
//! Reads never take the lock. Each manager owns its own cache, so writes
//! made through another manager on the same store are not observed.

use indexmap::IndexMap;
use regex::Regex;

use crate::lock::{Lock, LockGuard};
use crate::persister::Persister;
use crate::{Configuration, Error, RepositoryEntry, Result};

/// Coordinates all reads and writes of the registry document.
#[derive(Debug)]
pub struct ConfigurationManager<P, L> {
    persister: P,
    lock: L,
    configuration: Option<Configuration>,
}

impl<P: Persister, L: Lock> ConfigurationManager<P, L> {
    /// Create a manager. Nothing is loaded until first access.
    pub fn new(persister: P, lock: L) -> Self {
        Self {
            persister,
            lock,
            configuration: None,
        }
    }

    pub fn persister(&self) -> &P {
        &self.persister
    }

    pub fn lock(&self) -> &L {
        &self.lock
    }

    /// Get the cached configuration, loading it on first use.
    ///
    /// A missing document yields an empty configuration. Any other load
    /// error is returned and nothing is cached.
    pub fn get_config(&mut self) -> Result<&Configuration> {
        cached(&self.persister, &mut self.configuration).map(|configuration| &*configuration)
    }

    /// All repositories in document order.
    pub fn get_repositories(&mut self) -> Result<&IndexMap<String, RepositoryEntry>> {
        Ok(self.get_config()?.repositories())
    }

    /// Look up a repository by id. Absence is `Ok(None)`.
    pub fn find_one_repository(&mut self, id: &str) -> Result<Option<&RepositoryEntry>> {
        Ok(self.get_config()?.get(id))
    }

    /// First repository, in document order, whose `url` matches `pattern`.
    ///
    /// The pattern is an unanchored regular expression. Entries without a
    /// `url` are skipped.
    pub fn find_by_url(&mut self, pattern: &str) -> Result<Option<&RepositoryEntry>> {
        let regex = Regex::new(pattern).map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        let configuration = self.get_config()?;
        Ok(configuration
            .iter()
            .find(|entry| entry.url.as_deref().is_some_and(|url| regex.is_match(url))))
    }

    /// Add a repository, replacing any entry with the same id in place.
    pub fn add(&mut self, entry: RepositoryEntry) -> Result<()> {
        tracing::debug!(id = %entry.id, kind = %entry.kind, "Adding repository");
        self.locked(|configuration| {
            configuration.insert(entry.cleaned());
        })
    }

    /// Add several repositories under one lock cycle and a single flush.
    pub fn add_all<I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = RepositoryEntry>,
    {
        let added = self.locked(|configuration| {
            let mut added = 0usize;
            for entry in entries {
                configuration.insert(entry.cleaned());
                added += 1;
            }
            added
        })?;
        tracing::debug!(count = added, "Added repositories");
        Ok(())
    }

    /// Replace `existing` with `updated`.
    ///
    /// `updated` may carry a new id; it takes the position `existing` held.
    /// Fails with [`Error::UnknownRepository`] before touching the lock when
    /// `existing.id` is not registered.
    pub fn update(&mut self, existing: &RepositoryEntry, updated: RepositoryEntry) -> Result<()> {
        if self.find_one_repository(&existing.id)?.is_none() {
            return Err(Error::UnknownRepository {
                id: existing.id.clone(),
            });
        }

        tracing::debug!(from = %existing.id, to = %updated.id, "Updating repository");
        self.locked(|configuration| {
            configuration.replace(&existing.id, updated.cleaned());
        })
    }

    /// Remove a repository. Removing an unknown id still flushes.
    pub fn delete(&mut self, entry: &RepositoryEntry) -> Result<()> {
        let removed = self.locked(|configuration| configuration.remove(&entry.id).is_some())?;
        tracing::debug!(id = %entry.id, removed, "Deleted repository");
        Ok(())
    }

    /// Write the cached configuration through the persister.
    pub fn flush(&mut self) -> Result<()> {
        let configuration = cached(&self.persister, &mut self.configuration)?;
        self.persister.flush(configuration)
    }

    /// Take the lock for a caller-managed critical section.
    pub fn acquire_lock(&self) -> Result<LockGuard<'_, L>> {
        LockGuard::acquire(&self.lock)
    }

    /// Run `mutate` on the cached configuration under the lock, then flush.
    ///
    /// When the flush fails the cache is restored to its state before
    /// `mutate`, so it never holds a change the store does not.
    fn locked<F, T>(&mut self, mutate: F) -> Result<T>
    where
        F: FnOnce(&mut Configuration) -> T,
    {
        let _guard = LockGuard::acquire(&self.lock)?;

        let configuration = cached(&self.persister, &mut self.configuration)?;
        let snapshot = configuration.clone();
        let output = mutate(&mut *configuration);

        if let Err(e) = self.persister.flush(configuration) {
            tracing::warn!("Failed to flush configuration, discarding change: {}", e);
            *configuration = snapshot;
            return Err(e);
        }

        Ok(output)
    }
}

/// Load into `slot` on first use and hand out the cached value.
fn cached<'a, P: Persister>(
    persister: &P,
    slot: &'a mut Option<Configuration>,
) -> Result<&'a mut Configuration> {
    let configuration = match slot.take() {
        Some(configuration) => configuration,
        None => match persister.load() {
            Ok(configuration) => {
                tracing::debug!(repositories = configuration.len(), "Loaded configuration");
                configuration
            }
            Err(Error::MissingConfig { path }) => {
                tracing::debug!(?path, "No configuration found, starting empty");
                Configuration::default()
            }
            Err(e) => return Err(e),
        },
    };

    Ok(slot.insert(configuration))
}
