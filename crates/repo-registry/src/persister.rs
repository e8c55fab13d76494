//! Persistence collaborator
//!
//! The manager loads the document once through [`Persister::load`] and
//! writes the whole document back through [`Persister::flush`] after every
//! mutation.

use std::path::{Path, PathBuf};

use repo_fs::{ConfigStore, RobustnessConfig};

use crate::{Configuration, Error, Result};

/// Loads and saves the registry document.
pub trait Persister {
    /// Load the stored document.
    ///
    /// Fails with [`Error::MissingConfig`] when no document exists yet.
    fn load(&self) -> Result<Configuration>;

    /// Replace the stored document with `configuration`.
    fn flush(&self, configuration: &Configuration) -> Result<()>;
}

impl<T: Persister + ?Sized> Persister for &T {
    fn load(&self) -> Result<Configuration> {
        (**self).load()
    }

    fn flush(&self, configuration: &Configuration) -> Result<()> {
        (**self).flush(configuration)
    }
}

impl<T: Persister + ?Sized> Persister for Box<T> {
    fn load(&self) -> Result<Configuration> {
        (**self).load()
    }

    fn flush(&self, configuration: &Configuration) -> Result<()> {
        (**self).flush(configuration)
    }
}

/// Persists the document as a file whose extension picks the format
/// (`.json`, `.toml`, `.yaml`/`.yml`).
///
/// A missing or blank file counts as "no document". Writes are atomic.
/// TOML has no null, so null values inside `package` payloads or foreign
/// keys are dropped when writing a `.toml` document.
#[derive(Debug, Clone)]
pub struct FilePersister {
    path: PathBuf,
    store: ConfigStore,
}

impl FilePersister {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            store: ConfigStore::new(),
        }
    }

    pub fn with_robustness(mut self, robustness: RobustnessConfig) -> Self {
        self.store = ConfigStore::with_robustness(robustness);
        self
    }

    /// Path of the document.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Persister for FilePersister {
    fn load(&self) -> Result<Configuration> {
        self.store
            .load(&self.path)?
            .ok_or_else(|| Error::MissingConfig {
                path: self.path.clone(),
            })
    }

    fn flush(&self, configuration: &Configuration) -> Result<()> {
        tracing::debug!(
            path = ?self.path,
            repositories = configuration.len(),
            "Writing configuration"
        );
        Ok(self.store.save(&self.path, configuration)?)
    }
}
