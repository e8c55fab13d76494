//! Error types for repo-registry

use std::path::PathBuf;

/// Result type for repo-registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while managing the registry configuration
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No configuration document exists yet.
    ///
    /// Raised by persisters. The manager recovers from it by starting
    /// with an empty configuration.
    #[error("Configuration not found at {path}")]
    MissingConfig { path: PathBuf },

    /// An update targeted an id that is not in the configuration
    #[error("Unknown repository: {id}")]
    UnknownRepository { id: String },

    /// The lock collaborator refused the lock
    #[error("Could not acquire the configuration lock")]
    LockAcquisition,

    /// A URL search pattern is not a valid regular expression
    #[error("Invalid URL pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Filesystem error from repo-fs
    #[error(transparent)]
    Fs(#[from] repo_fs::Error),
}
