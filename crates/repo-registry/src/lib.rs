//! Repository registry configuration manager
//!
//! Mediates every read and write of a single configuration document
//! holding an ordered collection of repository entries. Reads are served
//! from a lazily loaded cache; every mutation runs under an exclusive
//! [`Lock`] and ends with a flush through a [`Persister`].
//!
//! ```no_run
//! use std::path::Path;
//! use repo_registry::{
//!     ConfigurationManager, FileLock, FilePersister, RepositoryEntry, RepositoryType,
//! };
//!
//! # fn main() -> repo_registry::Result<()> {
//! let path = Path::new("satis.json");
//! let mut manager =
//!     ConfigurationManager::new(FilePersister::new(path), FileLock::for_document(path));
//!
//! manager.add(
//!     RepositoryEntry::new("monolog", RepositoryType::Vcs)
//!         .with_url("https://github.com/Seldaek/monolog"),
//! )?;
//! assert!(manager.find_by_url("github\\.com/Seldaek")?.is_some());
//! # Ok(())
//! # }
//! ```

pub mod configuration;
pub mod entry;
pub mod error;
pub mod lock;
pub mod manager;
pub mod persister;

pub use configuration::Configuration;
pub use entry::{RepositoryEntry, RepositoryType};
pub use error::{Error, Result};
pub use lock::{FileLock, Lock, LockGuard, MemoryLock};
pub use manager::ConfigurationManager;
pub use persister::{FilePersister, Persister};
