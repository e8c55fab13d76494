//! Filesystem layer for the repository registry
//!
//! Provides atomic writes, advisory lock files, and format-agnostic
//! document loading and saving.

pub mod config;
pub mod error;
pub mod io;
pub mod lock;

pub use config::{ConfigFormat, ConfigStore};
pub use error::{Error, Result};
pub use io::RobustnessConfig;
pub use lock::LockFile;
