//! Repository entry model
//!
//! A [`RepositoryEntry`] registers one upstream source. Its `type` decides
//! which of `url` or `package` carries the location.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of upstream source.
///
/// Known kinds are matched case-insensitively and serialize to their
/// lowercase name. Anything else is kept verbatim so documents written by
/// other tools survive a round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RepositoryType {
    /// Inline package definition; located by its `package` payload.
    Package,
    /// Version-control repository with auto-detected driver
    Vcs,
    Git,
    /// Composer-style package index
    Composer,
    Path,
    Artifact,
    Other(String),
}

impl RepositoryType {
    /// Get the string representation of the type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Package => "package",
            Self::Vcs => "vcs",
            Self::Git => "git",
            Self::Composer => "composer",
            Self::Path => "path",
            Self::Artifact => "artifact",
            Self::Other(kind) => kind,
        }
    }

    /// Whether entries of this type are located by an inline package payload.
    ///
    /// Also true for an `Other` spelling of `package`, which reloads as
    /// [`RepositoryType::Package`].
    pub fn is_package(&self) -> bool {
        self.as_str().eq_ignore_ascii_case("package")
    }
}

impl FromStr for RepositoryType {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "package" => Self::Package,
            "vcs" => Self::Vcs,
            "git" => Self::Git,
            "composer" => Self::Composer,
            "path" => Self::Path,
            "artifact" => Self::Artifact,
            _ => Self::Other(s.to_string()),
        })
    }
}

impl From<&str> for RepositoryType {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

impl From<String> for RepositoryType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<RepositoryType> for String {
    fn from(kind: RepositoryType) -> Self {
        match kind {
            RepositoryType::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RepositoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One registered upstream source, keyed by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryEntry {
    /// Unique, stable identity of the entry
    pub id: String,

    #[serde(rename = "type")]
    pub kind: RepositoryType,

    /// Source location; only kept for non-`package` types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Inline package definition; only kept for the `package` type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<Value>,

    /// Keys this crate does not interpret (e.g. `options`)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RepositoryEntry {
    /// Create an entry with neither `url` nor `package` set.
    pub fn new(id: impl Into<String>, kind: impl Into<RepositoryType>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            url: None,
            package: None,
            extra: Map::new(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_package(mut self, package: Value) -> Self {
        self.package = Some(package);
        self
    }

    /// Drop the field that does not apply to this entry's type.
    ///
    /// `package` entries lose their `url`; every other type loses its
    /// `package`. Applying it more than once changes nothing.
    pub fn clean_up(&mut self) {
        if self.kind.is_package() {
            self.url = None;
        } else {
            self.package = None;
        }
    }

    /// Consuming form of [`RepositoryEntry::clean_up`].
    pub fn cleaned(mut self) -> Self {
        self.clean_up();
        self
    }
}
