//! The persisted registry document
//!
//! Repositories are stored as an ordered list in the document and held in
//! memory as an insertion-ordered map keyed by id. Top-level keys the
//! registry does not own (`name`, `homepage`, ...) are carried through
//! untouched, in their original order and with `repositories` kept at the
//! position it was read from, so a flush never drops or reorders them.

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::entry::RepositoryEntry;

const REPOSITORIES: &str = "repositories";

/// The full registry document.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    extra: Map<String, Value>,
    repositories: IndexMap<String, RepositoryEntry>,
    /// Index of `repositories` among the top-level keys; `None` appends it.
    position: Option<usize>,
}

impl Configuration {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// All repositories in insertion order.
    pub fn repositories(&self) -> &IndexMap<String, RepositoryEntry> {
        &self.repositories
    }

    /// Get a repository by id.
    pub fn get(&self, id: &str) -> Option<&RepositoryEntry> {
        self.repositories.get(id)
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    /// Iterate over repositories in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &RepositoryEntry> {
        self.repositories.values()
    }

    /// Top-level document keys other than `repositories`.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Set a top-level document key other than `repositories`.
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Insert or replace an entry by id.
    ///
    /// A replaced entry keeps its position.
    pub(crate) fn insert(&mut self, entry: RepositoryEntry) -> Option<RepositoryEntry> {
        self.repositories.insert(entry.id.clone(), entry)
    }

    /// Remove an entry by id, keeping the order of the others.
    pub(crate) fn remove(&mut self, id: &str) -> Option<RepositoryEntry> {
        self.repositories.shift_remove(id)
    }

    /// Replace the entry keyed by `old_id` with `entry`, which may carry a
    /// different id.
    ///
    /// The new entry takes the slot of the old one. Any other entry already
    /// holding the new id is dropped. Returns `false` when `old_id` is absent.
    pub(crate) fn replace(&mut self, old_id: &str, entry: RepositoryEntry) -> bool {
        let Some((mut index, _, _)) = self.repositories.shift_remove_full(old_id) else {
            return false;
        };

        if let Some((other, _, _)) = self.repositories.shift_remove_full(entry.id.as_str()) {
            if other < index {
                index -= 1;
            }
        }

        self.repositories.shift_insert(index, entry.id.clone(), entry);
        true
    }
}

impl FromIterator<RepositoryEntry> for Configuration {
    fn from_iter<I: IntoIterator<Item = RepositoryEntry>>(iter: I) -> Self {
        let mut configuration = Self::default();
        for entry in iter {
            configuration.insert(entry);
        }
        configuration
    }
}

impl PartialEq for Configuration {
    fn eq(&self, other: &Self) -> bool {
        self.extra == other.extra && self.repositories == other.repositories
    }
}

impl Serialize for Configuration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let position = self.position.unwrap_or(self.extra.len());
        let mut map = serializer.serialize_map(Some(self.extra.len() + 1))?;
        for (index, (key, value)) in self.extra.iter().enumerate() {
            if index == position {
                map.serialize_entry(REPOSITORIES, &EntryList(&self.repositories))?;
            }
            map.serialize_entry(key, value)?;
        }
        if position >= self.extra.len() {
            map.serialize_entry(REPOSITORIES, &EntryList(&self.repositories))?;
        }
        map.end()
    }
}

/// The document stores repositories as a list of entries.
struct EntryList<'a>(&'a IndexMap<String, RepositoryEntry>);

impl Serialize for EntryList<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.0.values())
    }
}

/// On load, a later entry with a duplicate id replaces the earlier one.
impl<'de> Deserialize<'de> for Configuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let document = Map::<String, Value>::deserialize(deserializer)?;

        let mut configuration = Self::default();
        for (index, (key, value)) in document.into_iter().enumerate() {
            if key != REPOSITORIES {
                configuration.extra.insert(key, value);
                continue;
            }

            configuration.position = Some(index);
            if value.is_null() {
                continue;
            }
            let entries =
                Vec::<RepositoryEntry>::deserialize(value).map_err(serde::de::Error::custom)?;
            for entry in entries {
                configuration.insert(entry);
            }
        }

        Ok(configuration)
    }
}
