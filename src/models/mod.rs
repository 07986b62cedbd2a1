//! Catalog data model
//!
//! `ChannelEntry` values are only created by the channel validator (and the
//! built-in fallback list), so any entry held by a `Catalog` already satisfies
//! the name and URL invariants. Deserialized entries are checked for blank
//! fields on the way in; scheme checks need the configured validator and are
//! done by the reader.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::RejectReason;

/// A validated live channel
///
/// Invariants: `name` is non-empty and trimmed, `url` is non-empty, trimmed
/// and starts with an allowed scheme. Fields are private so an entry cannot
/// change after validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawChannelEntry")]
pub struct ChannelEntry {
    name: String,
    url: String,
}

#[derive(Deserialize)]
struct RawChannelEntry {
    name: String,
    url: String,
}

impl TryFrom<RawChannelEntry> for ChannelEntry {
    type Error = RejectReason;

    fn try_from(raw: RawChannelEntry) -> Result<Self, Self::Error> {
        let name = raw.name.trim();
        let url = raw.url.trim();
        if name.is_empty() {
            return Err(RejectReason::EmptyName);
        }
        if url.is_empty() {
            return Err(RejectReason::EmptyUrl);
        }
        Ok(Self::new_unchecked(name.to_string(), url.to_string()))
    }
}

impl ChannelEntry {
    /// Callers must have validated both fields
    pub(crate) fn new_unchecked(name: String, url: String) -> Self {
        Self { name, url }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Composite key used for deduplication: exact, case-sensitive `(name, url)`
    pub fn dedup_key(&self) -> (&str, &str) {
        (&self.name, &self.url)
    }
}

/// Ordered collection of channel entries for one pipeline run
///
/// Each stage takes the catalog by value and hands back a new one, so there is
/// no shared accumulation state between stages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<ChannelEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<ChannelEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ChannelEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChannelEntry> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> Vec<ChannelEntry> {
        self.entries
    }

    /// Return this catalog with `entries` appended after the existing ones
    pub fn appended<I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = ChannelEntry>,
    {
        self.entries.extend(entries);
        self
    }
}

impl FromIterator<ChannelEntry> for Catalog {
    fn from_iter<I: IntoIterator<Item = ChannelEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Catalog {
    type Item = ChannelEntry;
    type IntoIter = std::vec::IntoIter<ChannelEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a ChannelEntry;
    type IntoIter = std::slice::Iter<'a, ChannelEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Persisted structured record of one run's catalog
///
/// Serialized field order is `timestamp`, `version`, `total`, `channels`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub total: usize,
    pub channels: Vec<ChannelEntry>,
}

impl CatalogSnapshot {
    /// Snapshot version string written by this build
    pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    pub fn new(timestamp: DateTime<Utc>, catalog: &Catalog) -> Self {
        Self {
            timestamp,
            version: Self::VERSION.to_string(),
            total: catalog.len(),
            channels: catalog.entries().to_vec(),
        }
    }

    /// `total` must match the number of channels
    pub fn is_consistent(&self) -> bool {
        self.total == self.channels.len()
    }

    pub fn into_catalog(self) -> Catalog {
        Catalog::from_entries(self.channels)
    }
}
