use std::collections::BTreeMap;

use crate::models::{Catalog, ChannelEntry};

/// Collects per-provider entries as they arrive and concatenates them in
/// configured provider order
///
/// Results are keyed by provider index, so the catalog does not depend on the
/// order in which fetches completed.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    results: BTreeMap<usize, Vec<ChannelEntry>>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the entries of the provider at `index`; a later call for the
    /// same index replaces the earlier one
    pub fn insert(&mut self, index: usize, entries: Vec<ChannelEntry>) {
        self.results.insert(index, entries);
    }

    /// Concatenate provider entries by index, then append `fallback`
    pub fn build(self, fallback: Vec<ChannelEntry>) -> Catalog {
        self.results
            .into_values()
            .fold(Catalog::new(), Catalog::appended)
            .appended(fallback)
    }
}

/// Build a catalog from `(provider index, entries)` results in any order
pub fn append_all<I>(results: I, fallback: Vec<ChannelEntry>) -> Catalog
where
    I: IntoIterator<Item = (usize, Vec<ChannelEntry>)>,
{
    let mut builder = CatalogBuilder::new();
    for (index, entries) in results {
        builder.insert(index, entries);
    }
    builder.build(fallback)
}
