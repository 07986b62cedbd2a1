use std::collections::HashSet;

use tracing::debug;

use crate::models::Catalog;

/// Drop entries whose `(name, url)` pair was already seen
///
/// The first occurrence wins and keeps its position; relative order of the
/// survivors is unchanged.
pub fn dedupe(catalog: Catalog) -> Catalog {
    let before = catalog.len();
    let mut seen = HashSet::with_capacity(before);

    let deduped: Catalog = catalog
        .into_iter()
        .filter(|entry| seen.insert(entry.clone()))
        .collect();

    if deduped.len() < before {
        debug!("Removed {} duplicate entries", before - deduped.len());
    }
    deduped
}
