//! Source handler trait definitions

use async_trait::async_trait;

use crate::errors::SourceResult;
use crate::models::ChannelEntry;

/// Successful fetch of one provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFetch {
    /// Mirror that produced the entries, credentials masked
    pub mirror: String,
    /// Validated entries in playlist order
    pub entries: Vec<ChannelEntry>,
    /// Candidates dropped during validation
    pub rejected: usize,
    /// Mirrors tried, including the successful one
    pub attempts: usize,
}

/// A named producer of validated channel entries
#[async_trait]
pub trait ChannelSource: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch, parse and validate this source's entries
    ///
    /// An error means the source contributed nothing to this run. It never
    /// aborts the pipeline.
    async fn fetch_entries(&self) -> SourceResult<ProviderFetch>;
}
