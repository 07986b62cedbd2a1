//! M3U provider adapter
//!
//! Fetches one provider's playlist, trying its mirrors in order. A mirror only
//! counts as successful when its body yields at least one valid entry; an
//! unreachable mirror and a mirror serving an error page both fall through to
//! the next one.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::ProviderConfig;
use crate::errors::{SourceError, SourceResult};
use crate::ingestor::{ChannelValidator, M3uParser, ValidatedBatch};
use crate::sources::traits::{ChannelSource, ProviderFetch};
use crate::utils::http_client::HttpFetcher;
use crate::utils::url::UrlUtils;

pub struct M3uSourceAdapter {
    provider: ProviderConfig,
    fetcher: Arc<dyn HttpFetcher>,
    validator: ChannelValidator,
}

impl M3uSourceAdapter {
    pub fn new(
        provider: ProviderConfig,
        fetcher: Arc<dyn HttpFetcher>,
        validator: ChannelValidator,
    ) -> Self {
        Self {
            provider,
            fetcher,
            validator,
        }
    }

    pub fn provider(&self) -> &ProviderConfig {
        &self.provider
    }

    async fn try_mirror(&self, url: &str) -> SourceResult<ValidatedBatch> {
        let content = self.fetcher.fetch_text(url).await?;

        let parser = M3uParser::new(&content);
        if !parser.has_header() {
            debug!(
                "Playlist from {} has no #EXTM3U header, parsing anyway",
                UrlUtils::obfuscate_credentials(url)
            );
        }

        let batch = self
            .validator
            .validate_all(parser.candidates(), &self.provider.name);

        if batch.entries.is_empty() {
            return Err(SourceError::NoValidEntries {
                url: UrlUtils::obfuscate_credentials(url),
                rejected: batch.rejected,
            });
        }

        Ok(batch)
    }
}

#[async_trait]
impl ChannelSource for M3uSourceAdapter {
    fn name(&self) -> &str {
        &self.provider.name
    }

    async fn fetch_entries(&self) -> SourceResult<ProviderFetch> {
        let mirrors = &self.provider.mirrors;
        let mut last_error: Option<SourceError> = None;

        for (index, mirror) in mirrors.iter().enumerate() {
            let masked = UrlUtils::obfuscate_credentials(mirror);

            match self.try_mirror(mirror).await {
                Ok(batch) => {
                    info!(
                        provider = %self.provider.name,
                        attempt = index + 1,
                        "Fetched {} entries from {} ({} rejected)",
                        batch.entries.len(),
                        masked,
                        batch.rejected
                    );
                    return Ok(ProviderFetch {
                        mirror: masked,
                        entries: batch.entries,
                        rejected: batch.rejected,
                        attempts: index + 1,
                    });
                }
                Err(e) => {
                    warn!(
                        provider = %self.provider.name,
                        attempt = index + 1,
                        "Mirror {} failed: {}",
                        masked,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(SourceError::AllMirrorsFailed {
            provider: self.provider.name.clone(),
            attempts: mirrors.len(),
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no mirrors configured".to_string()),
        })
    }
}
