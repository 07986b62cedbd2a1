//! Catalog pipeline orchestrator
//!
//! One run: take the output-directory lock, fetch every provider, build the
//! catalog in provider order with the fallback list last, deduplicate, and
//! publish the artifacts. Provider failures are recorded in the summary and
//! never fail the run; writer failures do.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::errors::{AppResult, SourceError, SourceResult};
use crate::ingestor::ChannelValidator;
use crate::output::{MultiFormatWriter, WriteReport};
use crate::pipeline::builder::CatalogBuilder;
use crate::pipeline::dedup::dedupe;
use crate::pipeline::lock::RunLock;
use crate::sources::{ChannelSource, M3uSourceAdapter, ProviderFetch, StaticFallbackSource};
use crate::utils::http_client::{HttpFetcher, StandardHttpClient};
use crate::utils::human_format::format_duration;

/// Outcome of one provider within a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderReport {
    pub index: usize,
    pub name: String,
    /// Mirror that supplied the entries, `None` when the provider failed
    pub mirror: Option<String>,
    pub accepted: usize,
    pub rejected: usize,
    pub attempts: usize,
    pub error: Option<String>,
}

impl ProviderReport {
    fn from_outcome(index: usize, name: &str, outcome: &SourceResult<ProviderFetch>) -> Self {
        match outcome {
            Ok(fetch) => Self {
                index,
                name: name.to_string(),
                mirror: Some(fetch.mirror.clone()),
                accepted: fetch.entries.len(),
                rejected: fetch.rejected,
                attempts: fetch.attempts,
                error: None,
            },
            Err(e) => Self {
                index,
                name: name.to_string(),
                mirror: None,
                accepted: 0,
                rejected: 0,
                attempts: match e {
                    SourceError::AllMirrorsFailed { attempts, .. } => *attempts,
                    _ => 1,
                },
                error: Some(e.to_string()),
            },
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub timestamp: DateTime<Utc>,
    pub total_before_dedup: usize,
    pub total: usize,
    pub fallback_entries: usize,
    pub providers: Vec<ProviderReport>,
    pub artifacts: WriteReport,
    pub elapsed_ms: u64,
}

impl RunSummary {
    pub fn duplicates_removed(&self) -> usize {
        self.total_before_dedup - self.total
    }

    pub fn failed_providers(&self) -> usize {
        self.providers.iter().filter(|p| !p.succeeded()).count()
    }
}

pub struct CatalogPipeline {
    config: Config,
    sources: Vec<Box<dyn ChannelSource>>,
    writer: MultiFormatWriter,
}

impl CatalogPipeline {
    /// Build the pipeline with the production HTTP client
    pub fn from_config(config: Config) -> AppResult<Self> {
        let fetcher = Arc::new(StandardHttpClient::from_config(&config.fetch)?);
        Ok(Self::new(config, fetcher))
    }

    /// Build one M3U adapter per configured provider, sharing `fetcher`
    pub fn new(config: Config, fetcher: Arc<dyn HttpFetcher>) -> Self {
        let validator = ChannelValidator::from_config(&config.validation);
        let sources = config
            .providers
            .iter()
            .cloned()
            .map(|provider| {
                Box::new(M3uSourceAdapter::new(
                    provider,
                    fetcher.clone(),
                    validator.clone(),
                )) as Box<dyn ChannelSource>
            })
            .collect();

        Self::with_sources(config, sources)
    }

    /// Use arbitrary sources; their order is the tie-break order
    pub fn with_sources(config: Config, sources: Vec<Box<dyn ChannelSource>>) -> Self {
        let writer = MultiFormatWriter::new(config.output.clone());
        Self {
            config,
            sources,
            writer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn run(&self) -> AppResult<RunSummary> {
        let started = Instant::now();
        let _lock = RunLock::acquire_async(self.config.output.directory.clone()).await?;

        info!(
            "Starting catalog run: {} providers, concurrency {}",
            self.sources.len(),
            self.config.pipeline.max_concurrent_fetches
        );

        let outcomes = self.fetch_all().await;

        let mut builder = CatalogBuilder::new();
        let mut providers = Vec::with_capacity(outcomes.len());
        for (index, outcome) in outcomes {
            let name = self.sources[index].name();
            let report = ProviderReport::from_outcome(index, name, &outcome);
            match outcome {
                Ok(fetch) => builder.insert(index, fetch.entries),
                Err(e) => warn!("Skipping provider '{}': {}", name, e),
            }
            providers.push(report);
        }

        let fallback = StaticFallbackSource::entries();
        let fallback_entries = fallback.len();
        let catalog = builder.build(fallback);
        let total_before_dedup = catalog.len();
        let catalog = dedupe(catalog);

        let timestamp = Utc::now();
        let artifacts = match self.writer.write(&catalog, timestamp).await {
            Ok(artifacts) => artifacts,
            Err(e) => {
                for path in e.written_paths() {
                    warn!("Artifact already replaced before the failure: {}", path.display());
                }
                return Err(e.into());
            }
        };

        let summary = RunSummary {
            timestamp,
            total_before_dedup,
            total: catalog.len(),
            fallback_entries,
            providers,
            artifacts,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            "Catalog run finished in {}: {} channels ({} duplicates removed, {}/{} providers failed)",
            format_duration(summary.elapsed_ms),
            summary.total,
            summary.duplicates_removed(),
            summary.failed_providers(),
            summary.providers.len()
        );

        Ok(summary)
    }

    /// Fetch every source and return the outcomes in provider order
    async fn fetch_all(&self) -> Vec<(usize, SourceResult<ProviderFetch>)> {
        let concurrency = self.config.pipeline.max_concurrent_fetches;

        if concurrency <= 1 {
            let delay = self.config.pipeline.inter_provider_delay;
            let mut outcomes = Vec::with_capacity(self.sources.len());
            for (index, source) in self.sources.iter().enumerate() {
                if index > 0 && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                outcomes.push((index, source.fetch_entries().await));
            }
            return outcomes;
        }

        let mut outcomes: Vec<(usize, SourceResult<ProviderFetch>)> =
            stream::iter(self.sources.iter().enumerate())
                .map(|(index, source)| async move { (index, source.fetch_entries().await) })
                .buffer_unordered(concurrency)
                .collect()
                .await;
        outcomes.sort_by_key(|(index, _)| *index);
        outcomes
    }
}
