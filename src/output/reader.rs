//! Read-only access to published artifacts
//!
//! Answers the queries a serving layer makes against the output directory:
//! the snapshot itself, paged channel listings, keyword search and aggregate
//! statistics. A missing snapshot is reported as `ArtifactMissing` so callers
//! can map it to "service unavailable".

use std::io::ErrorKind;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::fs;

use crate::config::OutputConfig;
use crate::errors::{ReaderError, ReaderResult};
use crate::ingestor::ChannelValidator;
use crate::models::{CatalogSnapshot, ChannelEntry};

pub const DEFAULT_SEARCH_LIMIT: usize = 20;
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// One page of channels from the snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogPage {
    pub channels: Vec<ChannelEntry>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub pages: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub total_channels: usize,
    pub playlist_bytes: Option<u64>,
    pub plain_list_bytes: Option<u64>,
    pub snapshot_bytes: Option<u64>,
    pub last_update: Option<DateTime<Utc>>,
}

/// Case-insensitive substring match on channel names, first `limit` hits in
/// catalog order
pub fn search_entries<'a>(
    entries: &'a [ChannelEntry],
    keyword: &str,
    limit: usize,
) -> Vec<&'a ChannelEntry> {
    let needle = keyword.trim().to_lowercase();
    entries
        .iter()
        .filter(|entry| entry.name().to_lowercase().contains(&needle))
        .take(limit)
        .collect()
}

pub struct CatalogReader {
    config: OutputConfig,
    validator: ChannelValidator,
}

impl CatalogReader {
    pub fn new(config: OutputConfig) -> Self {
        Self {
            config,
            validator: ChannelValidator::default(),
        }
    }

    /// Check loaded channels against `validator` instead of the default one
    pub fn with_validator(mut self, validator: ChannelValidator) -> Self {
        self.validator = validator;
        self
    }

    pub async fn load_snapshot(&self) -> ReaderResult<CatalogSnapshot> {
        let path = self.config.snapshot_path();
        let content = read_artifact(&path).await?;
        let snapshot: CatalogSnapshot = serde_json::from_str(&content).map_err(|source| {
            ReaderError::Parse {
                path: path.clone(),
                source,
            }
        })?;

        for (index, entry) in snapshot.channels.iter().enumerate() {
            if let Err(reason) = self.validator.validate(entry.name(), entry.url()) {
                return Err(ReaderError::InvalidEntry {
                    path,
                    index,
                    reason,
                });
            }
        }

        Ok(snapshot)
    }

    /// Verbatim playlist artifact
    pub async fn read_playlist(&self) -> ReaderResult<String> {
        read_artifact(&self.config.playlist_path()).await
    }

    /// Verbatim plain-list artifact
    pub async fn read_plain_list(&self) -> ReaderResult<String> {
        read_artifact(&self.config.plain_list_path()).await
    }

    pub async fn search(&self, keyword: &str, limit: usize) -> ReaderResult<Vec<ChannelEntry>> {
        if keyword.trim().is_empty() {
            return Err(ReaderError::EmptyQuery);
        }

        let snapshot = self.load_snapshot().await?;
        Ok(search_entries(&snapshot.channels, keyword, limit)
            .into_iter()
            .cloned()
            .collect())
    }

    /// 1-based page of the snapshot's channels; page 0 is treated as page 1
    pub async fn page(&self, page: usize, per_page: usize) -> ReaderResult<CatalogPage> {
        let snapshot = self.load_snapshot().await?;
        let page = page.max(1);
        let per_page = per_page.max(1);
        let total = snapshot.channels.len();

        let channels = snapshot
            .channels
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .collect();

        Ok(CatalogPage {
            channels,
            total,
            page,
            per_page,
            pages: total.div_ceil(per_page),
        })
    }

    /// Aggregate statistics; a missing snapshot yields zero channels rather
    /// than an error
    pub async fn stats(&self) -> ReaderResult<CatalogStats> {
        let (total_channels, last_update) = match self.load_snapshot().await {
            Ok(snapshot) => (snapshot.channels.len(), Some(snapshot.timestamp)),
            Err(ReaderError::ArtifactMissing { .. }) => (0, None),
            Err(e) => return Err(e),
        };

        Ok(CatalogStats {
            total_channels,
            playlist_bytes: file_size(&self.config.playlist_path()).await?,
            plain_list_bytes: file_size(&self.config.plain_list_path()).await?,
            snapshot_bytes: file_size(&self.config.snapshot_path()).await?,
            last_update,
        })
    }
}

async fn read_artifact(path: &Path) -> ReaderResult<String> {
    fs::read_to_string(path).await.map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            ReaderError::ArtifactMissing {
                path: path.to_path_buf(),
            }
        } else {
            ReaderError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

async fn file_size(path: &Path) -> ReaderResult<Option<u64>> {
    match fs::metadata(path).await {
        Ok(meta) => Ok(Some(meta.len())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ReaderError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RejectReason;
    use tempfile::TempDir;

    fn entries(names: &[&str]) -> Vec<ChannelEntry> {
        let validator = ChannelValidator::default();
        names
            .iter()
            .enumerate()
            .map(|(i, name)| validator.validate(name, &format!("http://h/{i}")).unwrap())
            .collect()
    }

    #[test]
    fn test_search_entries_case_insensitive_and_capped() {
        let list = entries(&["CCTV-1", "cctv-2", "News", "CCTV-3"]);

        let hits = search_entries(&list, "cctv", 10);
        let names: Vec<&str> = hits.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["CCTV-1", "cctv-2", "CCTV-3"]);

        assert_eq!(search_entries(&list, "CcTv", 2).len(), 2);
        assert!(search_entries(&list, "sport", 10).is_empty());
    }

    #[tokio::test]
    async fn test_missing_snapshot() {
        let temp = TempDir::new().unwrap();
        let reader = CatalogReader::new(OutputConfig {
            directory: temp.path().to_path_buf(),
            ..OutputConfig::default()
        });

        assert!(matches!(
            reader.load_snapshot().await,
            Err(ReaderError::ArtifactMissing { .. })
        ));
        assert!(matches!(
            reader.search("cctv", 5).await,
            Err(ReaderError::ArtifactMissing { .. })
        ));

        let stats = reader.stats().await.unwrap();
        assert_eq!(stats.total_channels, 0);
        assert_eq!(stats.playlist_bytes, None);
        assert_eq!(stats.last_update, None);
    }

    #[tokio::test]
    async fn test_empty_keyword_rejected() {
        let reader = CatalogReader::new(OutputConfig::default());
        assert!(matches!(
            reader.search("   ", 5).await,
            Err(ReaderError::EmptyQuery)
        ));
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_parse_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("sources.json"), "{not json").unwrap();
        let reader = CatalogReader::new(OutputConfig {
            directory: temp.path().to_path_buf(),
            ..OutputConfig::default()
        });

        assert!(matches!(
            reader.load_snapshot().await,
            Err(ReaderError::Parse { .. })
        ));
    }

    fn snapshot_with(dir: &Path, name: &str, url: &str) -> CatalogReader {
        let json = serde_json::json!({
            "timestamp": "2026-01-02T03:04:05Z",
            "version": "0.1.0",
            "total": 1,
            "channels": [{ "name": name, "url": url }],
        });
        std::fs::write(dir.join("sources.json"), json.to_string()).unwrap();
        CatalogReader::new(OutputConfig {
            directory: dir.to_path_buf(),
            ..OutputConfig::default()
        })
    }

    #[tokio::test]
    async fn test_hand_edited_snapshot_is_validated() {
        let temp = TempDir::new().unwrap();

        let reader = snapshot_with(temp.path(), "Upload", "ftp://files/upload");
        match reader.load_snapshot().await {
            Err(ReaderError::InvalidEntry { index, reason, .. }) => {
                assert_eq!(index, 0);
                assert!(matches!(reason, RejectReason::DisallowedScheme { .. }));
            }
            other => panic!("expected InvalidEntry, got {other:?}"),
        }

        let reader = snapshot_with(temp.path(), "   ", "http://a");
        assert!(matches!(
            reader.load_snapshot().await,
            Err(ReaderError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn test_configured_schemes_apply_to_snapshot() {
        let temp = TempDir::new().unwrap();
        let reader = snapshot_with(temp.path(), "Live", "rtmp://live/stream")
            .with_validator(ChannelValidator::new(vec!["rtmp://".to_string()]));

        let snapshot = reader.load_snapshot().await.unwrap();
        assert_eq!(snapshot.channels[0].url(), "rtmp://live/stream");
    }
}
