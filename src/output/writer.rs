//! Multi-format artifact writer
//!
//! Renders one catalog into the playlist, plain-list and snapshot artifacts.
//! With `atomic_publish` every artifact is staged as a `.tmp` sibling and only
//! renamed into place once all three were written; otherwise artifacts are
//! written in place one after another.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::OutputConfig;
use crate::errors::{WriterError, WriterResult};
use crate::ingestor::m3u_parser::EXTM3U_HEADER;
use crate::models::{Catalog, CatalogSnapshot};

const STAGING_SUFFIX: &str = ".tmp";

/// Path and size of one written artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactInfo {
    pub path: PathBuf,
    pub bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub playlist: ArtifactInfo,
    pub plain_list: ArtifactInfo,
    pub snapshot: ArtifactInfo,
}

impl WriteReport {
    pub fn artifacts(&self) -> [&ArtifactInfo; 3] {
        [&self.playlist, &self.plain_list, &self.snapshot]
    }

    pub fn total_bytes(&self) -> u64 {
        self.artifacts().iter().map(|a| a.bytes).sum()
    }
}

pub fn render_playlist(catalog: &Catalog) -> String {
    let mut out = String::with_capacity(16 + catalog.len() * 96);
    out.push_str(EXTM3U_HEADER);
    out.push('\n');
    for entry in catalog {
        out.push_str("#EXTINF:-1,");
        out.push_str(entry.name());
        out.push('\n');
        out.push_str(entry.url());
        out.push('\n');
    }
    out
}

pub fn render_plain_list(catalog: &Catalog) -> String {
    let mut out = String::with_capacity(catalog.len() * 80);
    for entry in catalog {
        out.push_str(entry.name());
        out.push(',');
        out.push_str(entry.url());
        out.push('\n');
    }
    out
}

/// Pretty-printed JSON with two-space indentation; non-ASCII is not escaped
pub fn render_snapshot(snapshot: &CatalogSnapshot) -> WriterResult<String> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut staged = path.as_os_str().to_owned();
    staged.push(STAGING_SUFFIX);
    PathBuf::from(staged)
}

pub struct MultiFormatWriter {
    config: OutputConfig,
}

impl MultiFormatWriter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// Render and persist all three artifacts for `catalog`
    pub async fn write(
        &self,
        catalog: &Catalog,
        timestamp: DateTime<Utc>,
    ) -> WriterResult<WriteReport> {
        let snapshot = CatalogSnapshot::new(timestamp, catalog);
        let rendered = [
            (self.config.playlist_path(), render_playlist(catalog)),
            (self.config.plain_list_path(), render_plain_list(catalog)),
            (self.config.snapshot_path(), render_snapshot(&snapshot)?),
        ];

        let directory = &self.config.directory;
        fs::create_dir_all(directory)
            .await
            .map_err(|source| WriterError::CreateDir {
                path: directory.clone(),
                source,
            })?;

        let infos = if self.config.atomic_publish {
            Self::write_staged(&rendered).await?
        } else {
            Self::write_in_place(&rendered).await?
        };

        let [playlist, plain_list, snapshot] = infos;
        let report = WriteReport {
            playlist,
            plain_list,
            snapshot,
        };

        info!(
            "Wrote {} channels to {} ({} bytes across 3 artifacts)",
            catalog.len(),
            directory.display(),
            report.total_bytes()
        );
        Ok(report)
    }

    async fn write_in_place(rendered: &[(PathBuf, String); 3]) -> WriterResult<[ArtifactInfo; 3]> {
        let mut written: Vec<PathBuf> = Vec::with_capacity(3);

        for (path, content) in rendered {
            if let Err(source) = fs::write(path, content).await {
                let error = WriterError::Write {
                    path: path.clone(),
                    source,
                };
                if written.is_empty() {
                    return Err(error);
                }
                warn!(
                    "Write to {} failed after {} artifact(s) were updated",
                    path.display(),
                    written.len()
                );
                return Err(WriterError::PartialWrite {
                    written,
                    source: Box::new(error),
                });
            }
            debug!("Wrote {} ({} bytes)", path.display(), content.len());
            written.push(path.clone());
        }

        Ok(Self::infos(rendered))
    }

    async fn write_staged(rendered: &[(PathBuf, String); 3]) -> WriterResult<[ArtifactInfo; 3]> {
        let mut staged: Vec<PathBuf> = Vec::with_capacity(3);

        for (path, content) in rendered {
            let temp = staging_path(path);
            if let Err(source) = fs::write(&temp, content).await {
                Self::discard(&staged).await;
                return Err(WriterError::Write { path: temp, source });
            }
            debug!("Staged {} ({} bytes)", temp.display(), content.len());
            staged.push(temp);
        }

        for (index, (path, _)) in rendered.iter().enumerate() {
            let temp = &staged[index];
            if let Err(source) = fs::rename(temp, path).await {
                Self::discard(&staged[index..]).await;
                return Err(WriterError::Rename {
                    from: temp.clone(),
                    to: path.clone(),
                    source,
                });
            }
        }

        Ok(Self::infos(rendered))
    }

    async fn discard(paths: &[PathBuf]) {
        for path in paths {
            if let Err(e) = fs::remove_file(path).await {
                warn!("Failed to remove staged file {}: {}", path.display(), e);
            }
        }
    }

    fn infos(rendered: &[(PathBuf, String); 3]) -> [ArtifactInfo; 3] {
        rendered.each_ref().map(|(path, content)| ArtifactInfo {
            path: path.clone(),
            bytes: content.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestor::ChannelValidator;
    use tempfile::TempDir;

    fn catalog() -> Catalog {
        let validator = ChannelValidator::default();
        Catalog::from_entries(vec![
            validator.validate("CCTV-1 综合", "http://a/1.m3u8").unwrap(),
            validator.validate("News", "https://b/news").unwrap(),
        ])
    }

    fn output_config(dir: &Path, atomic_publish: bool) -> OutputConfig {
        OutputConfig {
            directory: dir.to_path_buf(),
            atomic_publish,
            ..OutputConfig::default()
        }
    }

    #[test]
    fn test_render_playlist() {
        assert_eq!(
            render_playlist(&catalog()),
            "#EXTM3U\n#EXTINF:-1,CCTV-1 综合\nhttp://a/1.m3u8\n#EXTINF:-1,News\nhttps://b/news\n"
        );
        assert_eq!(render_playlist(&Catalog::new()), "#EXTM3U\n");
    }

    #[test]
    fn test_render_plain_list() {
        assert_eq!(
            render_plain_list(&catalog()),
            "CCTV-1 综合,http://a/1.m3u8\nNews,https://b/news\n"
        );
    }

    #[test]
    fn test_render_snapshot_is_pretty_and_unescaped() {
        let snapshot = CatalogSnapshot::new(Utc::now(), &catalog());
        let json = render_snapshot(&snapshot).unwrap();
        assert!(json.contains("\n  \"version\""));
        assert!(json.contains("CCTV-1 综合"));
        assert!(!json.contains("\\u"));
    }

    #[test]
    fn test_staging_path() {
        assert_eq!(
            staging_path(Path::new("/out/result.m3u")),
            PathBuf::from("/out/result.m3u.tmp")
        );
    }

    #[tokio::test]
    async fn test_write_creates_directory_and_reports_sizes() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("data");
        let writer = MultiFormatWriter::new(output_config(&dir, true));

        let report = writer.write(&catalog(), Utc::now()).await.unwrap();

        for artifact in report.artifacts() {
            let meta = std::fs::metadata(&artifact.path).unwrap();
            assert_eq!(meta.len(), artifact.bytes);
            assert!(!staging_path(&artifact.path).exists());
        }
        assert_eq!(report.playlist.path, dir.join("result.m3u"));
    }

    #[tokio::test]
    async fn test_staged_write_failure_keeps_previous_artifacts() {
        let temp = TempDir::new().unwrap();
        let writer = MultiFormatWriter::new(output_config(temp.path(), true));
        writer.write(&catalog(), Utc::now()).await.unwrap();
        let previous = std::fs::read_to_string(temp.path().join("result.m3u")).unwrap();

        // A directory in the way of the snapshot's staging file makes that write fail
        std::fs::create_dir(temp.path().join("sources.json.tmp")).unwrap();

        let err = writer.write(&Catalog::new(), Utc::now()).await.unwrap_err();
        assert!(matches!(err, WriterError::Write { .. }));

        let current = std::fs::read_to_string(temp.path().join("result.m3u")).unwrap();
        assert_eq!(previous, current);
        assert!(!temp.path().join("result.m3u.tmp").exists());
        assert!(!temp.path().join("result.txt.tmp").exists());
    }

    #[tokio::test]
    async fn test_in_place_failure_reports_written_artifacts() {
        let temp = TempDir::new().unwrap();
        let writer = MultiFormatWriter::new(output_config(temp.path(), false));
        std::fs::create_dir(temp.path().join("sources.json")).unwrap();

        let err = writer.write(&catalog(), Utc::now()).await.unwrap_err();
        assert_eq!(
            err.written_paths(),
            &[temp.path().join("result.m3u"), temp.path().join("result.txt")]
        );
        // no rollback in this mode
        assert!(temp.path().join("result.txt").exists());
    }
}
