use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::debug;

use crate::config::FetchConfig;
use crate::errors::{AppError, AppResult, SourceError, SourceResult};
use crate::utils::url::UrlUtils;
use crate::utils::{CompressionFormat, DecompressionService};

/// Fetches playlist text from a single URL
///
/// Implementations must apply a per-call timeout, treat non-success statuses
/// and empty bodies as failures, and hand back decompressed UTF-8 text.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> SourceResult<String>;
}

/// reqwest-backed fetcher with magic-byte decompression
#[derive(Debug, Clone)]
pub struct StandardHttpClient {
    client: Client,
}

impl StandardHttpClient {
    /// Create a client with a total request timeout and a fixed User-Agent
    pub fn new(timeout: Duration, user_agent: &str) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    pub fn from_config(config: &FetchConfig) -> AppResult<Self> {
        Self::new(config.timeout, &config.user_agent)
    }

    fn map_transport_error(error: reqwest::Error, url: &str) -> SourceError {
        let url = UrlUtils::obfuscate_credentials(url);
        if error.is_timeout() {
            SourceError::Timeout { url }
        } else {
            SourceError::Transport {
                url,
                message: error.without_url().to_string(),
            }
        }
    }

    /// Check the status, then read and decompress the body
    async fn process_response_to_bytes(response: Response, url: &str) -> SourceResult<Vec<u8>> {
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
                url: UrlUtils::obfuscate_credentials(url),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Self::map_transport_error(e, url))?;

        debug!("Fetched {} bytes of raw content", bytes.len());

        let compression_format = DecompressionService::detect_compression_format(&bytes);
        match compression_format {
            CompressionFormat::Uncompressed => Ok(bytes.to_vec()),
            _ => {
                debug!("Content is compressed ({:?}), decompressing", compression_format);
                DecompressionService::decompress(bytes).map_err(|e| SourceError::Decode {
                    url: UrlUtils::obfuscate_credentials(url),
                    message: e.to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl HttpFetcher for StandardHttpClient {
    async fn fetch_text(&self, url: &str) -> SourceResult<String> {
        debug!("Fetching text content from: {}", UrlUtils::obfuscate_credentials(url));

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::map_transport_error(e, url))?;

        let bytes = Self::process_response_to_bytes(response, url).await?;
        let text = String::from_utf8_lossy(&bytes).into_owned();

        if text.trim().is_empty() {
            return Err(SourceError::EmptyBody {
                url: UrlUtils::obfuscate_credentials(url),
            });
        }

        Ok(text)
    }
}
