use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub mod defaults;
pub mod duration_serde;

use crate::errors::{AppError, AppResult};
use defaults::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Upstream providers; list order is the deduplication tie-break order
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
}

/// HTTP settings applied to every mirror attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Timeout for a single mirror attempt
    #[serde(with = "duration_serde::duration", default = "default_fetch_timeout")]
    pub timeout: Duration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pause between providers in sequential mode, to stay under upstream rate limits
    #[serde(
        with = "duration_serde::duration",
        default = "default_inter_provider_delay"
    )]
    pub inter_provider_delay: Duration,
    /// 1 fetches providers one after another; larger values fetch through a bounded pool
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_playlist_filename")]
    pub playlist_filename: String,
    #[serde(default = "default_plain_list_filename")]
    pub plain_list_filename: String,
    #[serde(default = "default_snapshot_filename")]
    pub snapshot_filename: String,
    /// Stage all artifacts and only move them into place once every write succeeded
    #[serde(default = "default_atomic_publish")]
    pub atomic_publish: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_allowed_schemes")]
    pub allowed_schemes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Cron expression with a leading seconds field
    #[serde(default = "default_schedule_cron")]
    pub cron: String,
    #[serde(default = "default_run_on_start")]
    pub run_on_start: bool,
}

/// One upstream playlist provider and its mirrors, tried in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub mirrors: Vec<String>,
}

impl ProviderConfig {
    pub fn new<S: Into<String>>(name: S, mirrors: Vec<String>) -> Self {
        Self {
            name: name.into(),
            mirrors,
        }
    }
}

fn default_fetch_timeout() -> Duration {
    humantime::parse_duration(DEFAULT_FETCH_TIMEOUT).unwrap_or(Duration::from_secs(10))
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_inter_provider_delay() -> Duration {
    humantime::parse_duration(DEFAULT_INTER_PROVIDER_DELAY).unwrap_or(Duration::from_secs(1))
}

fn default_max_concurrent_fetches() -> usize {
    DEFAULT_MAX_CONCURRENT_FETCHES
}

fn default_output_directory() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIRECTORY)
}

fn default_playlist_filename() -> String {
    DEFAULT_PLAYLIST_FILENAME.to_string()
}

fn default_plain_list_filename() -> String {
    DEFAULT_PLAIN_LIST_FILENAME.to_string()
}

fn default_snapshot_filename() -> String {
    DEFAULT_SNAPSHOT_FILENAME.to_string()
}

fn default_atomic_publish() -> bool {
    DEFAULT_ATOMIC_PUBLISH
}

fn default_allowed_schemes() -> Vec<String> {
    DEFAULT_ALLOWED_SCHEMES.iter().map(|s| s.to_string()).collect()
}

fn default_schedule_cron() -> String {
    DEFAULT_SCHEDULE_CRON.to_string()
}

fn default_run_on_start() -> bool {
    DEFAULT_RUN_ON_START
}

fn default_providers() -> Vec<ProviderConfig> {
    DEFAULT_PROVIDERS
        .iter()
        .map(|(name, mirrors)| {
            ProviderConfig::new(*name, mirrors.iter().map(|m| m.to_string()).collect())
        })
        .collect()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: default_fetch_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            inter_provider_delay: default_inter_provider_delay(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            playlist_filename: default_playlist_filename(),
            plain_list_filename: default_plain_list_filename(),
            snapshot_filename: default_snapshot_filename(),
            atomic_publish: default_atomic_publish(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            allowed_schemes: default_allowed_schemes(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cron: default_schedule_cron(),
            run_on_start: default_run_on_start(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            pipeline: PipelineConfig::default(),
            output: OutputConfig::default(),
            validation: ValidationConfig::default(),
            scheduler: SchedulerConfig::default(),
            providers: default_providers(),
        }
    }
}

impl OutputConfig {
    pub fn playlist_path(&self) -> PathBuf {
        self.directory.join(&self.playlist_filename)
    }

    pub fn plain_list_path(&self) -> PathBuf {
        self.directory.join(&self.plain_list_filename)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.directory.join(&self.snapshot_filename)
    }
}

impl Config {
    /// Load configuration from `CONFIG_FILE` or the default file name
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from_file(&config_file)
    }

    /// Layer built-in defaults, the TOML file (if present) and `LIVE_CATALOG_*`
    /// environment variables, in that order of precedence
    pub fn load_from_file<P: AsRef<Path>>(config_file: P) -> Result<Self> {
        let config_file = config_file.as_ref();
        if config_file.exists() {
            info!("Loading configuration from: {}", config_file.display());
        } else {
            debug!(
                "Config file {} not found, using defaults and environment",
                config_file.display()
            );
        }

        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Invalid configuration in {}", config_file.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> AppResult<()> {
        if self.pipeline.max_concurrent_fetches == 0 {
            return Err(AppError::configuration(
                "pipeline.max_concurrent_fetches must be at least 1",
            ));
        }

        if self.validation.allowed_schemes.is_empty() {
            return Err(AppError::configuration(
                "validation.allowed_schemes must list at least one scheme",
            ));
        }

        for provider in &self.providers {
            if provider.name.trim().is_empty() {
                return Err(AppError::configuration("provider name must not be empty"));
            }
            if provider.mirrors.is_empty() {
                return Err(AppError::configuration(format!(
                    "provider '{}' has no mirrors",
                    provider.name
                )));
            }
        }

        let filenames = [
            &self.output.playlist_filename,
            &self.output.plain_list_filename,
            &self.output.snapshot_filename,
        ];
        if filenames.iter().any(|f| f.trim().is_empty()) {
            return Err(AppError::configuration("output filenames must not be empty"));
        }
        if filenames[0] == filenames[1] || filenames[0] == filenames[2] || filenames[1] == filenames[2]
        {
            return Err(AppError::configuration("output filenames must be distinct"));
        }

        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
