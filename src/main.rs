use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use live_catalog::{
    config::Config,
    errors::AppResult,
    ingestor::ChannelValidator,
    output::{CatalogReader, reader::DEFAULT_SEARCH_LIMIT},
    pipeline::{CatalogPipeline, RunLock, RunSummary},
    scheduler::CatalogScheduler,
    utils::human_format::{format_bytes, format_duration},
};

#[derive(Parser)]
#[command(name = "live-catalog")]
#[command(version)]
#[command(about = "Aggregates live-channel M3U playlists into one deduplicated catalog")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path (defaults to $CONFIG_FILE or live-catalog.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pipeline once and publish the artifacts
    Run {
        /// Output directory (overrides config)
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Remove a lock left behind by an interrupted run first
        #[arg(long)]
        force_unlock: bool,
    },
    /// Run the pipeline repeatedly on a cron schedule until interrupted
    Schedule {
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Cron expression with seconds field (overrides config)
        #[arg(long, value_name = "EXPR")]
        cron: Option<String>,
    },
    /// Show statistics about the published catalog
    Stats {
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },
    /// Search published channel names (case-insensitive)
    Search {
        keyword: String,

        #[arg(short, long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,

        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },
    /// Print the effective configuration as TOML
    Config,
}

fn init_tracing(log_level: &str, format: LogFormat) {
    let log_filter = format!("live_catalog={log_level}");
    let (text, json) = match format {
        LogFormat::Text => (
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(text)
        .with(json)
        .init();
}

fn load_config(path: Option<&str>, output_dir: Option<PathBuf>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load()?,
    };
    if let Some(dir) = output_dir {
        config.output.directory = dir;
    }
    Ok(config)
}

fn print_summary(summary: &RunSummary) {
    println!(
        "Catalog updated: {} channels ({} before dedup, {} duplicates removed) in {}",
        summary.total,
        summary.total_before_dedup,
        summary.duplicates_removed(),
        format_duration(summary.elapsed_ms)
    );
    for provider in &summary.providers {
        match (&provider.mirror, &provider.error) {
            (Some(mirror), _) => println!(
                "  provider {}: {} entries from {} ({} rejected)",
                provider.name, provider.accepted, mirror, provider.rejected
            ),
            (None, Some(error)) => println!("  provider {}: failed ({})", provider.name, error),
            (None, None) => println!("  provider {}: no result", provider.name),
        }
    }
    println!("  fallback: {} entries", summary.fallback_entries);
    for artifact in summary.artifacts.artifacts() {
        println!(
            "  wrote {} ({})",
            artifact.path.display(),
            format_bytes(artifact.bytes)
        );
    }
}

fn reader(config: &Config) -> CatalogReader {
    CatalogReader::new(config.output.clone())
        .with_validator(ChannelValidator::from_config(&config.validation))
}

async fn show_stats(config: &Config) -> AppResult<()> {
    let stats = reader(config).stats().await?;
    let size = |bytes: Option<u64>| bytes.map(format_bytes).unwrap_or_else(|| "missing".to_string());

    println!("Channels:     {}", stats.total_channels);
    println!(
        "Last update:  {}",
        stats
            .last_update
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".to_string())
    );
    println!("{:<13} {}", format!("{}:", config.output.playlist_filename), size(stats.playlist_bytes));
    println!("{:<13} {}", format!("{}:", config.output.plain_list_filename), size(stats.plain_list_bytes));
    println!("{:<13} {}", format!("{}:", config.output.snapshot_filename), size(stats.snapshot_bytes));
    Ok(())
}

async fn show_search(config: &Config, keyword: &str, limit: usize) -> AppResult<()> {
    let results = reader(config).search(keyword, limit).await?;
    for entry in &results {
        println!("{},{}", entry.name(), entry.url());
    }
    info!("{} result(s) for '{}'", results.len(), keyword);
    Ok(())
}

async fn execute(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Command::Run {
            output_dir,
            force_unlock,
        } => {
            let config = load_config(config_path, output_dir)?;
            if force_unlock {
                RunLock::force_release(&config.output.directory)?;
            }
            let pipeline = CatalogPipeline::from_config(config)?;
            let summary = pipeline.run().await.context("Catalog run failed")?;
            print_summary(&summary);
        }
        Command::Schedule { output_dir, cron } => {
            let mut config = load_config(config_path, output_dir)?;
            if let Some(cron) = cron {
                config.scheduler.cron = cron;
            }
            info!(
                "Scheduling catalog runs with '{}' (run on start: {})",
                config.scheduler.cron, config.scheduler.run_on_start
            );
            let scheduler = CatalogScheduler::new(CatalogPipeline::from_config(config)?)?;
            scheduler
                .run_until(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for shutdown signal: {}", e);
                    }
                })
                .await?;
        }
        Command::Stats { output_dir } => {
            let config = load_config(config_path, output_dir)?;
            show_stats(&config).await?;
        }
        Command::Search {
            keyword,
            limit,
            output_dir,
        } => {
            let config = load_config(config_path, output_dir)?;
            show_search(&config, &keyword, limit).await?;
        }
        Command::Config => {
            let config = load_config(config_path, None)?;
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format);

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("live-catalog: {e:#}");
            ExitCode::FAILURE
        }
    }
}
