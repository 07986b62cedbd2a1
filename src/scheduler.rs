//! Cron-driven repeated runs
//!
//! Runs execute one at a time: the next fire time is computed only after the
//! previous run returned, so a slow run delays the schedule instead of
//! overlapping with the next one. A shutdown request never cancels a run in
//! progress; the scheduler lets it publish and stops afterwards.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use chrono::Utc;
use cron::Schedule;
use tracing::{error, info, warn};

use crate::errors::AppResult;
use crate::pipeline::{CatalogPipeline, RunSummary};
use crate::utils::cron_helper::{next_after, parse_schedule};

pub struct CatalogScheduler {
    pipeline: CatalogPipeline,
    schedule: Schedule,
    run_on_start: bool,
}

impl CatalogScheduler {
    pub fn new(pipeline: CatalogPipeline) -> AppResult<Self> {
        let scheduler = &pipeline.config().scheduler;
        let schedule = parse_schedule(&scheduler.cron)?;
        let run_on_start = scheduler.run_on_start;

        Ok(Self {
            pipeline,
            schedule,
            run_on_start,
        })
    }

    /// Execute one run, logging instead of returning its failure
    pub async fn run_once(&self) -> Option<RunSummary> {
        match self.pipeline.run().await {
            Ok(summary) => Some(summary),
            Err(e) => {
                error!("Scheduled catalog run failed: {}", e);
                None
            }
        }
    }

    /// Run on schedule until `shutdown` resolves
    pub async fn run_until<F>(&self, shutdown: F) -> AppResult<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        if self.run_on_start && self.run_to_completion(shutdown.as_mut()).await {
            info!("Scheduler stopped after initial run");
            return Ok(());
        }

        loop {
            let now = Utc::now();
            let Some(next) = next_after(&self.schedule, now) else {
                warn!("Cron schedule has no further fire times, stopping");
                return Ok(());
            };
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            info!("Next catalog run at {}", next.to_rfc3339());

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = &mut shutdown => {
                    info!("Scheduler stopped");
                    return Ok(());
                }
            }

            if self.run_to_completion(shutdown.as_mut()).await {
                info!("Scheduler stopped");
                return Ok(());
            }
        }
    }

    /// Run once, letting the run finish even if `shutdown` fires meanwhile
    ///
    /// Returns whether shutdown was requested during the run.
    async fn run_to_completion<F>(&self, shutdown: Pin<&mut F>) -> bool
    where
        F: Future<Output = ()>,
    {
        let run = self.run_once();
        tokio::pin!(run);

        tokio::select! {
            _ = &mut run => false,
            _ = shutdown => {
                info!("Shutdown requested, waiting for the current run to finish");
                run.await;
                true
            }
        }
    }
}
