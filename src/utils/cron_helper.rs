//! Cron helpers for the scheduled run loop

use chrono::{DateTime, Utc};
use cron::Schedule;
use std::str::FromStr;

use crate::errors::{AppError, AppResult};

/// Parse a cron expression (with a leading seconds field)
pub fn parse_schedule(cron_expression: &str) -> AppResult<Schedule> {
    Schedule::from_str(cron_expression).map_err(|e| {
        AppError::configuration(format!("Invalid cron expression '{cron_expression}': {e}"))
    })
}

/// Next fire time strictly after `after`
pub fn next_after(schedule: &Schedule, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    schedule.after(&after).next()
}
