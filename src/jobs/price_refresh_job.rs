//! Price Refresh Background Job
//!
//! Runs on the configured cron schedule (every 15 minutes by default, every
//! minute in test mode) and can also be triggered from the admin API.
//!
//! # Processing Strategy
//!
//! 1. Collect every distinct (symbol, asset type) pair held by any asset
//! 2. Ask the configured [`PriceSource`](crate::external::price_provider::PriceSource)
//!    for a quote for each pair
//! 3. For each positive quote, append an `Auto-Update` price record and move
//!    every matching asset to the new price in one transaction
//! 4. Pairs without a quote (types with no feed) are skipped
//!
//! # Error Handling
//!
//! A failing pair is logged and counted in `items_failed`; the remaining
//! pairs are still processed. Only a failure to list the held pairs fails
//! the whole run.

use crate::errors::AppError;
use crate::services::job_scheduler_service::{JobContext, JobResult};
use crate::services::price_service;
use tracing::info;

pub const JOB_NAME: &str = "refresh_prices";

pub async fn refresh_prices(ctx: JobContext) -> Result<JobResult, AppError> {
    info!("💰 Refreshing all prices...");
    let report = price_service::refresh_all_prices(ctx.pool.as_ref(), ctx.price_source.as_ref()).await?;
    Ok(job_result(&report))
}

fn job_result(report: &price_service::PriceRefreshReport) -> JobResult {
    JobResult {
        items_processed: i32::try_from(report.pairs_updated).unwrap_or(i32::MAX),
        items_failed: i32::try_from(report.pairs_failed).unwrap_or(i32::MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::price_service::PriceRefreshReport;

    #[test]
    fn test_skipped_pairs_are_not_counted() {
        let report = PriceRefreshReport {
            pairs_total: 6,
            pairs_updated: 3,
            pairs_skipped: 2,
            pairs_failed: 1,
            assets_updated: 7,
        };
        let result = job_result(&report);
        assert_eq!(result.items_processed, 3);
        assert_eq!(result.items_failed, 1);
    }
}
