use crate::db::job_run_queries;
use crate::errors::AppError;
use crate::external::price_provider::PriceSource;
use crate::jobs::price_refresh_job;
use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

// Context passed to job functions
#[derive(Clone)]
pub struct JobContext {
    pub pool: Arc<PgPool>,
    pub price_source: Arc<dyn PriceSource>,
}

impl JobContext {
    pub fn new(pool: PgPool, price_source: Arc<dyn PriceSource>) -> Self {
        Self {
            pool: Arc::new(pool),
            price_source,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobResult {
    pub items_processed: i32,
    pub items_failed: i32,
}

pub struct JobSchedulerService {
    scheduler: JobScheduler,
    context: JobContext,
}

impl JobSchedulerService {
    pub async fn new(context: JobContext) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::External(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self { scheduler, context })
    }

    /// Schedules the price refresh and starts the scheduler.
    pub async fn start(&mut self, price_refresh_schedule: &str, test_mode: bool) -> Result<(), AppError> {
        info!("🚀 Starting job scheduler...");

        if test_mode {
            info!("⚠️  JOB SCHEDULER IN TEST MODE - Jobs will run every minute!");
        }

        let description = if test_mode { "Every minute (TEST MODE)" } else { "Periodic price refresh" };
        self.schedule_job(
            price_refresh_schedule,
            price_refresh_job::JOB_NAME,
            description,
            price_refresh_job::refresh_prices,
        )
        .await?;

        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::External(format!("Failed to start scheduler: {}", e)))?;

        info!("✅ Job scheduler started successfully");
        Ok(())
    }

    /// Stop the scheduler gracefully
    pub async fn stop(&mut self) -> Result<(), AppError> {
        info!("🛑 Stopping job scheduler...");
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::External(format!("Failed to stop scheduler: {}", e)))?;
        info!("✅ Job scheduler stopped");
        Ok(())
    }

    async fn schedule_job<F, Fut>(
        &mut self,
        schedule: &str,
        job_name: &'static str,
        description: &str,
        job_fn: F,
    ) -> Result<(), AppError>
    where
        F: Fn(JobContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<JobResult, AppError>> + Send + 'static,
    {
        let context = self.context.clone();
        let job_fn = Arc::new(job_fn);

        let job = Job::new_async(schedule, move |_uuid, _l| {
            let context = context.clone();
            let job_fn = job_fn.clone();
            Box::pin(async move {
                // Outcome is already logged and stored in job_runs
                let _ = execute_job_with_tracking(job_name, context, job_fn.as_ref()).await;
            })
        })
        .map_err(|e| AppError::External(format!("Failed to create job {}: {}", job_name, e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::External(format!("Failed to add job {}: {}", job_name, e)))?;

        info!("📅 Scheduled: {} - {} [cron: {}]", job_name, description, schedule);
        Ok(())
    }
}

/// Runs the price refresh outside the schedule, tracked like a scheduled run.
pub async fn run_price_refresh_now(context: JobContext) -> Result<JobResult, AppError> {
    info!("🖐️ Manual trigger: {}", price_refresh_job::JOB_NAME);
    execute_job_with_tracking(price_refresh_job::JOB_NAME, context, &price_refresh_job::refresh_prices).await
}

// Job tracking wrapper
async fn execute_job_with_tracking<F, Fut>(
    job_name: &str,
    context: JobContext,
    job_fn: &F,
) -> Result<JobResult, AppError>
where
    F: Fn(JobContext) -> Fut,
    Fut: std::future::Future<Output = Result<JobResult, AppError>>,
{
    info!("🏃 Starting job: {}", job_name);
    let pool = context.pool.clone();
    let started_at = Utc::now();

    let job_id = job_run_queries::record_start(&pool, job_name).await.map_err(|e| {
        error!("Failed to record job start: {}", e);
        e
    })?;

    let result = job_fn(context).await;
    let duration_ms = (Utc::now() - started_at).num_milliseconds();

    match &result {
        Ok(job_result) => {
            info!(
                "✅ Job completed: {} (processed: {}, failed: {}, duration: {}ms)",
                job_name, job_result.items_processed, job_result.items_failed, duration_ms
            );

            if let Err(e) = job_run_queries::record_success(
                &pool,
                job_id,
                job_result.items_processed,
                job_result.items_failed,
                duration_ms,
            )
            .await
            {
                error!("Failed to record job success: {}", e);
            }
        }
        Err(e) => {
            error!("❌ Job failed: {} - {}", job_name, e);

            if let Err(e) = job_run_queries::record_failure(&pool, job_id, &e.to_string(), duration_ms).await {
                error!("Failed to record job failure: {}", e);
            }
        }
    }
    result
}
