use std::sync::Arc;

use anyhow::Context;
use calmative_backend::config::AppConfig;
use calmative_backend::external::price_provider::PriceSource;
use calmative_backend::external::simulated::SimulatedPriceSource;
use calmative_backend::logging::init_logging;
use calmative_backend::services::email_service;
use calmative_backend::services::job_scheduler_service::JobSchedulerService;
use calmative_backend::{app, AppState};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    init_logging(&config.log).map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to the database")?;

    if config.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;
        tracing::info!("✅ Database migrations applied");
    }

    let mailer = email_service::mailer_from_config(config.smtp.as_ref())
        .map_err(|e| anyhow::anyhow!("Failed to configure mailer: {}", e))?;
    let price_source: Arc<dyn PriceSource> = Arc::new(SimulatedPriceSource::new());
    tracing::info!("📊 Using price source: {}", price_source.name());

    let bind_addr = config.bind_addr;
    let price_refresh_schedule = config.price_refresh_schedule.clone();
    let test_mode = config.job_scheduler_test_mode;
    let state = AppState::new(pool, config, mailer, price_source);

    let mut scheduler = JobSchedulerService::new(state.job_context())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create job scheduler: {}", e))?;
    scheduler
        .start(&price_refresh_schedule, test_mode)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start job scheduler: {}", e))?;

    let app = app::create_app(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    tracing::info!("🚀 Calmative backend running at http://{}/", bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = scheduler.stop().await {
        tracing::warn!("Scheduler did not stop cleanly: {}", e);
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("🛑 Shutdown signal received");
}
