use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::{DashboardOverview, Performance};
use crate::services::{portfolio_service, price_service, valuation_service};

pub async fn overview(pool: &PgPool, user_id: Uuid) -> Result<DashboardOverview, AppError> {
    let summaries = portfolio_service::summaries_for_user(pool, user_id).await?;
    let portfolio_count = summaries.len();
    let overview = valuation_service::overview(summaries, portfolio_count);
    info!(
        "Dashboard overview for user {}: {} portfolios, total value {:.2}",
        user_id, overview.portfolio_count, overview.total_value
    );
    Ok(overview)
}

pub async fn performance(pool: &PgPool, user_id: Uuid) -> Result<Performance, AppError> {
    let assets = db::asset_queries::fetch_for_user(pool, user_id).await?;
    let assets = price_service::with_latest_prices(pool, assets).await?;
    Ok(valuation_service::performance(&assets))
}
