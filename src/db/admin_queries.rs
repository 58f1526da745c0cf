use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{AssetAddition, PortfolioStats};

pub async fn fetch_portfolio_stats(pool: &PgPool, user_id: Uuid) -> Result<Vec<PortfolioStats>, sqlx::Error> {
    sqlx::query_as::<_, PortfolioStats>(
        "SELECT p.id, p.name, p.description, p.created_at, p.updated_at,
                COUNT(a.id) AS assets_count,
                COALESCE(SUM(a.quantity * a.current_price), 0)::DOUBLE PRECISION AS total_value
         FROM portfolios p
         LEFT JOIN assets a ON a.portfolio_id = p.id
         WHERE p.user_id = $1
         GROUP BY p.id
         ORDER BY p.created_at ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn fetch_asset_additions(pool: &PgPool, user_id: Uuid) -> Result<Vec<AssetAddition>, sqlx::Error> {
    sqlx::query_as::<_, AssetAddition>(
        "SELECT a.id, a.name, a.created_at, p.id AS portfolio_id, p.name AS portfolio_name
         FROM assets a
         JOIN portfolios p ON p.id = a.portfolio_id
         WHERE p.user_id = $1
         ORDER BY a.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

async fn count(pool: &PgPool, table_sql: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(table_sql).fetch_one(pool).await
}

pub async fn count_users(pool: &PgPool) -> Result<i64, sqlx::Error> {
    count(pool, "SELECT COUNT(*) FROM users").await
}

pub async fn count_portfolios(pool: &PgPool) -> Result<i64, sqlx::Error> {
    count(pool, "SELECT COUNT(*) FROM portfolios").await
}

pub async fn count_assets(pool: &PgPool) -> Result<i64, sqlx::Error> {
    count(pool, "SELECT COUNT(*) FROM assets").await
}

pub async fn total_asset_value(pool: &PgPool) -> Result<f64, sqlx::Error> {
    sqlx::query_scalar::<_, f64>(
        "SELECT COALESCE(SUM(quantity * current_price), 0)::DOUBLE PRECISION FROM assets",
    )
    .fetch_one(pool)
    .await
}
