use std::collections::HashMap;

use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use crate::models::{AssetType, PricePoint, PriceRecord};

/// Latest recorded price per (symbol, asset type) for the given symbols.
pub async fn fetch_latest_batch(
    pool: &PgPool,
    symbols: &[String],
) -> Result<HashMap<(String, AssetType), f64>, sqlx::Error> {
    if symbols.is_empty() {
        return Ok(HashMap::new());
    }

    let records = sqlx::query_as::<_, PriceRecord>(
        r#"
        SELECT DISTINCT ON (symbol, asset_type) id, symbol, asset_type, price, recorded_at, source
        FROM price_history
        WHERE symbol = ANY($1)
        ORDER BY symbol, asset_type, recorded_at DESC
        "#,
    )
    .bind(symbols)
    .fetch_all(pool)
    .await?;

    Ok(records
        .into_iter()
        .map(|r| ((r.symbol, r.asset_type), r.price))
        .collect())
}

pub async fn fetch_latest(
    pool: &PgPool,
    symbol: &str,
    asset_type: AssetType,
) -> Result<Option<PriceRecord>, sqlx::Error> {
    sqlx::query_as::<_, PriceRecord>(
        "SELECT id, symbol, asset_type, price, recorded_at, source
         FROM price_history
         WHERE symbol = $1 AND asset_type = $2
         ORDER BY recorded_at DESC
         LIMIT 1",
    )
    .bind(symbol)
    .bind(asset_type)
    .fetch_optional(pool)
    .await
}

/// Full history of a pair, oldest first.
pub async fn fetch_history(
    pool: &PgPool,
    symbol: &str,
    asset_type: AssetType,
) -> Result<Vec<PricePoint>, sqlx::Error> {
    sqlx::query_as::<_, PricePoint>(
        "SELECT recorded_at AS timestamp, price
         FROM price_history
         WHERE symbol = $1 AND asset_type = $2
         ORDER BY recorded_at ASC",
    )
    .bind(symbol)
    .bind(asset_type)
    .fetch_all(pool)
    .await
}

/// The most recent `limit` records whose upper-cased symbol is in `upper_symbols`.
pub async fn fetch_recent_window(
    pool: &PgPool,
    upper_symbols: &[String],
    limit: i64,
) -> Result<Vec<PriceRecord>, sqlx::Error> {
    if upper_symbols.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, PriceRecord>(
        "SELECT id, symbol, asset_type, price, recorded_at, source
         FROM price_history
         WHERE UPPER(symbol) = ANY($1)
         ORDER BY recorded_at DESC
         LIMIT $2",
    )
    .bind(upper_symbols)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Appends a price record and moves every matching asset to the new price,
/// atomically. Returns the number of assets updated.
pub async fn record_and_apply(
    pool: &PgPool,
    symbol: &str,
    asset_type: AssetType,
    price: f64,
    source: &str,
) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await.map_err(|e| {
        error!("Failed to begin transaction for {} ({}): {}", symbol, asset_type, e);
        e
    })?;

    sqlx::query(
        "INSERT INTO price_history (id, symbol, asset_type, price, recorded_at, source)
         VALUES ($1, $2, $3, $4, NOW(), $5)",
    )
    .bind(Uuid::new_v4())
    .bind(symbol)
    .bind(asset_type)
    .bind(price)
    .bind(source)
    .execute(&mut *tx)
    .await?;

    let updated = sqlx::query(
        "UPDATE assets
         SET current_price = $3, updated_at = NOW()
         WHERE symbol = $1 AND asset_type = $2",
    )
    .bind(symbol)
    .bind(asset_type)
    .bind(price)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await.map_err(|e| {
        error!("Failed to commit price update for {} ({}): {}", symbol, asset_type, e);
        e
    })?;
    Ok(updated)
}
