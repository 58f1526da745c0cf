use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use crate::models::{Asset, AssetType, HeldSymbol};

const ASSET_COLUMNS: &str = "a.id, a.portfolio_id, a.name, a.symbol, a.asset_type, a.quantity,
    a.purchase_price, a.current_price, a.purchase_date, a.created_at, a.updated_at";

pub async fn fetch_for_portfolio(pool: &PgPool, portfolio_id: Uuid) -> Result<Vec<Asset>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM assets a WHERE a.portfolio_id = $1 ORDER BY a.created_at ASC",
        ASSET_COLUMNS
    );
    sqlx::query_as::<_, Asset>(&sql)
        .bind(portfolio_id)
        .fetch_all(pool)
        .await
}

/// Assets of a portfolio, empty unless the portfolio belongs to `user_id`.
pub async fn fetch_for_owned_portfolio(
    pool: &PgPool,
    portfolio_id: Uuid,
    user_id: Uuid,
) -> Result<Vec<Asset>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM assets a
         JOIN portfolios p ON p.id = a.portfolio_id
         WHERE a.portfolio_id = $1 AND p.user_id = $2
         ORDER BY a.created_at ASC",
        ASSET_COLUMNS
    );
    sqlx::query_as::<_, Asset>(&sql)
        .bind(portfolio_id)
        .bind(user_id)
        .fetch_all(pool)
        .await
}

pub async fn fetch_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Asset>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM assets a
         JOIN portfolios p ON p.id = a.portfolio_id
         WHERE p.user_id = $1
         ORDER BY a.created_at ASC",
        ASSET_COLUMNS
    );
    sqlx::query_as::<_, Asset>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await
}

pub async fn fetch_owned(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<Option<Asset>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM assets a
         JOIN portfolios p ON p.id = a.portfolio_id
         WHERE a.id = $1 AND p.user_id = $2",
        ASSET_COLUMNS
    );
    sqlx::query_as::<_, Asset>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn fetch_all(pool: &PgPool) -> Result<Vec<Asset>, sqlx::Error> {
    let sql = format!("SELECT {} FROM assets a ORDER BY a.created_at ASC", ASSET_COLUMNS);
    sqlx::query_as::<_, Asset>(&sql).fetch_all(pool).await
}

/// Inserts the asset and its opening price record in one transaction.
pub async fn insert_with_price(pool: &PgPool, asset: &Asset, source: &str) -> Result<Asset, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let created = sqlx::query_as::<_, Asset>(
        "INSERT INTO assets (id, portfolio_id, name, symbol, asset_type, quantity,
                             purchase_price, current_price, purchase_date, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING id, portfolio_id, name, symbol, asset_type, quantity,
                   purchase_price, current_price, purchase_date, created_at, updated_at",
    )
    .bind(asset.id)
    .bind(asset.portfolio_id)
    .bind(&asset.name)
    .bind(&asset.symbol)
    .bind(asset.asset_type)
    .bind(asset.quantity)
    .bind(asset.purchase_price)
    .bind(asset.current_price)
    .bind(asset.purchase_date)
    .bind(asset.created_at)
    .fetch_one(&mut *tx)
    .await?;

    insert_price_record(&mut tx, &asset.symbol, asset.asset_type, asset.current_price, source).await?;

    tx.commit().await?;
    Ok(created)
}

/// Saves the asset; when `price_source` is given a price record is appended too.
pub async fn update_with_price(
    pool: &PgPool,
    asset: &Asset,
    price_source: Option<&str>,
) -> Result<Asset, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query_as::<_, Asset>(
        "UPDATE assets
         SET name = $2, symbol = $3, asset_type = $4, quantity = $5,
             purchase_price = $6, current_price = $7, purchase_date = $8, updated_at = NOW()
         WHERE id = $1
         RETURNING id, portfolio_id, name, symbol, asset_type, quantity,
                   purchase_price, current_price, purchase_date, created_at, updated_at",
    )
    .bind(asset.id)
    .bind(&asset.name)
    .bind(&asset.symbol)
    .bind(asset.asset_type)
    .bind(asset.quantity)
    .bind(asset.purchase_price)
    .bind(asset.current_price)
    .bind(asset.purchase_date)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(source) = price_source {
        insert_price_record(&mut tx, &asset.symbol, asset.asset_type, asset.current_price, source).await?;
    }

    tx.commit().await?;
    Ok(updated)
}

async fn insert_price_record(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    symbol: &str,
    asset_type: AssetType,
    price: f64,
    source: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO price_history (id, symbol, asset_type, price, recorded_at, source)
         VALUES ($1, $2, $3, $4, NOW(), $5)",
    )
    .bind(Uuid::new_v4())
    .bind(symbol)
    .bind(asset_type)
    .bind(price)
    .bind(source)
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        error!("Failed to record price for {} ({}): {}", symbol, asset_type, e);
        e
    })?;
    Ok(())
}

pub async fn delete_owned(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM assets a
         USING portfolios p
         WHERE a.portfolio_id = p.id AND a.id = $1 AND p.user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn set_current_price(pool: &PgPool, id: Uuid, price: f64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE assets SET current_price = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(price)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Every distinct (symbol, asset type) pair held by any asset.
pub async fn fetch_held_symbols(pool: &PgPool) -> Result<Vec<HeldSymbol>, sqlx::Error> {
    sqlx::query_as::<_, HeldSymbol>(
        "SELECT DISTINCT symbol, asset_type FROM assets ORDER BY symbol, asset_type",
    )
    .fetch_all(pool)
    .await
}

pub async fn count_with_type_code(pool: &PgPool, code: i32) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM assets WHERE asset_type = $1")
        .bind(code)
        .fetch_one(pool)
        .await
}
