//! Store-level tests. They need a disposable Postgres database named by
//! `TEST_DATABASE_URL` and return early when it is not set. Every test works
//! on its own user and symbols, so they can share one database.

use std::sync::Arc;

use async_trait::async_trait;
use calmative_backend::db;
use calmative_backend::errors::AppError;
use calmative_backend::external::price_provider::{PriceProviderError, PriceSource};
use calmative_backend::models::{
    AssetType, CreateAsset, CreateCustomAssetType, CreatePortfolio, JobStatus, User,
    SOURCE_AUTO_UPDATE, SOURCE_INITIAL,
};
use calmative_backend::services::job_scheduler_service::{self, JobContext};
use calmative_backend::services::{admin_service, asset_service, portfolio_service, price_service};
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

async fn test_pool() -> Option<PgPool> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return None;
    };
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("connect to test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("apply migrations");
    Some(pool)
}

/// Nine characters, upper case, unique per call.
fn unique_symbol() -> String {
    format!("Z{}", &Uuid::new_v4().simple().to_string()[..8]).to_uppercase()
}

async fn seed_user(pool: &PgPool) -> Uuid {
    let user = User {
        id: Uuid::new_v4(),
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        email: format!("{}@example.com", Uuid::new_v4().simple()),
        password_hash: "not-a-real-hash".to_string(),
        is_email_confirmed: true,
        confirmation_token: None,
        confirmation_token_expires_at: None,
        password_reset_token: None,
        password_reset_token_expires_at: None,
        created_at: Utc::now(),
        updated_at: None,
    };
    db::user_queries::insert(pool, &user).await.unwrap().id
}

async fn seed_portfolio(pool: &PgPool, user_id: Uuid) -> Uuid {
    portfolio_service::create(
        pool,
        user_id,
        CreatePortfolio {
            name: "Long term".to_string(),
            description: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn seed_asset(
    pool: &PgPool,
    user_id: Uuid,
    portfolio_id: Uuid,
    symbol: &str,
    asset_type: AssetType,
    price: f64,
) -> Uuid {
    asset_service::create(
        pool,
        user_id,
        CreateAsset {
            portfolio_id,
            name: format!("{} holding", symbol),
            symbol: symbol.to_string(),
            asset_type: asset_type.code(),
            quantity: 2.0,
            purchase_price: price,
            current_price: price,
            purchase_date: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn insert_series(pool: &PgPool, symbol: &str, asset_type: AssetType, count: i32) {
    // price n is recorded n seconds ago, so price 1 is the newest
    sqlx::query(
        "INSERT INTO price_history (id, symbol, asset_type, price, recorded_at, source)
         SELECT gen_random_uuid(), $1, $2, g::float8, NOW() - g * INTERVAL '1 second', 'Test'
         FROM generate_series(1, $3) AS g",
    )
    .bind(symbol)
    .bind(asset_type)
    .bind(count)
    .execute(pool)
    .await
    .unwrap();
}

/// Quotes only the symbols it was built for; everything else has no price.
struct QuoteFor {
    symbol: String,
    price: f64,
}

#[async_trait]
impl PriceSource for QuoteFor {
    async fn latest_price(
        &self,
        symbol: &str,
        _asset_type: AssetType,
    ) -> Result<f64, PriceProviderError> {
        Ok(if symbol == self.symbol { self.price } else { 0.0 })
    }

    fn name(&self) -> &'static str {
        "quote-for"
    }
}

#[tokio::test]
async fn recent_window_keeps_only_the_newest_records() {
    let Some(pool) = test_pool().await else { return };
    let symbol = unique_symbol();
    insert_series(&pool, &symbol, AssetType::CRYPTO, 1005).await;

    let window = db::price_queries::fetch_recent_window(&pool, &[symbol.clone()], 1000)
        .await
        .unwrap();

    assert_eq!(window.len(), 1000);
    assert_eq!(window[0].price, 1.0);
    assert!(window.iter().all(|r| r.price <= 1000.0));
}

#[tokio::test]
async fn recent_window_matches_symbols_case_insensitively() {
    let Some(pool) = test_pool().await else { return };
    let symbol = unique_symbol();
    insert_series(&pool, &symbol.to_lowercase(), AssetType::STOCK, 3).await;

    let window = db::price_queries::fetch_recent_window(&pool, &[symbol.clone()], 1000)
        .await
        .unwrap();

    assert_eq!(window.len(), 3);
    assert!(window.iter().all(|r| r.symbol == symbol.to_lowercase()));
}

#[tokio::test]
async fn record_and_apply_appends_history_and_moves_matching_assets() {
    let Some(pool) = test_pool().await else { return };
    let user_id = seed_user(&pool).await;
    let portfolio_id = seed_portfolio(&pool, user_id).await;
    let symbol = unique_symbol();
    let crypto = seed_asset(&pool, user_id, portfolio_id, &symbol, AssetType::CRYPTO, 10.0).await;
    let gold = seed_asset(&pool, user_id, portfolio_id, &symbol, AssetType::GOLD, 10.0).await;

    let initial = db::price_queries::fetch_latest(&pool, &symbol, AssetType::CRYPTO)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(initial.source.as_deref(), Some(SOURCE_INITIAL));

    let moved = db::price_queries::record_and_apply(
        &pool,
        &symbol,
        AssetType::CRYPTO,
        12.5,
        SOURCE_AUTO_UPDATE,
    )
    .await
    .unwrap();
    assert_eq!(moved, 1);

    let latest = db::price_queries::fetch_latest(&pool, &symbol, AssetType::CRYPTO)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.price, 12.5);
    assert_eq!(latest.source.as_deref(), Some(SOURCE_AUTO_UPDATE));

    let crypto = db::asset_queries::fetch_owned(&pool, crypto, user_id).await.unwrap().unwrap();
    let gold = db::asset_queries::fetch_owned(&pool, gold, user_id).await.unwrap().unwrap();
    assert_eq!(crypto.current_price, 12.5);
    assert_eq!(gold.current_price, 10.0);
}

#[tokio::test]
async fn deleting_a_portfolio_removes_its_assets() {
    let Some(pool) = test_pool().await else { return };
    let user_id = seed_user(&pool).await;
    let portfolio_id = seed_portfolio(&pool, user_id).await;
    let symbol = unique_symbol();
    let asset_id = seed_asset(&pool, user_id, portfolio_id, &symbol, AssetType::CRYPTO, 5.0).await;

    portfolio_service::delete(&pool, portfolio_id, user_id).await.unwrap();

    assert!(db::asset_queries::fetch_owned(&pool, asset_id, user_id)
        .await
        .unwrap()
        .is_none());
    // history outlives the holding
    assert!(db::price_queries::fetch_latest(&pool, &symbol, AssetType::CRYPTO)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn deleting_a_user_removes_portfolios_and_assets() {
    let Some(pool) = test_pool().await else { return };
    let user_id = seed_user(&pool).await;
    let portfolio_id = seed_portfolio(&pool, user_id).await;
    seed_asset(&pool, user_id, portfolio_id, &unique_symbol(), AssetType::SILVER, 25.0).await;

    admin_service::delete_user(&pool, user_id).await.unwrap();

    assert_eq!(db::portfolio_queries::count_for_user(&pool, user_id).await.unwrap(), 0);
    assert!(db::asset_queries::fetch_for_portfolio(&pool, portfolio_id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn custom_type_in_use_cannot_be_deleted() {
    let Some(pool) = test_pool().await else { return };
    let user_id = seed_user(&pool).await;
    let portfolio_id = seed_portfolio(&pool, user_id).await;
    let custom = admin_service::create_custom_type(
        &pool,
        CreateCustomAssetType {
            name: format!("wine-{}", Uuid::new_v4().simple()),
            display_name: "Fine Wine".to_string(),
            description: None,
            is_active: true,
        },
    )
    .await
    .unwrap();
    let wine = AssetType::Custom(custom.id);
    let asset_id = seed_asset(&pool, user_id, portfolio_id, &unique_symbol(), wine, 300.0).await;

    let err = admin_service::delete_custom_type(&pool, custom.id).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    asset_service::delete(&pool, asset_id, user_id).await.unwrap();
    admin_service::delete_custom_type(&pool, custom.id).await.unwrap();
    assert!(db::custom_asset_type_queries::fetch_one(&pool, custom.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn refresh_moves_held_assets_to_the_quoted_price() {
    let Some(pool) = test_pool().await else { return };
    let user_id = seed_user(&pool).await;
    let portfolio_id = seed_portfolio(&pool, user_id).await;
    let symbol = unique_symbol();
    let asset_id = seed_asset(&pool, user_id, portfolio_id, &symbol, AssetType::CRYPTO, 40.0).await;

    let source = QuoteFor {
        symbol: symbol.clone(),
        price: 44.0,
    };
    let report = price_service::refresh_all_prices(&pool, &source).await.unwrap();

    assert!(report.pairs_updated >= 1);
    assert!(report.pairs_total >= report.pairs_updated + report.pairs_skipped);
    let asset = db::asset_queries::fetch_owned(&pool, asset_id, user_id).await.unwrap().unwrap();
    assert_eq!(asset.current_price, 44.0);
    let latest = db::price_queries::fetch_latest(&pool, &symbol, AssetType::CRYPTO)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.source.as_deref(), Some(SOURCE_AUTO_UPDATE));
}

#[tokio::test]
async fn manual_refresh_is_recorded_as_a_job_run() {
    let Some(pool) = test_pool().await else { return };
    let user_id = seed_user(&pool).await;
    let portfolio_id = seed_portfolio(&pool, user_id).await;
    let symbol = unique_symbol();
    let asset_id = seed_asset(&pool, user_id, portfolio_id, &symbol, AssetType::STOCK, 100.0).await;

    let context = JobContext::new(
        pool.clone(),
        Arc::new(QuoteFor {
            symbol: symbol.clone(),
            price: 101.0,
        }),
    );
    let result = job_scheduler_service::run_price_refresh_now(context).await.unwrap();
    assert!(result.items_processed >= 1);

    let asset = db::asset_queries::fetch_owned(&pool, asset_id, user_id).await.unwrap().unwrap();
    assert_eq!(asset.current_price, 101.0);

    let runs = db::job_run_queries::fetch_recent(&pool, 50).await.unwrap();
    assert!(runs
        .iter()
        .any(|r| r.status == JobStatus::Success && r.items_processed >= Some(1)));
}
