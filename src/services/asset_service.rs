use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::asset_type::builtin_catalogue;
use crate::models::{
    Asset, AssetType, AssetTypeCatalogue, AssetView, CreateAsset, PricePoint, UpdateAsset,
    SOURCE_INITIAL, SOURCE_MANUAL_UPDATE,
};
use crate::services::price_service;

const MAX_NAME_LEN: usize = 100;
const MAX_SYMBOL_LEN: usize = 10;
const MIN_QUANTITY: f64 = 0.000_000_01;
const MIN_PRICE: f64 = 0.01;

/// Validated, trimmed asset fields shared by create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetFields {
    pub name: String,
    pub symbol: String,
    pub quantity: f64,
    pub purchase_price: f64,
    pub current_price: f64,
}

pub fn validate_fields(
    name: &str,
    symbol: &str,
    quantity: f64,
    purchase_price: f64,
    current_price: f64,
) -> Result<AssetFields, AppError> {
    let name = name.trim();
    let symbol = symbol.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Asset name is required".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "Asset name cannot exceed {} characters",
            MAX_NAME_LEN
        )));
    }
    if symbol.is_empty() {
        return Err(AppError::Validation("Asset symbol is required".into()));
    }
    if symbol.chars().count() > MAX_SYMBOL_LEN {
        return Err(AppError::Validation(format!(
            "Asset symbol cannot exceed {} characters",
            MAX_SYMBOL_LEN
        )));
    }
    if !quantity.is_finite() || quantity < MIN_QUANTITY {
        return Err(AppError::Validation("Quantity must be greater than 0".into()));
    }
    if !purchase_price.is_finite() || purchase_price < MIN_PRICE {
        return Err(AppError::Validation("Purchase price must be at least 0.01".into()));
    }
    if !current_price.is_finite() || current_price < MIN_PRICE {
        return Err(AppError::Validation("Current price must be at least 0.01".into()));
    }
    Ok(AssetFields {
        name: name.to_string(),
        symbol: symbol.to_string(),
        quantity,
        purchase_price,
        current_price,
    })
}

/// Accepts a built-in code, or the code of a custom type that exists.
pub async fn resolve_asset_type(pool: &PgPool, code: i32) -> Result<AssetType, AppError> {
    let asset_type =
        AssetType::from_code(code).map_err(|e| AppError::Validation(e.to_string()))?;
    if let Some(custom_id) = asset_type.custom_type_id() {
        if !db::custom_asset_type_queries::exists(pool, custom_id).await? {
            return Err(AppError::Validation(format!("Unknown custom asset type {}", custom_id)));
        }
    }
    Ok(asset_type)
}

fn to_views(assets: &[Asset]) -> Vec<AssetView> {
    assets.iter().map(AssetView::from).collect()
}

/// Assets of the portfolio with latest prices applied; empty when the
/// portfolio is missing or belongs to someone else.
pub async fn fetch_for_portfolio(
    pool: &PgPool,
    portfolio_id: Uuid,
    user_id: Uuid,
) -> Result<Vec<AssetView>, AppError> {
    let assets = db::asset_queries::fetch_for_owned_portfolio(pool, portfolio_id, user_id).await?;
    let assets = price_service::with_latest_prices(pool, assets).await?;
    Ok(to_views(&assets))
}

pub async fn fetch_one(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<AssetView, AppError> {
    let asset = db::asset_queries::fetch_owned(pool, id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Asset with ID {} not found", id)))?;
    let assets = price_service::with_latest_prices(pool, vec![asset]).await?;
    Ok(to_views(&assets).remove(0))
}

pub async fn create(pool: &PgPool, user_id: Uuid, input: CreateAsset) -> Result<AssetView, AppError> {
    let fields = validate_fields(
        &input.name,
        &input.symbol,
        input.quantity,
        input.purchase_price,
        input.current_price,
    )?;

    if db::portfolio_queries::fetch_owned(pool, input.portfolio_id, user_id)
        .await?
        .is_none()
    {
        warn!("User {} tried to add an asset to portfolio {}", user_id, input.portfolio_id);
        return Err(AppError::Validation("Portfolio not found or access denied".into()));
    }
    let asset_type = resolve_asset_type(pool, input.asset_type).await?;

    let now = Utc::now();
    let asset = Asset {
        id: Uuid::new_v4(),
        portfolio_id: input.portfolio_id,
        name: fields.name,
        symbol: fields.symbol,
        asset_type,
        quantity: fields.quantity,
        purchase_price: fields.purchase_price,
        current_price: fields.current_price,
        purchase_date: input.purchase_date.unwrap_or(now),
        created_at: now,
        updated_at: None,
    };
    let created = db::asset_queries::insert_with_price(pool, &asset, SOURCE_INITIAL).await?;
    info!("Created asset {} ({}) in portfolio {}", created.id, created.symbol, created.portfolio_id);
    Ok(AssetView::from(&created))
}

/// Source tag for the price record an edit should append, if any.
pub fn manual_update_source(old_price: f64, new_price: f64) -> Option<&'static str> {
    (old_price != new_price).then_some(SOURCE_MANUAL_UPDATE)
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    input: UpdateAsset,
) -> Result<AssetView, AppError> {
    let fields = validate_fields(
        &input.name,
        &input.symbol,
        input.quantity,
        input.purchase_price,
        input.current_price,
    )?;
    let existing = db::asset_queries::fetch_owned(pool, id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Asset with ID {} not found", id)))?;
    let asset_type = resolve_asset_type(pool, input.asset_type).await?;

    let source = manual_update_source(existing.current_price, fields.current_price);
    let asset = Asset {
        name: fields.name,
        symbol: fields.symbol,
        asset_type,
        quantity: fields.quantity,
        purchase_price: fields.purchase_price,
        current_price: fields.current_price,
        purchase_date: input.purchase_date,
        ..existing
    };
    let updated = db::asset_queries::update_with_price(pool, &asset, source).await?;
    info!("Updated asset {} (price record: {})", updated.id, source.is_some());
    Ok(AssetView::from(&updated))
}

pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
    match db::asset_queries::delete_owned(pool, id, user_id).await? {
        0 => Err(AppError::NotFound(format!("Asset with ID {} not found", id))),
        _ => Ok(()),
    }
}

/// Price history of the asset's (symbol, type) pair, oldest first; empty
/// when the asset is not the user's.
pub async fn price_history(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<Vec<PricePoint>, AppError> {
    let Some(asset) = db::asset_queries::fetch_owned(pool, id, user_id).await? else {
        return Ok(Vec::new());
    };
    let history = db::price_queries::fetch_history(pool, &asset.symbol, asset.asset_type).await?;
    Ok(history)
}

/// Built-in types plus the active custom types, for asset forms.
pub async fn asset_types(pool: &PgPool) -> Result<AssetTypeCatalogue, AppError> {
    let custom_types = db::custom_asset_type_queries::fetch_active(pool).await?;
    Ok(AssetTypeCatalogue {
        built_in_types: builtin_catalogue(),
        custom_types,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_trims_name_and_symbol() {
        let fields = validate_fields("  Bitcoin ", " BTC ", 0.5, 40_000.0, 45_000.0).unwrap();
        assert_eq!(fields.name, "Bitcoin");
        assert_eq!(fields.symbol, "BTC");
    }

    #[test]
    fn test_validate_symbol_length() {
        assert!(validate_fields("x", "ABCDEFGHIJ", 1.0, 1.0, 1.0).is_ok());
        assert!(validate_fields("x", "ABCDEFGHIJK", 1.0, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_validate_quantity_floor() {
        assert!(validate_fields("x", "X", 0.000_000_01, 1.0, 1.0).is_ok());
        assert!(validate_fields("x", "X", 0.0, 1.0, 1.0).is_err());
        assert!(validate_fields("x", "X", -1.0, 1.0, 1.0).is_err());
        assert!(validate_fields("x", "X", f64::NAN, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_validate_price_floor() {
        assert!(validate_fields("x", "X", 1.0, 0.01, 0.01).is_ok());
        assert!(validate_fields("x", "X", 1.0, 0.009, 1.0).is_err());
        assert!(validate_fields("x", "X", 1.0, 1.0, 0.0).is_err());
    }

    #[test]
    fn test_validate_requires_name() {
        let err = validate_fields("   ", "BTC", 1.0, 1.0, 1.0).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("name")));
    }

    #[test]
    fn test_manual_update_source_only_on_price_change() {
        assert_eq!(manual_update_source(100.0, 100.0), None);
        assert_eq!(manual_update_source(100.0, 101.0), Some("Manual Update"));
    }
}
