use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::{AssetTypeCatalogue, AssetView, CreateAsset, MessageResponse, PricePoint, UpdateAsset};
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_asset))
        .route("/types", get(get_asset_types))
        .route("/update-prices", post(update_prices))
        .route("/portfolio/:portfolio_id", get(fetch_portfolio_assets))
        .route("/:id", get(get_asset).put(update_asset).delete(delete_asset))
        .route("/:id/price-history", get(get_price_history))
}

pub async fn fetch_portfolio_assets(
    State(state): State<AppState>,
    user: AuthUser,
    Path(portfolio_id): Path<Uuid>,
) -> Result<Json<Vec<AssetView>>, AppError> {
    info!("GET /assets/portfolio/{} - Fetching assets", portfolio_id);
    let assets = services::asset_service::fetch_for_portfolio(&state.pool, portfolio_id, user.user_id)
        .await
        .map_err(|e| {
            error!("Failed to fetch assets for portfolio {}: {}", portfolio_id, e);
            e
        })?;
    Ok(Json(assets))
}

pub async fn get_asset(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AssetView>, AppError> {
    info!("GET /assets/{} - Fetching asset", id);
    let asset = services::asset_service::fetch_one(&state.pool, id, user.user_id).await?;
    Ok(Json(asset))
}

pub async fn create_asset(
    State(state): State<AppState>,
    user: AuthUser,
    Json(data): Json<CreateAsset>,
) -> Result<(StatusCode, Json<AssetView>), AppError> {
    info!("POST /assets - Adding {} to portfolio {}", data.symbol, data.portfolio_id);
    let asset = services::asset_service::create(&state.pool, user.user_id, data)
        .await
        .map_err(|e| {
            error!("Failed to create asset: {}", e);
            e
        })?;
    Ok((StatusCode::CREATED, Json(asset)))
}

pub async fn update_asset(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateAsset>,
) -> Result<Json<AssetView>, AppError> {
    info!("PUT /assets/{} - Updating asset", id);
    let asset = services::asset_service::update(&state.pool, id, user.user_id, data)
        .await
        .map_err(|e| {
            error!("Failed to update asset {}: {}", id, e);
            e
        })?;
    Ok(Json(asset))
}

pub async fn delete_asset(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    info!("DELETE /assets/{} - Deleting asset", id);
    services::asset_service::delete(&state.pool, id, user.user_id)
        .await
        .map_err(|e| {
            error!("Failed to delete asset {}: {}", id, e);
            e
        })?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_price_history(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PricePoint>>, AppError> {
    info!("GET /assets/{}/price-history - Fetching price history", id);
    let history = services::asset_service::price_history(&state.pool, id, user.user_id).await?;
    Ok(Json(history))
}

pub async fn update_prices(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    info!("POST /assets/update-prices - Requested by user {}", user.user_id);
    services::price_service::sync_asset_prices(&state.pool)
        .await
        .map_err(|e| {
            error!("Failed to sync asset prices: {}", e);
            e
        })?;
    Ok(Json(MessageResponse::new("Asset prices updated successfully")))
}

pub async fn get_asset_types(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<AssetTypeCatalogue>, AppError> {
    info!("GET /assets/types - Fetching asset type catalogue");
    let catalogue = services::asset_service::asset_types(&state.pool).await?;
    Ok(Json(catalogue))
}
