use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::AdminGuard;
use crate::errors::AppError;
use crate::models::{
    AdminDashboard, AssetTypeCatalogue, CreateCustomAssetType, CustomAssetType, JobRun,
    PortfolioStats, UpdateCustomAssetType, UserActivity, UserSummary,
};
use crate::services;
use crate::services::job_scheduler_service::{self, JobResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user).delete(delete_user))
        .route("/users/:id/portfolios", get(get_user_portfolios))
        .route("/users/:id/activities", get(get_user_activities))
        .route("/dashboard", get(get_dashboard))
        .route("/asset-types", get(get_asset_types))
        .route("/asset-types/custom", post(create_custom_type))
        .route(
            "/asset-types/custom/:id",
            get(get_custom_type).put(update_custom_type).delete(delete_custom_type),
        )
        .route("/jobs/runs", get(get_job_runs))
        .route("/jobs/refresh-prices", post(trigger_price_refresh))
}

pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminGuard,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    info!("GET /admin/users - Listing users");
    let users = services::admin_service::list_users(&state.pool)
        .await
        .map_err(|e| {
            error!("Failed to list users: {}", e);
            e
        })?;
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    _admin: AdminGuard,
    Path(id): Path<Uuid>,
) -> Result<Json<UserSummary>, AppError> {
    info!("GET /admin/users/{} - Fetching user", id);
    let user = services::admin_service::get_user(&state.pool, id).await?;
    Ok(Json(user))
}

pub async fn get_user_portfolios(
    State(state): State<AppState>,
    _admin: AdminGuard,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PortfolioStats>>, AppError> {
    info!("GET /admin/users/{}/portfolios - Fetching user portfolios", id);
    let portfolios = services::admin_service::user_portfolios(&state.pool, id)
        .await
        .map_err(|e| {
            error!("Failed to fetch portfolios of user {}: {}", id, e);
            e
        })?;
    Ok(Json(portfolios))
}

pub async fn get_user_activities(
    State(state): State<AppState>,
    _admin: AdminGuard,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<UserActivity>>, AppError> {
    info!("GET /admin/users/{}/activities - Building activity feed", id);
    let activities = services::admin_service::user_activities(&state.pool, id)
        .await
        .map_err(|e| {
            error!("Failed to build activity feed for user {}: {}", id, e);
            e
        })?;
    Ok(Json(activities))
}

pub async fn delete_user(
    State(state): State<AppState>,
    _admin: AdminGuard,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    warn!("DELETE /admin/users/{} - Deleting user", id);
    services::admin_service::delete_user(&state.pool, id)
        .await
        .map_err(|e| {
            error!("Failed to delete user {}: {}", id, e);
            e
        })?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    _admin: AdminGuard,
) -> Result<Json<AdminDashboard>, AppError> {
    info!("GET /admin/dashboard - Building admin dashboard");
    let dashboard = services::admin_service::dashboard(&state.pool)
        .await
        .map_err(|e| {
            error!("Failed to build admin dashboard: {}", e);
            e
        })?;
    Ok(Json(dashboard))
}

pub async fn get_asset_types(
    State(state): State<AppState>,
    _admin: AdminGuard,
) -> Result<Json<AssetTypeCatalogue>, AppError> {
    info!("GET /admin/asset-types - Fetching asset types");
    let catalogue = services::admin_service::asset_types(&state.pool).await?;
    Ok(Json(catalogue))
}

pub async fn get_custom_type(
    State(state): State<AppState>,
    _admin: AdminGuard,
    Path(id): Path<i32>,
) -> Result<Json<CustomAssetType>, AppError> {
    info!("GET /admin/asset-types/custom/{} - Fetching custom type", id);
    let custom_type = services::admin_service::get_custom_type(&state.pool, id).await?;
    Ok(Json(custom_type))
}

pub async fn create_custom_type(
    State(state): State<AppState>,
    _admin: AdminGuard,
    Json(data): Json<CreateCustomAssetType>,
) -> Result<(StatusCode, Json<CustomAssetType>), AppError> {
    info!("POST /admin/asset-types/custom - Creating '{}'", data.name);
    let created = services::admin_service::create_custom_type(&state.pool, data)
        .await
        .map_err(|e| {
            error!("Failed to create custom asset type: {}", e);
            e
        })?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_custom_type(
    State(state): State<AppState>,
    _admin: AdminGuard,
    Path(id): Path<i32>,
    Json(data): Json<UpdateCustomAssetType>,
) -> Result<Json<CustomAssetType>, AppError> {
    info!("PUT /admin/asset-types/custom/{} - Updating custom type", id);
    let updated = services::admin_service::update_custom_type(&state.pool, id, data)
        .await
        .map_err(|e| {
            error!("Failed to update custom asset type {}: {}", id, e);
            e
        })?;
    Ok(Json(updated))
}

pub async fn delete_custom_type(
    State(state): State<AppState>,
    _admin: AdminGuard,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    info!("DELETE /admin/asset-types/custom/{} - Deleting custom type", id);
    services::admin_service::delete_custom_type(&state.pool, id)
        .await
        .map_err(|e| {
            error!("Failed to delete custom asset type {}: {}", id, e);
            e
        })?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct JobRunsQuery {
    pub limit: Option<i64>,
}

pub async fn get_job_runs(
    State(state): State<AppState>,
    _admin: AdminGuard,
    Query(query): Query<JobRunsQuery>,
) -> Result<Json<Vec<JobRun>>, AppError> {
    let limit = query.limit.unwrap_or(services::admin_service::DEFAULT_JOB_RUNS_LIMIT);
    info!("GET /admin/jobs/runs - Fetching last {} job runs", limit);
    let runs = services::admin_service::job_runs(&state.pool, limit).await?;
    Ok(Json(runs))
}

pub async fn trigger_price_refresh(
    State(state): State<AppState>,
    _admin: AdminGuard,
) -> Result<Json<JobResult>, AppError> {
    info!("POST /admin/jobs/refresh-prices - Manual price refresh");
    let result = job_scheduler_service::run_price_refresh_now(state.job_context())
        .await
        .map_err(|e| {
            error!("Manual price refresh failed: {}", e);
            e
        })?;
    Ok(Json(result))
}
