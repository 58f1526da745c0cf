use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::{DashboardOverview, Performance};
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/overview", get(get_overview))
        .route("/performance", get(get_performance))
}

pub async fn get_overview(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<DashboardOverview>, AppError> {
    info!("GET /dashboard/overview - User {}", user.user_id);
    let overview = services::dashboard_service::overview(&state.pool, user.user_id)
        .await
        .map_err(|e| {
            error!("Failed to build dashboard overview: {}", e);
            e
        })?;
    Ok(Json(overview))
}

pub async fn get_performance(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Performance>, AppError> {
    info!("GET /dashboard/performance - User {}", user.user_id);
    let performance = services::dashboard_service::performance(&state.pool, user.user_id)
        .await
        .map_err(|e| {
            error!("Failed to build performance view: {}", e);
            e
        })?;
    Ok(Json(performance))
}
