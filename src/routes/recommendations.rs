use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::Recommendations;
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user", get(get_user_recommendations))
        .route("/portfolio/:id", get(get_portfolio_recommendations))
}

pub async fn get_user_recommendations(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Recommendations>, AppError> {
    info!("GET /recommendations/user - User {}", user.user_id);
    let recommendations = services::recommendation_service::for_user(&state.pool, user.user_id)
        .await
        .map_err(|e| {
            error!("Failed to build recommendations for user {}: {}", user.user_id, e);
            e
        })?;
    Ok(Json(recommendations))
}

pub async fn get_portfolio_recommendations(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Recommendations>, AppError> {
    info!("GET /recommendations/portfolio/{} - User {}", id, user.user_id);
    let recommendations = services::recommendation_service::for_portfolio(&state.pool, id, user.user_id)
        .await
        .map_err(|e| {
            error!("Failed to build recommendations for portfolio {}: {}", id, e);
            e
        })?;
    Ok(Json(recommendations))
}
