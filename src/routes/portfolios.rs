use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use http::StatusCode;
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::{CreatePortfolio, PortfolioSummary, PortfolioView, UpdatePortfolio};
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(fetch_portfolios).post(create_portfolio))
        .route(
            "/:id",
            get(get_portfolio).put(update_portfolio).delete(delete_portfolio),
        )
        .route("/:id/summary", get(get_portfolio_summary))
}

pub async fn create_portfolio(
    State(state): State<AppState>,
    user: AuthUser,
    Json(data): Json<CreatePortfolio>,
) -> Result<(StatusCode, Json<PortfolioView>), AppError> {
    info!("POST /portfolios - Creating new portfolio for user {}", user.user_id);
    let portfolio = services::portfolio_service::create(&state.pool, user.user_id, data)
        .await
        .map_err(|e| {
            error!("Failed to create portfolio: {}", e);
            e
        })?;
    Ok((StatusCode::CREATED, Json(portfolio)))
}

pub async fn fetch_portfolios(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<PortfolioView>>, AppError> {
    info!("GET /portfolios - Fetching portfolios for user {}", user.user_id);
    let portfolios = services::portfolio_service::fetch_for_user(&state.pool, user.user_id)
        .await
        .map_err(|e| {
            error!("Failed to fetch portfolios: {}", e);
            e
        })?;
    Ok(Json(portfolios))
}

pub async fn get_portfolio(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PortfolioView>, AppError> {
    info!("GET /portfolios/{} - Fetching portfolio", id);
    let portfolio = services::portfolio_service::fetch_one(&state.pool, id, user.user_id)
        .await
        .map_err(|e| {
            error!("Failed to fetch portfolio {}: {}", id, e);
            e
        })?;
    Ok(Json(portfolio))
}

pub async fn update_portfolio(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdatePortfolio>,
) -> Result<Json<PortfolioView>, AppError> {
    info!("PUT /portfolios/{} - Updating portfolio", id);
    let portfolio = services::portfolio_service::update(&state.pool, id, user.user_id, data)
        .await
        .map_err(|e| {
            error!("Failed to update portfolio {}: {}", id, e);
            e
        })?;
    Ok(Json(portfolio))
}

pub async fn delete_portfolio(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    info!("DELETE /portfolios/{} - Deleting portfolio", id);
    services::portfolio_service::delete(&state.pool, id, user.user_id)
        .await
        .map_err(|e| {
            error!("Failed to delete portfolio {}: {}", id, e);
            e
        })?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_portfolio_summary(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PortfolioSummary>, AppError> {
    info!("GET /portfolios/{}/summary - Summarizing portfolio", id);
    let summary = services::portfolio_service::summary(&state.pool, id, user.user_id)
        .await
        .map_err(|e| {
            error!("Failed to summarize portfolio {}: {}", id, e);
            e
        })?;
    Ok(Json(summary))
}
