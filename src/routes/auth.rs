use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Redirect;
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use tracing::{error, info, warn};

use crate::auth::{bearer_token, AuthUser};
use crate::errors::AppError;
use crate::models::{
    AuthResponse, ChangePasswordRequest, ConfirmEmailQuery, ForgotPasswordRequest, LoginRequest,
    MessageResponse, RegisterRequest, ResetPasswordRequest, TokenValidation, UserView,
};
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/confirm-email", get(confirm_email))
        .route("/request-password-reset", post(request_password_reset))
        .route("/reset-password", post(reset_password))
        .route("/change-password", post(change_password))
        .route("/profile", get(profile))
        .route("/validate-token", post(validate_token))
}

pub async fn register(
    State(state): State<AppState>,
    Json(data): Json<RegisterRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    info!("POST /auth/register - Registering {}", data.email.trim());
    let response = services::auth_service::register(&state.pool, &state.config, state.mailer.as_ref(), data)
        .await
        .map_err(|e| {
            error!("Registration failed: {}", e);
            e
        })?;
    Ok(Json(response))
}

pub async fn login(
    State(state): State<AppState>,
    Json(data): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    info!("POST /auth/login - Login attempt");
    let response = services::auth_service::login(&state.pool, &state.jwt, data).await?;
    Ok(Json(response))
}

pub async fn confirm_email(
    State(state): State<AppState>,
    Query(query): Query<ConfirmEmailQuery>,
) -> Redirect {
    let success = match query.parts() {
        Some((user_id, token)) => {
            info!("GET /auth/confirm-email - Confirming user {}", user_id);
            services::auth_service::confirm_email(&state.pool, user_id, token)
                .await
                .unwrap_or_else(|e| {
                    error!("Failed to confirm email for user {}: {}", user_id, e);
                    false
                })
        }
        None => {
            warn!("GET /auth/confirm-email - Malformed confirmation link");
            false
        }
    };
    Redirect::to(&services::auth_service::confirm_landing_url(
        state.config.frontend_base(),
        success,
    ))
}

pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(data): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    info!("POST /auth/request-password-reset");
    let response = services::auth_service::request_password_reset(
        &state.pool,
        &state.config,
        state.mailer.as_ref(),
        &data.email,
    )
    .await
    .map_err(|e| {
        error!("Failed to process password reset request: {}", e);
        e
    })?;
    Ok(Json(response))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(data): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    info!("POST /auth/reset-password");
    let response = services::auth_service::reset_password(&state.pool, data).await?;
    Ok(Json(response))
}

pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(data): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    info!("POST /auth/change-password - User {}", user.user_id);
    let response = services::auth_service::change_password(&state.pool, user.user_id, data).await?;
    Ok(Json(response))
}

pub async fn profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserView>, AppError> {
    info!("GET /auth/profile - User {}", user.user_id);
    let view = services::auth_service::profile(&state.pool, user.user_id)
        .await
        .map_err(|e| {
            error!("Failed to load profile for {}: {}", user.user_id, e);
            e
        })?;
    Ok(Json(view))
}

/// 400 when no bearer token is sent, otherwise 200 with the verdict.
pub async fn validate_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<TokenValidation>) {
    let token = bearer_token(&headers);
    let status = if token.is_some() { StatusCode::OK } else { StatusCode::BAD_REQUEST };
    (status, Json(services::auth_service::validate_token(&state.jwt, token)))
}
