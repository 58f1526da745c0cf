use std::sync::LazyLock;

use chrono::{Duration, Utc};
use regex::Regex;
use sqlx::PgPool;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use crate::auth::{self, JwtManager};
use crate::config::AppConfig;
use crate::db;
use crate::errors::AppError;
use crate::models::{
    AuthResponse, ChangePasswordRequest, LoginRequest, MessageResponse, Portfolio, RegisterRequest,
    ResetPasswordRequest, TokenValidation, User, UserView,
};
use crate::services::email_service::{self, EmailSender};

const CONFIRMATION_TOKEN_TTL_HOURS: i64 = 24;
const RESET_TOKEN_TTL_HOURS: i64 = 1;
const DEFAULT_PORTFOLIO_NAME: &str = "My First Portfolio";
const DEFAULT_PORTFOLIO_DESCRIPTION: &str = "Default portfolio created upon email confirmation.";
const RESET_REQUESTED_MESSAGE: &str =
    "If an account with this email exists, a password reset link has been sent.";

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), AppError> {
    let len = value.trim().chars().count();
    if len < min || len > max {
        return Err(AppError::Validation(format!(
            "{} must be between {} and {} characters",
            field, min, max
        )));
    }
    Ok(())
}

pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), AppError> {
    check_length("Password", password, 6, 100)?;
    if password != confirmation {
        return Err(AppError::Validation(
            "The password and confirmation password do not match.".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_registration(input: &RegisterRequest) -> Result<(), AppError> {
    check_length("First name", &input.first_name, 2, 50)?;
    check_length("Last name", &input.last_name, 2, 50)?;
    let email = input.email.trim();
    if email.len() > 100 || !is_valid_email(email) {
        return Err(AppError::Validation("A valid email address is required".to_string()));
    }
    validate_new_password(&input.password, &input.confirm_password)
}

pub fn confirmation_link(frontend_base: &str, user_id: Uuid, token: &str) -> Result<String, AppError> {
    Url::parse_with_params(
        &format!("{}/Auth/ConfirmEmail", frontend_base),
        &[("userId", user_id.to_string()), ("token", token.to_string())],
    )
    .map(String::from)
    .map_err(|e| AppError::Internal(format!("Failed to build confirmation link: {}", e)))
}

pub fn password_reset_link(frontend_base: &str, email: &str, token: &str) -> Result<String, AppError> {
    Url::parse_with_params(
        &format!("{}/Auth/ResetPassword", frontend_base),
        &[("email", email), ("token", token)],
    )
    .map(String::from)
    .map_err(|e| AppError::Internal(format!("Failed to build reset link: {}", e)))
}

pub fn confirm_landing_url(frontend_base: &str, success: bool) -> String {
    format!("{}/auth/confirm-email-landing?isSuccess={}", frontend_base, success)
}

/// A token matches when it equals the stored one and has not expired.
fn token_matches(
    stored: Option<&str>,
    expires_at: Option<chrono::DateTime<Utc>>,
    candidate: &str,
) -> bool {
    match (stored, expires_at) {
        (Some(stored), Some(expires_at)) => stored == candidate && expires_at > Utc::now(),
        _ => false,
    }
}

pub async fn register(
    pool: &PgPool,
    config: &AppConfig,
    mailer: &dyn EmailSender,
    input: RegisterRequest,
) -> Result<MessageResponse, AppError> {
    validate_registration(&input)?;
    let email = input.email.trim().to_string();

    if db::user_queries::email_exists(pool, &email).await? {
        return Err(AppError::Conflict("User with this email already exists.".to_string()));
    }

    let token = auth::generate_url_safe_token();
    let user = User {
        id: Uuid::new_v4(),
        first_name: input.first_name.trim().to_string(),
        last_name: input.last_name.trim().to_string(),
        email,
        password_hash: auth::hash_password(&input.password)?,
        is_email_confirmed: false,
        confirmation_token: Some(token.clone()),
        confirmation_token_expires_at: Some(Utc::now() + Duration::hours(CONFIRMATION_TOKEN_TTL_HOURS)),
        password_reset_token: None,
        password_reset_token_expires_at: None,
        created_at: Utc::now(),
        updated_at: None,
    };
    let user = db::user_queries::insert(pool, &user).await?;
    info!("👤 Registered user {}", user.id);

    let link = confirmation_link(config.frontend_base(), user.id, &token)?;
    email_service::deliver(
        mailer,
        email_service::confirmation_email(&user.email, &user.full_name(), &link),
    )
    .await;

    Ok(MessageResponse::new(
        "Registration successful. Please check your email to confirm your account.",
    ))
}

pub async fn login(pool: &PgPool, jwt: &JwtManager, input: LoginRequest) -> Result<AuthResponse, AppError> {
    let invalid = || AppError::Unauthorized("Invalid email or password.".to_string());

    let user = db::user_queries::fetch_by_email(pool, input.email.trim())
        .await?
        .ok_or_else(invalid)?;
    if !auth::verify_password(&input.password, &user.password_hash)? {
        warn!("Failed login attempt for user {}", user.id);
        return Err(invalid());
    }
    if !user.is_email_confirmed {
        return Err(AppError::Unauthorized(
            "Email not confirmed. Please check your inbox.".to_string(),
        ));
    }

    let (token, expires_at) = jwt.issue(user.id, &user.email)?;
    info!("🔑 User {} logged in", user.id);
    Ok(AuthResponse {
        token,
        expires_at,
        user: UserView::from(&user),
    })
}

/// Confirms the email when the token is valid. Returns whether it succeeded.
pub async fn confirm_email(pool: &PgPool, user_id: Uuid, token: &str) -> Result<bool, AppError> {
    let Some(user) = db::user_queries::fetch_one(pool, user_id).await? else {
        return Ok(false);
    };
    if !token_matches(
        user.confirmation_token.as_deref(),
        user.confirmation_token_expires_at,
        token,
    ) {
        warn!("Invalid or expired confirmation token for user {}", user_id);
        return Ok(false);
    }

    db::user_queries::confirm_email(pool, user.id).await?;

    if db::portfolio_queries::count_for_user(pool, user.id).await? == 0 {
        let portfolio = Portfolio::new(
            user.id,
            DEFAULT_PORTFOLIO_NAME.to_string(),
            Some(DEFAULT_PORTFOLIO_DESCRIPTION.to_string()),
        );
        db::portfolio_queries::insert(pool, &portfolio).await?;
        info!("📁 Created default portfolio for user {}", user.id);
    }

    info!("✅ Email confirmed for user {}", user.id);
    Ok(true)
}

pub async fn request_password_reset(
    pool: &PgPool,
    config: &AppConfig,
    mailer: &dyn EmailSender,
    email: &str,
) -> Result<MessageResponse, AppError> {
    let Some(user) = db::user_queries::fetch_by_email(pool, email.trim()).await? else {
        info!("Password reset requested for unknown email");
        return Ok(MessageResponse::new(RESET_REQUESTED_MESSAGE));
    };

    let token = auth::generate_url_safe_token();
    let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);
    db::user_queries::set_password_reset_token(pool, user.id, &token, expires_at).await?;

    let link = password_reset_link(config.frontend_base(), &user.email, &token)?;
    email_service::deliver(
        mailer,
        email_service::password_reset_email(&user.email, &user.full_name(), &link),
    )
    .await;

    Ok(MessageResponse::new(RESET_REQUESTED_MESSAGE))
}

pub async fn reset_password(pool: &PgPool, input: ResetPasswordRequest) -> Result<MessageResponse, AppError> {
    validate_new_password(&input.new_password, &input.confirm_new_password)?;
    let invalid = || AppError::Validation("Invalid token or email.".to_string());

    let user = db::user_queries::fetch_by_email(pool, input.email.trim())
        .await?
        .ok_or_else(invalid)?;
    if !token_matches(
        user.password_reset_token.as_deref(),
        user.password_reset_token_expires_at,
        &input.token,
    ) {
        return Err(invalid());
    }

    let hash = auth::hash_password(&input.new_password)?;
    db::user_queries::update_password(pool, user.id, &hash).await?;
    info!("🔒 Password reset for user {}", user.id);
    Ok(MessageResponse::new("Your password has been reset successfully."))
}

pub async fn change_password(
    pool: &PgPool,
    user_id: Uuid,
    input: ChangePasswordRequest,
) -> Result<MessageResponse, AppError> {
    validate_new_password(&input.new_password, &input.confirm_new_password)?;

    let user = db::user_queries::fetch_one(pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    if !auth::verify_password(&input.current_password, &user.password_hash)? {
        return Err(AppError::Validation("Invalid current password.".to_string()));
    }

    let hash = auth::hash_password(&input.new_password)?;
    db::user_queries::update_password(pool, user.id, &hash).await?;
    info!("🔒 Password changed for user {}", user.id);
    Ok(MessageResponse::new("Password changed successfully."))
}

pub async fn profile(pool: &PgPool, user_id: Uuid) -> Result<UserView, AppError> {
    let user = db::user_queries::fetch_one(pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(UserView::from(&user))
}

pub fn validate_token(jwt: &JwtManager, token: Option<&str>) -> TokenValidation {
    match token.map(|t| jwt.validate(t)) {
        Some(Ok(claims)) => TokenValidation {
            valid: true,
            user_id: Uuid::parse_str(&claims.sub).ok(),
            email: Some(claims.email),
        },
        _ => TokenValidation {
            valid: false,
            user_id: None,
            email: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    fn registration() -> RegisterRequest {
        RegisterRequest {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@example.com".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
        }
    }

    #[test]
    fn test_valid_registration_passes() {
        assert!(validate_registration(&registration()).is_ok());
    }

    #[test]
    fn test_registration_field_rules() {
        let mut r = registration();
        r.first_name = "J".to_string();
        assert!(validate_registration(&r).is_err());

        let mut r = registration();
        r.last_name = "x".repeat(51);
        assert!(validate_registration(&r).is_err());

        let mut r = registration();
        r.email = "not-an-email".to_string();
        assert!(validate_registration(&r).is_err());

        let mut r = registration();
        r.password = "12345".to_string();
        r.confirm_password = "12345".to_string();
        assert!(validate_registration(&r).is_err());

        let mut r = registration();
        r.confirm_password = "different".to_string();
        assert!(matches!(validate_registration(&r), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("a.b@c.io"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.io"));
        assert!(!is_valid_email("@c.io"));
        assert!(EMAIL_REGEX.is_match("jane@example.com"));
    }

    #[test]
    fn test_links_use_frontend_base() {
        let config = test_config();
        let user_id = Uuid::nil();
        let link = confirmation_link(config.frontend_base(), user_id, "tok-en_1").unwrap();
        assert_eq!(
            link,
            format!("http://localhost:5297/Auth/ConfirmEmail?userId={}&token=tok-en_1", user_id)
        );

        let reset = password_reset_link(config.frontend_base(), "a+b@c.io", "t").unwrap();
        assert_eq!(reset, "http://localhost:5297/Auth/ResetPassword?email=a%2Bb%40c.io&token=t");

        assert_eq!(
            confirm_landing_url(config.frontend_base(), false),
            "http://localhost:5297/auth/confirm-email-landing?isSuccess=false"
        );
    }

    #[test]
    fn test_token_matching() {
        let future = Some(Utc::now() + Duration::hours(1));
        let past = Some(Utc::now() - Duration::seconds(1));
        assert!(token_matches(Some("abc"), future, "abc"));
        assert!(!token_matches(Some("abc"), future, "abd"));
        assert!(!token_matches(Some("abc"), past, "abc"));
        assert!(!token_matches(None, future, "abc"));
        assert!(!token_matches(Some("abc"), None, "abc"));
    }

    #[test]
    fn test_validate_token_reports_claims() {
        let jwt = JwtManager::new(&test_config().jwt);
        let user_id = Uuid::new_v4();
        let (token, _) = jwt.issue(user_id, "jane@example.com").unwrap();

        let ok = validate_token(&jwt, Some(&token));
        assert!(ok.valid);
        assert_eq!(ok.user_id, Some(user_id));
        assert_eq!(ok.email.as_deref(), Some("jane@example.com"));

        assert!(!validate_token(&jwt, Some("garbage")).valid);
        assert!(!validate_token(&jwt, None).valid);
    }
}
