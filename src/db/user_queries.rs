use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{User, UserSummary};

const USER_COLUMNS: &str = "id, first_name, last_name, email, password_hash, is_email_confirmed,
    confirmation_token, confirmation_token_expires_at,
    password_reset_token, password_reset_token_expires_at,
    created_at, updated_at";

pub async fn fetch_one(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
    sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn fetch_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    let sql = format!("SELECT {} FROM users WHERE LOWER(email) = LOWER($1)", USER_COLUMNS);
    sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
        .bind(email)
        .fetch_one(pool)
        .await
}

pub async fn insert(pool: &PgPool, user: &User) -> Result<User, sqlx::Error> {
    let sql = format!(
        "INSERT INTO users (id, first_name, last_name, email, password_hash, is_email_confirmed,
                            confirmation_token, confirmation_token_expires_at, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING {}",
        USER_COLUMNS
    );
    sqlx::query_as::<_, User>(&sql)
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_email_confirmed)
        .bind(&user.confirmation_token)
        .bind(user.confirmation_token_expires_at)
        .bind(user.created_at)
        .fetch_one(pool)
        .await
}

/// Marks the email confirmed and clears the confirmation token.
pub async fn confirm_email(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users
         SET is_email_confirmed = TRUE,
             confirmation_token = NULL,
             confirmation_token_expires_at = NULL,
             updated_at = NOW()
         WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn set_password_reset_token(
    pool: &PgPool,
    id: Uuid,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users
         SET password_reset_token = $2,
             password_reset_token_expires_at = $3,
             updated_at = NOW()
         WHERE id = $1",
    )
    .bind(id)
    .bind(token)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Stores a new password hash and invalidates any outstanding reset token.
pub async fn update_password(pool: &PgPool, id: Uuid, password_hash: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users
         SET password_hash = $2,
             password_reset_token = NULL,
             password_reset_token_expires_at = NULL,
             updated_at = NOW()
         WHERE id = $1",
    )
    .bind(id)
    .bind(password_hash)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn fetch_summaries(pool: &PgPool) -> Result<Vec<UserSummary>, sqlx::Error> {
    sqlx::query_as::<_, UserSummary>(
        "SELECT id, first_name, last_name, email, created_at, is_email_confirmed
         FROM users
         ORDER BY created_at ASC",
    )
    .fetch_all(pool)
    .await
}

pub async fn fetch_summary(pool: &PgPool, id: Uuid) -> Result<Option<UserSummary>, sqlx::Error> {
    sqlx::query_as::<_, UserSummary>(
        "SELECT id, first_name, last_name, email, created_at, is_email_confirmed
         FROM users
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_recent(pool: &PgPool, limit: i64) -> Result<Vec<UserSummary>, sqlx::Error> {
    sqlx::query_as::<_, UserSummary>(
        "SELECT id, first_name, last_name, email, created_at, is_email_confirmed
         FROM users
         ORDER BY created_at DESC
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Deletes the user; portfolios and assets go with it through the cascade.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
