use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Portfolio, UpdatePortfolio};

pub async fn fetch_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Portfolio>, sqlx::Error> {
    sqlx::query_as::<_, Portfolio>(
        "SELECT id, user_id, name, description, created_at, updated_at
         FROM portfolios
         WHERE user_id = $1
         ORDER BY created_at ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Fetches a portfolio only when it belongs to `user_id`.
pub async fn fetch_owned(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<Portfolio>, sqlx::Error> {
    sqlx::query_as::<_, Portfolio>(
        "SELECT id, user_id, name, description, created_at, updated_at
         FROM portfolios
         WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn insert(pool: &PgPool, input: &Portfolio) -> Result<Portfolio, sqlx::Error> {
    sqlx::query_as::<_, Portfolio>(
        "INSERT INTO portfolios (id, user_id, name, description, created_at)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, user_id, name, description, created_at, updated_at",
    )
    .bind(input.id)
    .bind(input.user_id)
    .bind(&input.name)
    .bind(&input.description)
    .bind(input.created_at)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    input: &UpdatePortfolio,
) -> Result<Option<Portfolio>, sqlx::Error> {
    sqlx::query_as::<_, Portfolio>(
        "UPDATE portfolios
         SET name = $1, description = $2, updated_at = NOW()
         WHERE id = $3 AND user_id = $4
         RETURNING id, user_id, name, description, created_at, updated_at",
    )
    .bind(&input.name)
    .bind(&input.description)
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM portfolios WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn count_for_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM portfolios WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
}
