use sqlx::PgPool;

use crate::models::{CreateCustomAssetType, CustomAssetType, UpdateCustomAssetType};

pub async fn fetch_all(pool: &PgPool) -> Result<Vec<CustomAssetType>, sqlx::Error> {
    sqlx::query_as::<_, CustomAssetType>(
        "SELECT id, name, display_name, description, is_active, created_at, updated_at
         FROM custom_asset_types
         ORDER BY id ASC",
    )
    .fetch_all(pool)
    .await
}

pub async fn fetch_active(pool: &PgPool) -> Result<Vec<CustomAssetType>, sqlx::Error> {
    sqlx::query_as::<_, CustomAssetType>(
        "SELECT id, name, display_name, description, is_active, created_at, updated_at
         FROM custom_asset_types
         WHERE is_active = TRUE
         ORDER BY id ASC",
    )
    .fetch_all(pool)
    .await
}

pub async fn fetch_one(pool: &PgPool, id: i32) -> Result<Option<CustomAssetType>, sqlx::Error> {
    sqlx::query_as::<_, CustomAssetType>(
        "SELECT id, name, display_name, description, is_active, created_at, updated_at
         FROM custom_asset_types
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn exists(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM custom_asset_types WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
}

/// True when another type (other than `exclude_id`) already uses `name`.
pub async fn name_taken(pool: &PgPool, name: &str, exclude_id: Option<i32>) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(
             SELECT 1 FROM custom_asset_types
             WHERE name = $1 AND ($2::INTEGER IS NULL OR id <> $2)
         )",
    )
    .bind(name)
    .bind(exclude_id)
    .fetch_one(pool)
    .await
}

pub async fn insert(pool: &PgPool, input: &CreateCustomAssetType) -> Result<CustomAssetType, sqlx::Error> {
    sqlx::query_as::<_, CustomAssetType>(
        "INSERT INTO custom_asset_types (name, display_name, description, is_active, created_at)
         VALUES ($1, $2, $3, $4, NOW())
         RETURNING id, name, display_name, description, is_active, created_at, updated_at",
    )
    .bind(&input.name)
    .bind(&input.display_name)
    .bind(&input.description)
    .bind(input.is_active)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: i32,
    input: &UpdateCustomAssetType,
) -> Result<Option<CustomAssetType>, sqlx::Error> {
    sqlx::query_as::<_, CustomAssetType>(
        "UPDATE custom_asset_types
         SET name = $2, display_name = $3, description = $4, is_active = $5, updated_at = NOW()
         WHERE id = $1
         RETURNING id, name, display_name, description, is_active, created_at, updated_at",
    )
    .bind(id)
    .bind(&input.name)
    .bind(&input.display_name)
    .bind(&input.description)
    .bind(input.is_active)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i32) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM custom_asset_types WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
