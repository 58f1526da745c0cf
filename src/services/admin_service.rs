use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::asset_type::builtin_catalogue;
use crate::models::{
    ActivityType, AdminDashboard, AssetAddition, AssetType, AssetTypeCatalogue,
    CreateCustomAssetType, CustomAssetType, JobRun, Portfolio, PortfolioStats,
    UpdateCustomAssetType, UserActivity, UserSummary,
};

const RECENT_USERS: i64 = 5;
const MAX_TYPE_NAME_LEN: usize = 50;
const MAX_TYPE_DESCRIPTION_LEN: usize = 200;
pub const DEFAULT_JOB_RUNS_LIMIT: i64 = 50;

fn user_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("User with ID {} not found.", id))
}

fn custom_type_not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Custom asset type with ID {} not found.", id))
}

pub async fn list_users(pool: &PgPool) -> Result<Vec<UserSummary>, AppError> {
    Ok(db::user_queries::fetch_summaries(pool).await?)
}

pub async fn get_user(pool: &PgPool, id: Uuid) -> Result<UserSummary, AppError> {
    db::user_queries::fetch_summary(pool, id)
        .await?
        .ok_or_else(|| user_not_found(id))
}

pub async fn user_portfolios(pool: &PgPool, id: Uuid) -> Result<Vec<PortfolioStats>, AppError> {
    Ok(db::admin_queries::fetch_portfolio_stats(pool, id).await?)
}

/// Registration, portfolio creations and asset additions, newest first.
pub fn activity_feed(
    user: &UserSummary,
    portfolios: &[Portfolio],
    additions: &[AssetAddition],
) -> Vec<UserActivity> {
    let mut feed = vec![UserActivity {
        activity_type: ActivityType::UserRegistration,
        id: user.id,
        name: format!("{} {}", user.first_name, user.last_name),
        created_at: user.created_at,
        description: format!("User registered with email: {}", user.email),
        portfolio_id: None,
        portfolio_name: None,
    }];

    feed.extend(portfolios.iter().map(|p| UserActivity {
        activity_type: ActivityType::PortfolioCreation,
        id: p.id,
        name: p.name.clone(),
        created_at: p.created_at,
        description: format!("Created portfolio: {}", p.name),
        portfolio_id: None,
        portfolio_name: None,
    }));

    feed.extend(additions.iter().map(|a| UserActivity {
        activity_type: ActivityType::AssetAddition,
        id: a.id,
        name: a.name.clone(),
        created_at: a.created_at,
        description: format!("Added asset: {} to portfolio: {}", a.name, a.portfolio_name),
        portfolio_id: Some(a.portfolio_id),
        portfolio_name: Some(a.portfolio_name.clone()),
    }));

    feed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    feed
}

pub async fn user_activities(pool: &PgPool, id: Uuid) -> Result<Vec<UserActivity>, AppError> {
    let user = get_user(pool, id).await?;
    let portfolios = db::portfolio_queries::fetch_for_user(pool, id).await?;
    let additions = db::admin_queries::fetch_asset_additions(pool, id).await?;
    Ok(activity_feed(&user, &portfolios, &additions))
}

pub async fn delete_user(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    match db::user_queries::delete(pool, id).await? {
        0 => Err(user_not_found(id)),
        _ => {
            info!("🗑️ Deleted user {} with their portfolios and assets", id);
            Ok(())
        }
    }
}

pub async fn dashboard(pool: &PgPool) -> Result<AdminDashboard, AppError> {
    Ok(AdminDashboard {
        total_users: db::admin_queries::count_users(pool).await?,
        total_portfolios: db::admin_queries::count_portfolios(pool).await?,
        total_assets: db::admin_queries::count_assets(pool).await?,
        total_value: db::admin_queries::total_asset_value(pool).await?,
        recent_users: db::user_queries::fetch_recent(pool, RECENT_USERS).await?,
    })
}

/// Built-in types plus every custom type, active or not.
pub async fn asset_types(pool: &PgPool) -> Result<AssetTypeCatalogue, AppError> {
    Ok(AssetTypeCatalogue {
        built_in_types: builtin_catalogue(),
        custom_types: db::custom_asset_type_queries::fetch_all(pool).await?,
    })
}

pub async fn get_custom_type(pool: &PgPool, id: i32) -> Result<CustomAssetType, AppError> {
    db::custom_asset_type_queries::fetch_one(pool, id)
        .await?
        .ok_or_else(|| custom_type_not_found(id))
}

/// Trims and checks the custom type fields, returning (name, display name, description).
pub fn validate_custom_type(
    name: &str,
    display_name: &str,
    description: Option<&str>,
) -> Result<(String, String, Option<String>), AppError> {
    let name = name.trim();
    let display_name = display_name.trim();
    if name.is_empty() || display_name.is_empty() {
        return Err(AppError::Validation("Name and display name are required".into()));
    }
    if name.chars().count() > MAX_TYPE_NAME_LEN || display_name.chars().count() > MAX_TYPE_NAME_LEN {
        return Err(AppError::Validation(format!(
            "Name and display name cannot exceed {} characters",
            MAX_TYPE_NAME_LEN
        )));
    }
    let description = description.map(str::trim).filter(|d| !d.is_empty());
    if description.is_some_and(|d| d.chars().count() > MAX_TYPE_DESCRIPTION_LEN) {
        return Err(AppError::Validation(format!(
            "Description cannot exceed {} characters",
            MAX_TYPE_DESCRIPTION_LEN
        )));
    }
    Ok((name.to_string(), display_name.to_string(), description.map(str::to_string)))
}

pub async fn create_custom_type(
    pool: &PgPool,
    input: CreateCustomAssetType,
) -> Result<CustomAssetType, AppError> {
    let (name, display_name, description) =
        validate_custom_type(&input.name, &input.display_name, input.description.as_deref())?;
    if db::custom_asset_type_queries::name_taken(pool, &name, None).await? {
        return Err(AppError::Conflict(format!(
            "An asset type with the name '{}' already exists.",
            name
        )));
    }
    let created = db::custom_asset_type_queries::insert(
        pool,
        &CreateCustomAssetType {
            name,
            display_name,
            description,
            is_active: input.is_active,
        },
    )
    .await?;
    info!(
        "Created custom asset type {} '{}' (asset code {})",
        created.id,
        created.name,
        AssetType::Custom(created.id).code()
    );
    Ok(created)
}

pub async fn update_custom_type(
    pool: &PgPool,
    id: i32,
    input: UpdateCustomAssetType,
) -> Result<CustomAssetType, AppError> {
    if !db::custom_asset_type_queries::exists(pool, id).await? {
        return Err(custom_type_not_found(id));
    }
    let (name, display_name, description) =
        validate_custom_type(&input.name, &input.display_name, input.description.as_deref())?;
    if db::custom_asset_type_queries::name_taken(pool, &name, Some(id)).await? {
        return Err(AppError::Conflict(format!(
            "Another asset type with the name '{}' already exists.",
            name
        )));
    }
    let changes = UpdateCustomAssetType {
        name,
        display_name,
        description,
        is_active: input.is_active,
    };
    db::custom_asset_type_queries::update(pool, id, &changes)
        .await?
        .ok_or_else(|| custom_type_not_found(id))
}

pub async fn delete_custom_type(pool: &PgPool, id: i32) -> Result<(), AppError> {
    if !db::custom_asset_type_queries::exists(pool, id).await? {
        return Err(custom_type_not_found(id));
    }
    let code = AssetType::Custom(id).code();
    let in_use = db::asset_queries::count_with_type_code(pool, code).await?;
    if in_use > 0 {
        warn!("Refusing to delete custom asset type {}: {} assets use code {}", id, in_use, code);
        return Err(AppError::Validation(
            "This asset type is in use and cannot be deleted.".into(),
        ));
    }
    db::custom_asset_type_queries::delete(pool, id).await?;
    info!("Deleted custom asset type {}", id);
    Ok(())
}

pub async fn job_runs(pool: &PgPool, limit: i64) -> Result<Vec<JobRun>, AppError> {
    Ok(db::job_run_queries::fetch_recent(pool, limit.clamp(1, 500)).await?)
}
