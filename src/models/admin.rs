use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::UserSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActivityType {
    UserRegistration,
    PortfolioCreation,
    AssetAddition,
}

/// One entry of a user's activity feed.
#[derive(Debug, Clone, Serialize)]
pub struct UserActivity {
    pub activity_type: ActivityType,
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio_name: Option<String>,
}

/// Asset row joined with its portfolio name, used to build the activity feed.
#[derive(Debug, Clone, FromRow)]
pub struct AssetAddition {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub portfolio_id: Uuid,
    pub portfolio_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub total_users: i64,
    pub total_portfolios: i64,
    pub total_assets: i64,
    pub total_value: f64,
    pub recent_users: Vec<UserSummary>,
}
