use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::asset_type::BuiltinAssetTypeInfo;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CustomAssetType {
    pub id: i32,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCustomAssetType {
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCustomAssetType {
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct AssetTypeCatalogue {
    pub built_in_types: Vec<BuiltinAssetTypeInfo>,
    pub custom_types: Vec<CustomAssetType>,
}
