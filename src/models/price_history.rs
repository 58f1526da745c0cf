use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::AssetType;

pub const SOURCE_INITIAL: &str = "Initial";
pub const SOURCE_MANUAL_UPDATE: &str = "Manual Update";
pub const SOURCE_AUTO_UPDATE: &str = "Auto-Update";

/// One observation in the append-only price series of a (symbol, asset type) pair.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PriceRecord {
    pub id: Uuid,
    pub symbol: String,
    pub asset_type: AssetType,
    pub price: f64,
    pub recorded_at: DateTime<Utc>,
    pub source: Option<String>,
}

/// Price point as served by the asset price-history endpoint.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Distinct (symbol, type) pair currently held by at least one asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, FromRow)]
pub struct HeldSymbol {
    pub symbol: String,
    pub asset_type: AssetType,
}
