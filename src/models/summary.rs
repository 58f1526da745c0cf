use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{AssetType, AssetView};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AssetTypeDistribution {
    pub asset_type: AssetType,
    pub asset_type_name: String,
    pub value: f64,
    pub percentage: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioSummary {
    pub portfolio_id: Uuid,
    pub name: String,
    pub total_value: f64,
    pub total_investment: f64,
    pub total_profit_loss: f64,
    pub total_profit_loss_percentage: f64,
    pub asset_count: usize,
    pub asset_type_distribution: Vec<AssetTypeDistribution>,
    pub top_performing_assets: Vec<AssetView>,
}

/// Portfolio with its valued assets, as returned by the portfolio endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub assets: Vec<AssetView>,
    pub total_value: f64,
    pub total_investment: f64,
    pub total_profit_loss: f64,
    pub total_profit_loss_percentage: f64,
    pub asset_type_distribution: Vec<AssetTypeDistribution>,
    pub is_profit: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardOverview {
    pub portfolio_count: usize,
    pub total_value: f64,
    pub total_investment: f64,
    pub total_profit_loss: f64,
    pub total_profit_loss_percentage: f64,
    pub asset_type_distribution: Vec<AssetTypeDistribution>,
    pub top_performing_assets: Vec<AssetView>,
    pub portfolio_summaries: Vec<PortfolioSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Performance {
    pub best_performers: Vec<AssetView>,
    pub worst_performers: Vec<AssetView>,
    pub recent_purchases: Vec<AssetView>,
}
