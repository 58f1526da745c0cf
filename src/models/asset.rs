use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::AssetType;

/// A holding inside a portfolio. `current_price` is the cached latest price.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Asset {
    pub id: Uuid,
    pub portfolio_id: Uuid,
    pub name: String,
    pub symbol: String,
    pub asset_type: AssetType,
    pub quantity: f64,
    pub purchase_price: f64,
    pub current_price: f64,
    pub purchase_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Asset {
    pub fn total_value(&self) -> f64 {
        self.quantity * self.current_price
    }

    pub fn total_investment(&self) -> f64 {
        self.quantity * self.purchase_price
    }

    pub fn profit_loss(&self) -> f64 {
        self.total_value() - self.total_investment()
    }

    pub fn profit_loss_percentage(&self) -> f64 {
        if self.purchase_price > 0.0 {
            (self.current_price - self.purchase_price) / self.purchase_price * 100.0
        } else {
            0.0
        }
    }
}

/// Asset with its derived valuation figures, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct AssetView {
    pub id: Uuid,
    pub portfolio_id: Uuid,
    pub name: String,
    pub symbol: String,
    pub asset_type: AssetType,
    pub type_name: String,
    pub quantity: f64,
    pub purchase_price: f64,
    pub current_price: f64,
    pub purchase_date: DateTime<Utc>,
    pub total_value: f64,
    pub profit_loss: f64,
    pub profit_loss_percentage: f64,
}

impl From<&Asset> for AssetView {
    fn from(asset: &Asset) -> Self {
        Self {
            id: asset.id,
            portfolio_id: asset.portfolio_id,
            name: asset.name.clone(),
            symbol: asset.symbol.clone(),
            asset_type: asset.asset_type,
            type_name: asset.asset_type.name(),
            quantity: asset.quantity,
            purchase_price: asset.purchase_price,
            current_price: asset.current_price,
            purchase_date: asset.purchase_date,
            total_value: asset.total_value(),
            profit_loss: asset.profit_loss(),
            profit_loss_percentage: asset.profit_loss_percentage(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAsset {
    pub portfolio_id: Uuid,
    pub name: String,
    pub symbol: String,
    pub asset_type: i32,
    pub quantity: f64,
    pub purchase_price: f64,
    pub current_price: f64,
    pub purchase_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAsset {
    pub name: String,
    pub symbol: String,
    pub asset_type: i32,
    pub quantity: f64,
    pub purchase_price: f64,
    pub current_price: f64,
    pub purchase_date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn asset(quantity: f64, purchase: f64, current: f64) -> Asset {
        Asset {
            id: Uuid::new_v4(),
            portfolio_id: Uuid::new_v4(),
            name: "Bitcoin".to_string(),
            symbol: "BTC".to_string(),
            asset_type: AssetType::CRYPTO,
            quantity,
            purchase_price: purchase,
            current_price: current,
            purchase_date: Utc::now(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_view_derives_valuation() {
        let view = AssetView::from(&asset(2.0, 100.0, 150.0));
        assert_eq!(view.total_value, 300.0);
        assert_eq!(view.profit_loss, 100.0);
        assert_eq!(view.profit_loss_percentage, 50.0);
        assert_eq!(view.type_name, "Crypto");
    }

    #[test]
    fn test_zero_purchase_price_gives_zero_percentage() {
        let a = asset(1.0, 0.0, 10.0);
        assert_eq!(a.profit_loss_percentage(), 0.0);
        assert_eq!(a.profit_loss(), 10.0);
    }
}
