use async_trait::async_trait;
use thiserror::Error;

use crate::models::AssetType;

#[derive(Debug, Error)]
pub enum PriceProviderError {
    #[error("network error: {0}")]
    Network(String),
}

/// Source of the latest market price for a (symbol, asset type) pair.
///
/// A price of `0.0` means the source has no quote for the pair; callers skip it.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn latest_price(
        &self,
        symbol: &str,
        asset_type: AssetType,
    ) -> Result<f64, PriceProviderError>;

    fn name(&self) -> &'static str;
}
