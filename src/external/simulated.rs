use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::external::price_provider::{PriceProviderError, PriceSource};
use crate::models::{AssetType, BuiltinAssetType};

/// Mock market feed: fixed reference prices with uniform jitter.
pub struct SimulatedPriceSource {
    latency: Duration,
}

impl SimulatedPriceSource {
    pub fn new() -> Self {
        Self {
            latency: Duration::from_millis(100),
        }
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for SimulatedPriceSource {
    fn default() -> Self {
        Self::new()
    }
}

fn jitter(base: f64, spread: f64) -> f64 {
    base + rand::rng().random_range(-spread..=spread)
}

/// Simulated quote; `0.0` for asset types without a feed. Symbols match
/// exactly, so "eth" gets the crypto default rather than the ETH band.
pub fn simulated_price(symbol: &str, asset_type: AssetType) -> f64 {
    let AssetType::Builtin(builtin) = asset_type else {
        return 0.0;
    };

    match builtin {
        BuiltinAssetType::Currency => match symbol {
            "USD" => 1.0,
            "EUR" => jitter(0.85, 0.05),
            "GBP" => jitter(0.75, 0.05),
            "JPY" => jitter(150.0, 10.0),
            _ => 1.0,
        },
        BuiltinAssetType::Crypto => match symbol {
            "BTC" => jitter(45_000.0, 5_000.0),
            "ETH" => jitter(3_000.0, 500.0),
            "ADA" => jitter(0.5, 0.2),
            "DOT" => jitter(6.0, 2.0),
            _ => 1.0,
        },
        BuiltinAssetType::Gold => jitter(2_000.0, 100.0),
        BuiltinAssetType::Silver => jitter(25.0, 5.0),
        BuiltinAssetType::PreciousMetals => match symbol {
            "PLATINUM" => jitter(1_000.0, 100.0),
            "PALLADIUM" => jitter(2_000.0, 200.0),
            _ => 100.0,
        },
        _ => 0.0,
    }
}

#[async_trait]
impl PriceSource for SimulatedPriceSource {
    async fn latest_price(
        &self,
        symbol: &str,
        asset_type: AssetType,
    ) -> Result<f64, PriceProviderError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(simulated_price(symbol, asset_type))
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prices_stay_within_bands() {
        for _ in 0..200 {
            let eur = simulated_price("EUR", AssetType::CURRENCY);
            assert!((0.80..=0.90).contains(&eur));
            let btc = simulated_price("BTC", AssetType::CRYPTO);
            assert!((40_000.0..=50_000.0).contains(&btc));
            let gold = simulated_price("GOLD", AssetType::GOLD);
            assert!((1_900.0..=2_100.0).contains(&gold));
            let silver = simulated_price("XAG", AssetType::SILVER);
            assert!((20.0..=30.0).contains(&silver));
            let palladium = simulated_price("PALLADIUM", AssetType::PRECIOUS_METALS);
            assert!((1_800.0..=2_200.0).contains(&palladium));
        }
    }

    #[test]
    fn test_fixed_prices() {
        assert_eq!(simulated_price("USD", AssetType::CURRENCY), 1.0);
        assert_eq!(simulated_price("CHF", AssetType::CURRENCY), 1.0);
        assert_eq!(simulated_price("DOGE", AssetType::CRYPTO), 1.0);
        assert_eq!(simulated_price("RHODIUM", AssetType::PRECIOUS_METALS), 100.0);
    }

    #[test]
    fn test_unpriced_types_return_zero() {
        assert_eq!(simulated_price("AAPL", AssetType::STOCK), 0.0);
        assert_eq!(simulated_price("HOUSE", AssetType::REAL_ESTATE), 0.0);
        assert_eq!(simulated_price("ART", AssetType::Custom(1)), 0.0);
    }

    #[tokio::test]
    async fn test_source_returns_quote() {
        let source = SimulatedPriceSource::with_latency(Duration::ZERO);
        let price = source.latest_price("ETH", AssetType::CRYPTO).await.unwrap();
        assert!((2_500.0..=3_500.0).contains(&price));
    }

    #[test]
    fn test_symbols_are_case_sensitive() {
        assert_eq!(simulated_price("eth", AssetType::CRYPTO), 1.0);
        assert_eq!(simulated_price("eur", AssetType::CURRENCY), 1.0);
        assert_eq!(simulated_price("platinum", AssetType::PRECIOUS_METALS), 100.0);
    }
}
