use std::collections::HashMap;

use serde::Serialize;
use sqlx::PgPool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::external::price_provider::PriceSource;
use crate::models::{Asset, AssetType, HeldSymbol, SOURCE_AUTO_UPDATE};
use crate::services::valuation_service;

/// Outcome of one refresh pass over every held (symbol, asset type) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PriceRefreshReport {
    pub pairs_total: usize,
    pub pairs_updated: usize,
    pub pairs_skipped: usize,
    pub pairs_failed: usize,
    pub assets_updated: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Quote {
    Price(f64),
    NoPrice,
    Failed(String),
}

/// Asks the source for every pair in turn. One failing pair does not stop the rest.
pub async fn fetch_quotes(source: &dyn PriceSource, pairs: &[HeldSymbol]) -> Vec<Quote> {
    let mut quotes = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let quote = match source.latest_price(&pair.symbol, pair.asset_type).await {
            Ok(price) if price > 0.0 => Quote::Price(price),
            Ok(_) => Quote::NoPrice,
            Err(e) => Quote::Failed(e.to_string()),
        };
        quotes.push(quote);
    }
    quotes
}

/// Fetches a price for every held pair, appends it to the history and moves
/// the matching assets to it. Each pair is written in its own transaction.
pub async fn refresh_all_prices(
    pool: &PgPool,
    source: &dyn PriceSource,
) -> Result<PriceRefreshReport, AppError> {
    let pairs = db::asset_queries::fetch_held_symbols(pool).await?;
    info!("💰 Refreshing prices for {} held pairs via {}", pairs.len(), source.name());

    let quotes = fetch_quotes(source, &pairs).await;
    let mut report = PriceRefreshReport {
        pairs_total: pairs.len(),
        ..Default::default()
    };

    for (pair, quote) in pairs.iter().zip(quotes) {
        match quote {
            Quote::Price(price) => {
                match db::price_queries::record_and_apply(
                    pool,
                    &pair.symbol,
                    pair.asset_type,
                    price,
                    SOURCE_AUTO_UPDATE,
                )
                .await
                {
                    Ok(updated) => {
                        report.pairs_updated += 1;
                        report.assets_updated += updated;
                        info!("✅ {} ({}) -> {:.4}, {} assets", pair.symbol, pair.asset_type, price, updated);
                    }
                    Err(e) => {
                        report.pairs_failed += 1;
                        error!("❌ Failed to store price for {} ({}): {}", pair.symbol, pair.asset_type, e);
                    }
                }
            }
            Quote::NoPrice => report.pairs_skipped += 1,
            Quote::Failed(reason) => {
                report.pairs_failed += 1;
                warn!(
                    "⚠️ {} could not price {} ({}): {}",
                    source.name(),
                    pair.symbol,
                    pair.asset_type,
                    reason
                );
            }
        }
    }

    info!(
        "Price refresh finished: {} updated, {} skipped, {} failed, {} assets moved",
        report.pairs_updated, report.pairs_skipped, report.pairs_failed, report.assets_updated
    );
    Ok(report)
}

/// Assets whose cached price differs from a positive latest recorded price.
pub fn stale_assets(assets: &[Asset], latest: &HashMap<(String, AssetType), f64>) -> Vec<(Uuid, f64)> {
    assets
        .iter()
        .filter_map(|asset| {
            let price = *latest.get(&(asset.symbol.clone(), asset.asset_type))?;
            (price > 0.0 && price != asset.current_price).then_some((asset.id, price))
        })
        .collect()
}

/// Brings every asset's cached price in line with the price history.
/// Returns the number of assets changed.
pub async fn sync_asset_prices(pool: &PgPool) -> Result<usize, AppError> {
    let assets = db::asset_queries::fetch_all(pool).await?;
    let latest = db::price_queries::fetch_latest_batch(pool, &distinct_symbols(&assets)).await?;

    let stale = stale_assets(&assets, &latest);
    for (id, price) in &stale {
        db::asset_queries::set_current_price(pool, *id, *price).await?;
    }
    info!("Synced cached prices: {} of {} assets changed", stale.len(), assets.len());
    Ok(stale.len())
}

fn distinct_symbols(assets: &[Asset]) -> Vec<String> {
    let mut symbols: Vec<String> = assets.iter().map(|a| a.symbol.clone()).collect();
    symbols.sort();
    symbols.dedup();
    symbols
}

/// Overlays the latest recorded prices onto freshly loaded assets.
pub async fn with_latest_prices(pool: &PgPool, mut assets: Vec<Asset>) -> Result<Vec<Asset>, AppError> {
    if assets.is_empty() {
        return Ok(assets);
    }
    let latest = db::price_queries::fetch_latest_batch(pool, &distinct_symbols(&assets)).await?;
    valuation_service::apply_latest_prices(&mut assets, &latest);
    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::price_provider::PriceProviderError;
    use crate::services::valuation_service::test_support::asset;
    use async_trait::async_trait;

    struct FixedSource;

    #[async_trait]
    impl PriceSource for FixedSource {
        async fn latest_price(
            &self,
            symbol: &str,
            _asset_type: AssetType,
        ) -> Result<f64, PriceProviderError> {
            match symbol {
                "BTC" => Ok(50_000.0),
                "DOWN" => Err(PriceProviderError::Network("timeout".to_string())),
                _ => Ok(0.0),
            }
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn held(symbol: &str, asset_type: AssetType) -> HeldSymbol {
        HeldSymbol {
            symbol: symbol.to_string(),
            asset_type,
        }
    }

    #[tokio::test]
    async fn test_fetch_quotes_keeps_going_after_failure() {
        let pairs = vec![
            held("DOWN", AssetType::CRYPTO),
            held("BTC", AssetType::CRYPTO),
            held("HOUSE", AssetType::REAL_ESTATE),
        ];
        let quotes = fetch_quotes(&FixedSource, &pairs).await;
        assert_eq!(quotes.len(), 3);
        assert_eq!(quotes[0], Quote::Failed("network error: timeout".to_string()));
        assert_eq!(quotes[1], Quote::Price(50_000.0));
        assert_eq!(quotes[2], Quote::NoPrice);
    }

    #[test]
    fn test_stale_assets_only_changed_positive_prices() {
        let btc = asset("BTC", AssetType::CRYPTO, 1.0, 40_000.0, 40_000.0);
        let eth = asset("ETH", AssetType::CRYPTO, 1.0, 3_000.0, 3_000.0);
        let gold = asset("GOLD", AssetType::GOLD, 1.0, 1_900.0, 1_900.0);

        let mut latest = HashMap::new();
        latest.insert(("BTC".to_string(), AssetType::CRYPTO), 45_000.0);
        latest.insert(("ETH".to_string(), AssetType::CRYPTO), 3_000.0);
        latest.insert(("GOLD".to_string(), AssetType::GOLD), 0.0);

        let stale = stale_assets(&[btc.clone(), eth, gold], &latest);
        assert_eq!(stale, vec![(btc.id, 45_000.0)]);
    }

    #[test]
    fn test_stale_assets_matches_type_as_well_as_symbol() {
        let gold_metal = asset("GOLD", AssetType::PRECIOUS_METALS, 1.0, 100.0, 100.0);
        let mut latest = HashMap::new();
        latest.insert(("GOLD".to_string(), AssetType::GOLD), 2_000.0);
        assert!(stale_assets(&[gold_metal], &latest).is_empty());
    }

    #[test]
    fn test_distinct_symbols_dedups() {
        let assets = vec![
            asset("BTC", AssetType::CRYPTO, 1.0, 1.0, 1.0),
            asset("BTC", AssetType::CRYPTO, 2.0, 1.0, 1.0),
            asset("EUR", AssetType::CURRENCY, 2.0, 1.0, 1.0),
        ];
        assert_eq!(distinct_symbols(&assets), vec!["BTC".to_string(), "EUR".to_string()]);
    }
}
