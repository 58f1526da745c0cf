//! Portfolio valuation: totals, profit/loss, asset type distribution and
//! top performers, computed from assets whose cached prices have been
//! refreshed against the price history.

use std::collections::HashMap;

use crate::models::{
    Asset, AssetType, AssetTypeDistribution, AssetView, DashboardOverview, Performance, Portfolio,
    PortfolioSummary, PortfolioView,
};

pub const TOP_PERFORMERS_PER_PORTFOLIO: usize = 5;
pub const TOP_PERFORMERS_OVERALL: usize = 10;
pub const OVERVIEW_SUMMARY_LIMIT: usize = 5;
pub const PERFORMANCE_LIST_LEN: usize = 10;

/// Replaces each asset's cached price with the latest recorded price for its
/// (symbol, type) pair, when one exists and is positive.
pub fn apply_latest_prices(assets: &mut [Asset], latest: &HashMap<(String, AssetType), f64>) {
    for asset in assets.iter_mut() {
        if let Some(price) = latest.get(&(asset.symbol.clone(), asset.asset_type)) {
            if *price > 0.0 {
                asset.current_price = *price;
            }
        }
    }
}

fn percentage_of(value: f64, total: f64) -> f64 {
    if total > 0.0 {
        value / total * 100.0
    } else {
        0.0
    }
}

fn sort_distribution(mut entries: Vec<AssetTypeDistribution>) -> Vec<AssetTypeDistribution> {
    entries.sort_by(|a, b| b.value.total_cmp(&a.value));
    entries
}

/// Per-type (value, count), kept in the order each type first appears so
/// equal shares stay in that order after the stable sort.
#[derive(Default)]
struct TypeGroups(Vec<(AssetType, f64, usize)>);

impl TypeGroups {
    fn add(&mut self, asset_type: AssetType, value: f64, count: usize) {
        match self.0.iter_mut().find(|(t, _, _)| *t == asset_type) {
            Some(group) => {
                group.1 += value;
                group.2 += count;
            }
            None => self.0.push((asset_type, value, count)),
        }
    }
}

fn build_distribution(groups: TypeGroups) -> Vec<AssetTypeDistribution> {
    let total: f64 = groups.0.iter().map(|(_, value, _)| value).sum();
    let entries = groups
        .0
        .into_iter()
        .map(|(asset_type, value, count)| AssetTypeDistribution {
            asset_type,
            asset_type_name: asset_type.name(),
            value,
            percentage: percentage_of(value, total),
            count,
        })
        .collect();
    sort_distribution(entries)
}

/// Groups assets by type, largest value first.
pub fn distribution(assets: &[Asset]) -> Vec<AssetTypeDistribution> {
    let mut groups = TypeGroups::default();
    for asset in assets {
        groups.add(asset.asset_type, asset.total_value(), 1);
    }
    build_distribution(groups)
}

fn by_profit_pct_desc(views: &mut [AssetView]) {
    views.sort_by(|a, b| b.profit_loss_percentage.total_cmp(&a.profit_loss_percentage));
}

struct Totals {
    value: f64,
    investment: f64,
    profit_loss: f64,
    profit_loss_percentage: f64,
}

fn totals(assets: &[Asset]) -> Totals {
    let value: f64 = assets.iter().map(Asset::total_value).sum();
    let investment: f64 = assets.iter().map(Asset::total_investment).sum();
    let profit_loss = value - investment;
    Totals {
        value,
        investment,
        profit_loss,
        profit_loss_percentage: percentage_of(profit_loss, investment),
    }
}

pub fn summarize(portfolio: &Portfolio, assets: &[Asset]) -> PortfolioSummary {
    let totals = totals(assets);
    let mut views: Vec<AssetView> = assets.iter().map(AssetView::from).collect();
    by_profit_pct_desc(&mut views);
    views.truncate(TOP_PERFORMERS_PER_PORTFOLIO);

    PortfolioSummary {
        portfolio_id: portfolio.id,
        name: portfolio.name.clone(),
        total_value: totals.value,
        total_investment: totals.investment,
        total_profit_loss: totals.profit_loss,
        total_profit_loss_percentage: totals.profit_loss_percentage,
        asset_count: assets.len(),
        asset_type_distribution: distribution(assets),
        top_performing_assets: views,
    }
}

pub fn portfolio_view(portfolio: &Portfolio, assets: &[Asset]) -> PortfolioView {
    let totals = totals(assets);
    PortfolioView {
        id: portfolio.id,
        user_id: portfolio.user_id,
        name: portfolio.name.clone(),
        description: portfolio.description.clone(),
        created_at: portfolio.created_at,
        assets: assets.iter().map(AssetView::from).collect(),
        total_value: totals.value,
        total_investment: totals.investment,
        total_profit_loss: totals.profit_loss,
        total_profit_loss_percentage: totals.profit_loss_percentage,
        asset_type_distribution: distribution(assets),
        is_profit: totals.profit_loss >= 0.0,
    }
}

/// Combines per-portfolio summaries into the user's dashboard.
pub fn overview(summaries: Vec<PortfolioSummary>, portfolio_count: usize) -> DashboardOverview {
    let total_value: f64 = summaries.iter().map(|s| s.total_value).sum();
    let total_investment: f64 = summaries.iter().map(|s| s.total_investment).sum();
    let total_profit_loss = total_value - total_investment;

    let mut groups = TypeGroups::default();
    for entry in summaries.iter().flat_map(|s| s.asset_type_distribution.iter()) {
        groups.add(entry.asset_type, entry.value, entry.count);
    }

    let mut top: Vec<AssetView> = summaries
        .iter()
        .flat_map(|s| s.top_performing_assets.iter().cloned())
        .collect();
    by_profit_pct_desc(&mut top);
    top.truncate(TOP_PERFORMERS_OVERALL);

    DashboardOverview {
        portfolio_count,
        total_value,
        total_investment,
        total_profit_loss,
        total_profit_loss_percentage: percentage_of(total_profit_loss, total_investment),
        asset_type_distribution: build_distribution(groups),
        top_performing_assets: top,
        portfolio_summaries: summaries.into_iter().take(OVERVIEW_SUMMARY_LIMIT).collect(),
    }
}

pub fn performance(assets: &[Asset]) -> Performance {
    let views: Vec<AssetView> = assets.iter().map(AssetView::from).collect();

    let mut best = views.clone();
    by_profit_pct_desc(&mut best);
    best.truncate(PERFORMANCE_LIST_LEN);

    let mut worst = views.clone();
    worst.sort_by(|a, b| a.profit_loss_percentage.total_cmp(&b.profit_loss_percentage));
    worst.truncate(PERFORMANCE_LIST_LEN);

    let mut recent = views;
    recent.sort_by(|a, b| b.purchase_date.cmp(&a.purchase_date));
    recent.truncate(PERFORMANCE_LIST_LEN);

    Performance {
        best_performers: best,
        worst_performers: worst,
        recent_purchases: recent,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use crate::models::{Asset, AssetType, Portfolio};

    pub fn portfolio(name: &str) -> Portfolio {
        Portfolio::new(Uuid::new_v4(), name.to_string(), None)
    }

    pub fn asset(
        symbol: &str,
        asset_type: AssetType,
        quantity: f64,
        purchase_price: f64,
        current_price: f64,
    ) -> Asset {
        Asset {
            id: Uuid::new_v4(),
            portfolio_id: Uuid::new_v4(),
            name: symbol.to_string(),
            symbol: symbol.to_string(),
            asset_type,
            quantity,
            purchase_price,
            current_price,
            purchase_date: Utc::now(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn asset_bought_days_ago(symbol: &str, days: i64) -> Asset {
        let mut a = asset(symbol, AssetType::STOCK, 1.0, 10.0, 10.0);
        a.purchase_date = Utc::now() - Duration::days(days);
        a
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_apply_latest_prices_skips_missing_and_non_positive() {
        let mut assets = vec![
            asset("BTC", AssetType::CRYPTO, 1.0, 100.0, 100.0),
            asset("ETH", AssetType::CRYPTO, 1.0, 100.0, 100.0),
            asset("GOLD", AssetType::GOLD, 1.0, 100.0, 100.0),
        ];
        let mut latest = HashMap::new();
        latest.insert(("BTC".to_string(), AssetType::CRYPTO), 150.0);
        latest.insert(("ETH".to_string(), AssetType::CRYPTO), 0.0);
        // same symbol, different type: must not match
        latest.insert(("GOLD".to_string(), AssetType::CURRENCY), 999.0);

        apply_latest_prices(&mut assets, &latest);

        assert_eq!(assets[0].current_price, 150.0);
        assert_eq!(assets[1].current_price, 100.0);
        assert_eq!(assets[2].current_price, 100.0);
    }

    #[test]
    fn test_distribution_groups_and_orders_by_value() {
        let assets = vec![
            asset("BTC", AssetType::CRYPTO, 1.0, 10.0, 300.0),
            asset("ETH", AssetType::CRYPTO, 1.0, 10.0, 100.0),
            asset("GOLD", AssetType::GOLD, 1.0, 10.0, 600.0),
        ];
        let dist = distribution(&assets);

        assert_eq!(dist.len(), 2);
        assert_eq!(dist[0].asset_type, AssetType::GOLD);
        assert!(approx(dist[0].value, 600.0));
        assert!(approx(dist[0].percentage, 60.0));
        assert_eq!(dist[0].count, 1);
        assert_eq!(dist[1].asset_type, AssetType::CRYPTO);
        assert!(approx(dist[1].percentage, 40.0));
        assert_eq!(dist[1].count, 2);
        assert_eq!(dist[1].asset_type_name, "Crypto");
    }

    #[test]
    fn test_distribution_ties_keep_first_seen_order() {
        let assets = vec![
            asset("BTC", AssetType::CRYPTO, 1.0, 10.0, 500.0),
            asset("EUR", AssetType::CURRENCY, 1.0, 10.0, 100.0),
            asset("GOLD", AssetType::GOLD, 1.0, 10.0, 500.0),
        ];
        let dist = distribution(&assets);
        let order: Vec<AssetType> = dist.iter().map(|d| d.asset_type).collect();
        assert_eq!(order, vec![AssetType::CRYPTO, AssetType::GOLD, AssetType::CURRENCY]);
    }

    #[test]
    fn test_distribution_with_zero_value_has_zero_percentages() {
        let assets = vec![asset("X", AssetType::Custom(1), 0.0, 10.0, 10.0)];
        let dist = distribution(&assets);
        assert_eq!(dist.len(), 1);
        assert_eq!(dist[0].percentage, 0.0);
    }

    #[test]
    fn test_summarize_empty_portfolio() {
        let summary = summarize(&portfolio("Empty"), &[]);
        assert_eq!(summary.total_value, 0.0);
        assert_eq!(summary.total_investment, 0.0);
        assert_eq!(summary.total_profit_loss_percentage, 0.0);
        assert_eq!(summary.asset_count, 0);
        assert!(summary.asset_type_distribution.is_empty());
        assert!(summary.top_performing_assets.is_empty());
    }

    #[test]
    fn test_summarize_totals_and_top_five() {
        let assets: Vec<Asset> = (1..=7)
            .map(|i| {
                let current = 100.0 + i as f64 * 10.0;
                asset(&format!("S{}", i), AssetType::STOCK, 1.0, 100.0, current)
            })
            .collect();
        let summary = summarize(&portfolio("Stocks"), &assets);

        assert!(approx(summary.total_investment, 700.0));
        assert!(approx(summary.total_value, 700.0 + 280.0));
        assert!(approx(summary.total_profit_loss, 280.0));
        assert!(approx(summary.total_profit_loss_percentage, 40.0));
        assert_eq!(summary.asset_count, 7);
        assert_eq!(summary.top_performing_assets.len(), 5);
        assert_eq!(summary.top_performing_assets[0].symbol, "S7");
        assert_eq!(summary.top_performing_assets[4].symbol, "S3");
    }

    #[test]
    fn test_portfolio_view_flags_loss() {
        let p = portfolio("Losing");
        let view = portfolio_view(&p, &[asset("BTC", AssetType::CRYPTO, 2.0, 100.0, 50.0)]);
        assert!(!view.is_profit);
        assert!(approx(view.total_profit_loss, -100.0));
        assert_eq!(view.assets.len(), 1);

        let empty = portfolio_view(&p, &[]);
        assert!(empty.is_profit);
    }

    #[test]
    fn test_overview_merges_distributions() {
        let a = summarize(
            &portfolio("A"),
            &[
                asset("BTC", AssetType::CRYPTO, 1.0, 50.0, 100.0),
                asset("GOLD", AssetType::GOLD, 1.0, 100.0, 100.0),
            ],
        );
        let b = summarize(&portfolio("B"), &[asset("ETH", AssetType::CRYPTO, 1.0, 200.0, 200.0)]);

        let overview = overview(vec![a, b], 2);

        assert_eq!(overview.portfolio_count, 2);
        assert!(approx(overview.total_value, 400.0));
        assert!(approx(overview.total_investment, 350.0));
        assert!(approx(overview.total_profit_loss, 50.0));
        assert_eq!(overview.asset_type_distribution.len(), 2);
        let crypto = &overview.asset_type_distribution[0];
        assert_eq!(crypto.asset_type, AssetType::CRYPTO);
        assert!(approx(crypto.value, 300.0));
        assert!(approx(crypto.percentage, 75.0));
        assert_eq!(crypto.count, 2);
        assert_eq!(overview.top_performing_assets[0].symbol, "BTC");
        assert_eq!(overview.portfolio_summaries.len(), 2);
    }

    #[test]
    fn test_overview_keeps_first_five_summaries() {
        let summaries = (0..7).map(|i| summarize(&portfolio(&format!("P{}", i)), &[])).collect();
        let overview = overview(summaries, 7);
        assert_eq!(overview.portfolio_count, 7);
        assert_eq!(overview.portfolio_summaries.len(), 5);
        assert_eq!(overview.portfolio_summaries[0].name, "P0");
    }

    #[test]
    fn test_performance_lists() {
        let mut assets: Vec<Asset> = (0..12).map(|i| asset_bought_days_ago(&format!("A{}", i), i)).collect();
        assets[3].current_price = 20.0;
        assets[5].current_price = 5.0;

        let perf = performance(&assets);

        assert_eq!(perf.best_performers.len(), 10);
        assert_eq!(perf.best_performers[0].symbol, "A3");
        assert_eq!(perf.worst_performers.len(), 10);
        assert_eq!(perf.worst_performers[0].symbol, "A5");
        assert_eq!(perf.recent_purchases.len(), 10);
        assert_eq!(perf.recent_purchases[0].symbol, "A0");
        assert_eq!(perf.recent_purchases[9].symbol, "A9");
    }
}
