//! Rule-based advice derived from portfolio composition and recent price trends.
//!
//! Portfolio rules look at the asset type distribution; asset rules compare the
//! oldest and newest price of each held (symbol, type) pair inside a window of
//! recent price records.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::{
    Asset, AssetRecommendation, AssetType, BuiltinAssetType, PortfolioRecommendation, PriceRecord,
    RecommendationStrength, Recommendations,
};
use crate::services::valuation_service;

/// Number of most recent price records considered for growth analysis.
pub const PRICE_WINDOW: i64 = 1000;

const DIVERSIFICATION_MAX_TYPES: usize = 2;
const CONCENTRATION_THRESHOLD_PCT: f64 = 70.0;
const VOLATILE_THRESHOLD_PCT: f64 = 60.0;
const GROWTH_TRIGGER_PCT: f64 = 5.0;
const GROWTH_MEDIUM_PCT: f64 = 7.0;
const GROWTH_HIGH_PCT: f64 = 10.0;
const DIVERSIFICATION_ALLOCATION_PCT: f64 = 10.0;

pub fn portfolio_recommendations(assets: &[Asset]) -> Vec<PortfolioRecommendation> {
    let distribution = valuation_service::distribution(assets);
    let mut recommendations = Vec::new();

    if distribution.len() <= DIVERSIFICATION_MAX_TYPES {
        recommendations.push(PortfolioRecommendation {
            recommendation_type: "Diversification".to_string(),
            description: "Your portfolio has low diversification. Consider investing across more asset types."
                .to_string(),
            reasoning: "Diversified portfolios carry less risk and hold up better against market swings."
                .to_string(),
            strength: RecommendationStrength::High,
        });
    }

    if let Some(largest) = distribution.first() {
        if largest.percentage > CONCENTRATION_THRESHOLD_PCT {
            recommendations.push(PortfolioRecommendation {
                recommendation_type: "Rebalancing".to_string(),
                description: format!(
                    "High concentration in {}. Consider rebalancing your portfolio.",
                    largest.asset_type_name
                ),
                reasoning: "More than 70% of the portfolio in a single asset type increases risk."
                    .to_string(),
                strength: RecommendationStrength::Medium,
            });
        }
    }

    let total: f64 = assets.iter().map(Asset::total_value).sum();
    let volatile: f64 = assets
        .iter()
        .filter(|a| a.asset_type.is_volatile())
        .map(Asset::total_value)
        .sum();
    let volatile_pct = if total > 0.0 { volatile / total * 100.0 } else { 0.0 };

    if volatile_pct > VOLATILE_THRESHOLD_PCT {
        recommendations.push(PortfolioRecommendation {
            recommendation_type: "Risk Management".to_string(),
            description: "Your portfolio risk is high. Consider moving part of it into lower-risk assets."
                .to_string(),
            reasoning: "High-volatility assets such as crypto and stocks make up more than 60% of the portfolio."
                .to_string(),
            strength: RecommendationStrength::Medium,
        });
    }

    recommendations
}

/// Growth from oldest to newest price per (symbol, type) pair in the window.
///
/// Pairs with fewer than two records or a non-positive oldest price are skipped.
pub fn growth_by_pair(window: &[PriceRecord]) -> Vec<(String, AssetType, f64)> {
    let mut groups: BTreeMap<(String, AssetType), Vec<&PriceRecord>> = BTreeMap::new();
    for record in window {
        groups
            .entry((record.symbol.clone(), record.asset_type))
            .or_default()
            .push(record);
    }

    groups
        .into_iter()
        .filter_map(|((symbol, asset_type), mut records)| {
            if records.len() < 2 {
                return None;
            }
            records.sort_by_key(|r| r.recorded_at);
            let oldest = records.first()?.price;
            let newest = records.last()?.price;
            if oldest <= 0.0 {
                return None;
            }
            Some((symbol, asset_type, (newest - oldest) / oldest * 100.0))
        })
        .collect()
}

fn increase_strength(growth: f64) -> RecommendationStrength {
    if growth > GROWTH_HIGH_PCT {
        RecommendationStrength::High
    } else if growth > GROWTH_MEDIUM_PCT {
        RecommendationStrength::Medium
    } else {
        RecommendationStrength::Low
    }
}

fn review_strength(growth: f64) -> RecommendationStrength {
    increase_strength(-growth)
}

pub fn asset_recommendations(assets: &[Asset], window: &[PriceRecord]) -> Vec<AssetRecommendation> {
    let mut recommendations = Vec::new();

    for (symbol, asset_type, growth) in growth_by_pair(window) {
        let Some(held) = assets
            .iter()
            .find(|a| a.symbol == symbol && a.asset_type == asset_type)
        else {
            continue;
        };

        if growth > GROWTH_TRIGGER_PCT {
            recommendations.push(AssetRecommendation {
                name: held.name.clone(),
                symbol: held.symbol.clone(),
                asset_type: held.asset_type,
                recommended_allocation: 0.0,
                estimated_growth_percentage: growth,
                reason: "Increase position".to_string(),
                analysis_text: format!(
                    "This asset has performed well ({:.2}% growth). You may increase your position.",
                    growth
                ),
                strength: increase_strength(growth),
            });
        } else if growth < -GROWTH_TRIGGER_PCT {
            recommendations.push(AssetRecommendation {
                name: held.name.clone(),
                symbol: held.symbol.clone(),
                asset_type: held.asset_type,
                recommended_allocation: 0.0,
                estimated_growth_percentage: growth,
                reason: "Review position".to_string(),
                analysis_text: format!(
                    "This asset has dropped {:.2}%. Reviewing the position is recommended.",
                    growth.abs()
                ),
                strength: review_strength(growth),
            });
        }
    }

    let held_types: BTreeSet<AssetType> = assets.iter().map(|a| a.asset_type).collect();
    let mut suggested = Vec::new();
    if !held_types.contains(&AssetType::REAL_ESTATE) {
        suggested.push(BuiltinAssetType::RealEstate);
    }
    if !held_types.iter().any(AssetType::is_gold_like) {
        suggested.push(BuiltinAssetType::Gold);
    }

    for builtin in suggested {
        recommendations.push(AssetRecommendation {
            name: builtin.display_name().to_string(),
            symbol: builtin.name().to_uppercase(),
            asset_type: AssetType::Builtin(builtin),
            recommended_allocation: DIVERSIFICATION_ALLOCATION_PCT,
            estimated_growth_percentage: 0.0,
            reason: "Portfolio diversification".to_string(),
            analysis_text: format!(
                "Adding {} to your portfolio can help balance its risk.",
                builtin.display_name().to_lowercase()
            ),
            strength: RecommendationStrength::Medium,
        });
    }

    recommendations.sort_by(|a, b| {
        b.strength.cmp(&a.strength).then_with(|| {
            b.estimated_growth_percentage
                .abs()
                .total_cmp(&a.estimated_growth_percentage.abs())
        })
    });
    recommendations
}

pub fn build(assets: &[Asset], window: &[PriceRecord]) -> Recommendations {
    Recommendations {
        recommended_assets: asset_recommendations(assets, window),
        portfolio_suggestions: portfolio_recommendations(assets),
        generated_at: Utc::now(),
    }
}

fn upper_symbols(assets: &[Asset]) -> Vec<String> {
    assets
        .iter()
        .map(|a| a.symbol.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

async fn recommend(pool: &PgPool, assets: &[Asset]) -> Result<Recommendations, AppError> {
    let window = db::price_queries::fetch_recent_window(pool, &upper_symbols(assets), PRICE_WINDOW).await?;
    let recommendations = build(assets, &window);
    info!(
        "Generated {} asset and {} portfolio recommendations from {} price records",
        recommendations.recommended_assets.len(),
        recommendations.portfolio_suggestions.len(),
        window.len()
    );
    Ok(recommendations)
}

/// Recommendations across all of the user's portfolios.
pub async fn for_user(pool: &PgPool, user_id: Uuid) -> Result<Recommendations, AppError> {
    if db::portfolio_queries::count_for_user(pool, user_id).await? == 0 {
        info!("User {} has no portfolios, returning empty recommendations", user_id);
        return Ok(Recommendations::empty());
    }
    let assets = db::asset_queries::fetch_for_user(pool, user_id).await?;
    recommend(pool, &assets).await
}

pub async fn for_portfolio(
    pool: &PgPool,
    portfolio_id: Uuid,
    user_id: Uuid,
) -> Result<Recommendations, AppError> {
    let portfolio = db::portfolio_queries::fetch_owned(pool, portfolio_id, user_id)
        .await?
        .ok_or_else(|| {
            warn!("Portfolio {} not found for user {}", portfolio_id, user_id);
            AppError::NotFound(format!("Portfolio with ID {} not found", portfolio_id))
        })?;
    let assets = db::asset_queries::fetch_for_portfolio(pool, portfolio.id).await?;
    recommend(pool, &assets).await
}
