use std::collections::HashMap;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::{
    Asset, CreatePortfolio, Portfolio, PortfolioSummary, PortfolioView, UpdatePortfolio,
};
use crate::services::{price_service, valuation_service};

const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 500;

/// Trims the inputs and checks the name and description lengths.
pub fn validate_fields(
    name: &str,
    description: Option<&str>,
) -> Result<(String, Option<String>), AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Portfolio name cannot be empty".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "Portfolio name cannot exceed {} characters",
            MAX_NAME_LEN
        )));
    }
    let description = description.map(str::trim).filter(|d| !d.is_empty());
    if let Some(d) = description {
        if d.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(AppError::Validation(format!(
                "Portfolio description cannot exceed {} characters",
                MAX_DESCRIPTION_LEN
            )));
        }
    }
    Ok((name.to_string(), description.map(str::to_string)))
}

fn group_by_portfolio(assets: Vec<Asset>) -> HashMap<Uuid, Vec<Asset>> {
    let mut by_portfolio: HashMap<Uuid, Vec<Asset>> = HashMap::new();
    for asset in assets {
        by_portfolio.entry(asset.portfolio_id).or_default().push(asset);
    }
    by_portfolio
}

/// Groups assets under their portfolios, keeping portfolio order.
fn assemble(portfolios: &[Portfolio], assets: Vec<Asset>) -> Vec<PortfolioView> {
    let mut by_portfolio = group_by_portfolio(assets);
    portfolios
        .iter()
        .map(|p| {
            let assets = by_portfolio.remove(&p.id).unwrap_or_default();
            valuation_service::portfolio_view(p, &assets)
        })
        .collect()
}

async fn fetch_owned(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<Portfolio, AppError> {
    db::portfolio_queries::fetch_owned(pool, id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Portfolio with ID {} not found", id)))
}

async fn priced_assets(pool: &PgPool, portfolio_id: Uuid) -> Result<Vec<Asset>, AppError> {
    let assets = db::asset_queries::fetch_for_portfolio(pool, portfolio_id).await?;
    price_service::with_latest_prices(pool, assets).await
}

pub async fn fetch_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<PortfolioView>, AppError> {
    let portfolios = db::portfolio_queries::fetch_for_user(pool, user_id).await?;
    let assets = db::asset_queries::fetch_for_user(pool, user_id).await?;
    let assets = price_service::with_latest_prices(pool, assets).await?;
    Ok(assemble(&portfolios, assets))
}

/// Per-portfolio summaries for every portfolio the user owns.
pub async fn summaries_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<PortfolioSummary>, AppError> {
    let portfolios = db::portfolio_queries::fetch_for_user(pool, user_id).await?;
    let assets = db::asset_queries::fetch_for_user(pool, user_id).await?;
    let assets = price_service::with_latest_prices(pool, assets).await?;

    let mut by_portfolio = group_by_portfolio(assets);
    Ok(portfolios
        .iter()
        .map(|p| {
            let assets = by_portfolio.remove(&p.id).unwrap_or_default();
            valuation_service::summarize(p, &assets)
        })
        .collect())
}

pub async fn fetch_one(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<PortfolioView, AppError> {
    let portfolio = fetch_owned(pool, id, user_id).await?;
    let assets = priced_assets(pool, portfolio.id).await?;
    Ok(valuation_service::portfolio_view(&portfolio, &assets))
}

pub async fn summary(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<PortfolioSummary, AppError> {
    let portfolio = fetch_owned(pool, id, user_id).await?;
    let assets = priced_assets(pool, portfolio.id).await?;
    Ok(valuation_service::summarize(&portfolio, &assets))
}

pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    input: CreatePortfolio,
) -> Result<PortfolioView, AppError> {
    let (name, description) = validate_fields(&input.name, input.description.as_deref())?;
    let portfolio = db::portfolio_queries::insert(pool, &Portfolio::new(user_id, name, description)).await?;
    info!("Created portfolio {} for user {}", portfolio.id, user_id);
    Ok(valuation_service::portfolio_view(&portfolio, &[]))
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    input: UpdatePortfolio,
) -> Result<PortfolioView, AppError> {
    let (name, description) = validate_fields(&input.name, input.description.as_deref())?;
    let changes = UpdatePortfolio { name, description };
    let portfolio = db::portfolio_queries::update(pool, id, user_id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Portfolio with ID {} not found", id)))?;
    let assets = priced_assets(pool, portfolio.id).await?;
    Ok(valuation_service::portfolio_view(&portfolio, &assets))
}

pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
    match db::portfolio_queries::delete(pool, id, user_id).await? {
        0 => Err(AppError::NotFound(format!("Portfolio with ID {} not found", id))),
        _ => {
            info!("Deleted portfolio {} (assets cascaded)", id);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssetType;
    use crate::services::valuation_service::test_support::{asset, portfolio};

    #[test]
    fn test_validate_trims_and_drops_blank_description() {
        let (name, description) = validate_fields("  Retirement  ", Some("   ")).unwrap();
        assert_eq!(name, "Retirement");
        assert_eq!(description, None);
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        assert!(matches!(validate_fields("   ", None), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_length_limits() {
        assert!(validate_fields(&"n".repeat(100), None).is_ok());
        assert!(validate_fields(&"n".repeat(101), None).is_err());
        assert!(validate_fields("ok", Some(&"d".repeat(500))).is_ok());
        assert!(validate_fields("ok", Some(&"d".repeat(501))).is_err());
    }

    #[test]
    fn test_assemble_groups_assets_by_portfolio() {
        let first = portfolio("First");
        let second = portfolio("Second");

        let mut btc = asset("BTC", AssetType::CRYPTO, 1.0, 100.0, 200.0);
        btc.portfolio_id = first.id;
        let mut gold = asset("GOLD", AssetType::GOLD, 2.0, 50.0, 50.0);
        gold.portfolio_id = second.id;
        let mut eur = asset("EUR", AssetType::CURRENCY, 10.0, 1.0, 1.0);
        eur.portfolio_id = first.id;

        let views = assemble(&[first.clone(), second.clone()], vec![btc, gold, eur]);
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].id, first.id);
        assert_eq!(views[0].assets.len(), 2);
        assert_eq!(views[1].id, second.id);
        assert_eq!(views[1].assets.len(), 1);
        assert!((views[0].total_value - 210.0).abs() < 1e-9);
    }

    #[test]
    fn test_assemble_empty_portfolio_has_no_assets() {
        let lonely = portfolio("Empty");
        let views = assemble(&[lonely], Vec::new());
        assert!(views[0].assets.is_empty());
        assert_eq!(views[0].total_value, 0.0);
    }
}
