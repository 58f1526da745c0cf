use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::AssetType;

/// How strongly a recommendation is worded. Ordered so that `High` sorts first
/// when sorting descending.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "PascalCase")]
pub enum RecommendationStrength {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RecommendationStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecommendationStrength::Low => write!(f, "Low"),
            RecommendationStrength::Medium => write!(f, "Medium"),
            RecommendationStrength::High => write!(f, "High"),
        }
    }
}

/// Advice about the composition of a portfolio as a whole.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PortfolioRecommendation {
    pub recommendation_type: String,
    pub description: String,
    pub reasoning: String,
    pub strength: RecommendationStrength,
}

/// Advice about a single asset or asset type.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AssetRecommendation {
    pub name: String,
    pub symbol: String,
    pub asset_type: AssetType,
    pub recommended_allocation: f64,
    pub estimated_growth_percentage: f64,
    pub reason: String,
    pub analysis_text: String,
    pub strength: RecommendationStrength,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendations {
    pub recommended_assets: Vec<AssetRecommendation>,
    pub portfolio_suggestions: Vec<PortfolioRecommendation>,
    pub generated_at: DateTime<Utc>,
}

impl Recommendations {
    pub fn empty() -> Self {
        Self {
            recommended_assets: Vec::new(),
            portfolio_suggestions: Vec::new(),
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strength_wire_names() {
        assert_eq!(serde_json::to_string(&RecommendationStrength::High).unwrap(), "\"High\"");
        assert_eq!(serde_json::to_string(&RecommendationStrength::Medium).unwrap(), "\"Medium\"");
        let low: RecommendationStrength = serde_json::from_str("\"Low\"").unwrap();
        assert_eq!(low, RecommendationStrength::Low);
        assert_eq!(RecommendationStrength::High.to_string(), "High");
    }
}
