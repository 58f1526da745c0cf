use serde::{Deserialize, Serialize};
use sqlx::encode::IsNull;
use sqlx::postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef};
use sqlx::{Decode, Encode, Postgres, Type};
use thiserror::Error;

/// Codes at or above this value refer to admin-defined custom asset types
/// (`code = custom_type_id + CUSTOM_TYPE_OFFSET`).
pub const CUSTOM_TYPE_OFFSET: i32 = 1000;

/// The fixed catalogue of asset categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinAssetType {
    Currency = 1,
    Gold = 2,
    Silver = 3,
    Crypto = 4,
    PreciousMetals = 5,
    Car = 6,
    RealEstate = 7,
    Stock = 8,
    Bond = 9,
    Etf = 10,
    Custom = 11,
}

impl BuiltinAssetType {
    pub const ALL: [BuiltinAssetType; 11] = [
        BuiltinAssetType::Currency,
        BuiltinAssetType::Gold,
        BuiltinAssetType::Silver,
        BuiltinAssetType::Crypto,
        BuiltinAssetType::PreciousMetals,
        BuiltinAssetType::Car,
        BuiltinAssetType::RealEstate,
        BuiltinAssetType::Stock,
        BuiltinAssetType::Bond,
        BuiltinAssetType::Etf,
        BuiltinAssetType::Custom,
    ];

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| *t as i32 == code)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinAssetType::Currency => "Currency",
            BuiltinAssetType::Gold => "Gold",
            BuiltinAssetType::Silver => "Silver",
            BuiltinAssetType::Crypto => "Crypto",
            BuiltinAssetType::PreciousMetals => "PreciousMetals",
            BuiltinAssetType::Car => "Car",
            BuiltinAssetType::RealEstate => "RealEstate",
            BuiltinAssetType::Stock => "Stock",
            BuiltinAssetType::Bond => "Bond",
            BuiltinAssetType::Etf => "ETF",
            BuiltinAssetType::Custom => "Custom",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BuiltinAssetType::Currency => "Currency",
            BuiltinAssetType::Gold => "Gold",
            BuiltinAssetType::Silver => "Silver",
            BuiltinAssetType::Crypto => "Cryptocurrency",
            BuiltinAssetType::PreciousMetals => "Precious metals",
            BuiltinAssetType::Car => "Car",
            BuiltinAssetType::RealEstate => "Real estate",
            BuiltinAssetType::Stock => "Stocks",
            BuiltinAssetType::Bond => "Bonds",
            BuiltinAssetType::Etf => "Exchange-traded funds",
            BuiltinAssetType::Custom => "Custom",
        }
    }
}

/// Category of an asset: either built-in or a custom type identified by its id.
///
/// On the wire and in the database an asset type is its integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum AssetType {
    Builtin(BuiltinAssetType),
    Custom(i32),
}

#[derive(Debug, Error, PartialEq)]
pub enum AssetTypeError {
    #[error("unknown asset type code {0}")]
    UnknownCode(i32),
}

impl AssetType {
    pub const CURRENCY: AssetType = AssetType::Builtin(BuiltinAssetType::Currency);
    pub const GOLD: AssetType = AssetType::Builtin(BuiltinAssetType::Gold);
    pub const SILVER: AssetType = AssetType::Builtin(BuiltinAssetType::Silver);
    pub const CRYPTO: AssetType = AssetType::Builtin(BuiltinAssetType::Crypto);
    pub const PRECIOUS_METALS: AssetType = AssetType::Builtin(BuiltinAssetType::PreciousMetals);
    pub const REAL_ESTATE: AssetType = AssetType::Builtin(BuiltinAssetType::RealEstate);
    pub const STOCK: AssetType = AssetType::Builtin(BuiltinAssetType::Stock);

    pub fn code(&self) -> i32 {
        match self {
            AssetType::Builtin(t) => *t as i32,
            AssetType::Custom(id) => id + CUSTOM_TYPE_OFFSET,
        }
    }

    pub fn from_code(code: i32) -> Result<Self, AssetTypeError> {
        if code >= CUSTOM_TYPE_OFFSET {
            return Ok(AssetType::Custom(code - CUSTOM_TYPE_OFFSET));
        }
        BuiltinAssetType::from_code(code)
            .map(AssetType::Builtin)
            .ok_or(AssetTypeError::UnknownCode(code))
    }

    pub fn custom_type_id(&self) -> Option<i32> {
        match self {
            AssetType::Custom(id) => Some(*id),
            AssetType::Builtin(_) => None,
        }
    }

    pub fn name(&self) -> String {
        match self {
            AssetType::Builtin(t) => t.name().to_string(),
            AssetType::Custom(id) => format!("Custom{}", id),
        }
    }

    /// Crypto and stocks count as high-volatility holdings.
    pub fn is_volatile(&self) -> bool {
        matches!(self, AssetType::Builtin(BuiltinAssetType::Crypto | BuiltinAssetType::Stock))
    }

    pub fn is_gold_like(&self) -> bool {
        matches!(
            self,
            AssetType::Builtin(
                BuiltinAssetType::Gold | BuiltinAssetType::Silver | BuiltinAssetType::PreciousMetals
            )
        )
    }
}

impl From<AssetType> for i32 {
    fn from(value: AssetType) -> Self {
        value.code()
    }
}

impl TryFrom<i32> for AssetType {
    type Error = AssetTypeError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        AssetType::from_code(value)
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Type<Postgres> for AssetType {
    fn type_info() -> PgTypeInfo {
        <i32 as Type<Postgres>>::type_info()
    }
}

impl<'q> Encode<'q, Postgres> for AssetType {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> IsNull {
        <i32 as Encode<Postgres>>::encode_by_ref(&self.code(), buf)
    }
}

impl<'r> Decode<'r, Postgres> for AssetType {
    fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let code = <i32 as Decode<Postgres>>::decode(value)?;
        Ok(AssetType::from_code(code)?)
    }
}

/// Entry in the asset type catalogue served to clients.
#[derive(Debug, Clone, Serialize)]
pub struct BuiltinAssetTypeInfo {
    pub id: i32,
    pub name: &'static str,
    pub display_name: &'static str,
    pub is_built_in: bool,
}

pub fn builtin_catalogue() -> Vec<BuiltinAssetTypeInfo> {
    BuiltinAssetType::ALL
        .iter()
        .map(|t| BuiltinAssetTypeInfo {
            id: *t as i32,
            name: t.name(),
            display_name: t.display_name(),
            is_built_in: true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_codes() {
        assert_eq!(AssetType::from_code(1), Ok(AssetType::CURRENCY));
        assert_eq!(AssetType::from_code(4), Ok(AssetType::CRYPTO));
        assert_eq!(AssetType::from_code(11), Ok(AssetType::Builtin(BuiltinAssetType::Custom)));
        assert_eq!(AssetType::CRYPTO.code(), 4);
    }

    #[test]
    fn test_custom_codes_use_offset() {
        let t = AssetType::from_code(1003).unwrap();
        assert_eq!(t, AssetType::Custom(3));
        assert_eq!(t.code(), 1003);
        assert_eq!(t.custom_type_id(), Some(3));
        assert_eq!(t.name(), "Custom3");
    }

    #[test]
    fn test_invalid_codes_rejected() {
        assert_eq!(AssetType::from_code(0), Err(AssetTypeError::UnknownCode(0)));
        assert_eq!(AssetType::from_code(12), Err(AssetTypeError::UnknownCode(12)));
        assert_eq!(AssetType::from_code(999), Err(AssetTypeError::UnknownCode(999)));
        assert!(AssetType::from_code(-5).is_err());
    }

    #[test]
    fn test_serde_uses_integer_code() {
        let json = serde_json::to_string(&AssetType::GOLD).unwrap();
        assert_eq!(json, "2");
        let parsed: AssetType = serde_json::from_str("1001").unwrap();
        assert_eq!(parsed, AssetType::Custom(1));
        assert!(serde_json::from_str::<AssetType>("42").is_err());
    }

    #[test]
    fn test_volatility_and_metal_groups() {
        assert!(AssetType::CRYPTO.is_volatile());
        assert!(AssetType::STOCK.is_volatile());
        assert!(!AssetType::GOLD.is_volatile());
        assert!(AssetType::SILVER.is_gold_like());
        assert!(AssetType::PRECIOUS_METALS.is_gold_like());
        assert!(!AssetType::Custom(2).is_gold_like());
    }

    #[test]
    fn test_catalogue_lists_all_builtins() {
        let catalogue = builtin_catalogue();
        assert_eq!(catalogue.len(), 11);
        assert_eq!(catalogue[0].id, 1);
        assert_eq!(catalogue[9].name, "ETF");
        assert!(catalogue.iter().all(|t| t.is_built_in));
    }
}
