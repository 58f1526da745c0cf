pub mod asset_type;
mod user;
mod portfolio;
mod asset;
mod price_history;
mod custom_asset_type;
mod summary;
mod recommendation;
mod job_run;
mod admin;

pub use asset_type::{AssetType, AssetTypeError, BuiltinAssetType, CUSTOM_TYPE_OFFSET};
pub use user::{
    AuthResponse, ChangePasswordRequest, ConfirmEmailQuery, ForgotPasswordRequest, LoginRequest,
    MessageResponse, RegisterRequest, ResetPasswordRequest, TokenValidation, User, UserSummary,
    UserView,
};
pub use portfolio::{CreatePortfolio, Portfolio, PortfolioStats, UpdatePortfolio};
pub use asset::{Asset, AssetView, CreateAsset, UpdateAsset};
pub use price_history::{
    HeldSymbol, PricePoint, PriceRecord, SOURCE_AUTO_UPDATE, SOURCE_INITIAL, SOURCE_MANUAL_UPDATE,
};
pub use custom_asset_type::{
    AssetTypeCatalogue, CreateCustomAssetType, CustomAssetType, UpdateCustomAssetType,
};
pub use summary::{
    AssetTypeDistribution, DashboardOverview, Performance, PortfolioSummary, PortfolioView,
};
pub use recommendation::{
    AssetRecommendation, PortfolioRecommendation, RecommendationStrength, Recommendations,
};
pub use job_run::{JobRun, JobStatus};
pub use admin::{ActivityType, AdminDashboard, AssetAddition, UserActivity};
