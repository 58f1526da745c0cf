pub mod admin_queries;
pub mod asset_queries;
pub mod custom_asset_type_queries;
pub mod job_run_queries;
pub mod portfolio_queries;
pub mod price_queries;
pub mod user_queries;
