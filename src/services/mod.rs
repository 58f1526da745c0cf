pub mod admin_service;
pub mod asset_service;
pub mod auth_service;
pub mod dashboard_service;
pub mod email_service;
pub mod job_scheduler_service;
pub mod portfolio_service;
pub mod price_service;
pub mod recommendation_service;
pub mod valuation_service;
