use std::sync::Arc;
use sqlx::PgPool;
use crate::auth::JwtManager;
use crate::config::AppConfig;
use crate::external::price_provider::PriceSource;
use crate::services::email_service::EmailSender;
use crate::services::job_scheduler_service::JobContext;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub jwt: Arc<JwtManager>,
    pub mailer: Arc<dyn EmailSender>,
    pub price_source: Arc<dyn PriceSource>,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        config: AppConfig,
        mailer: Arc<dyn EmailSender>,
        price_source: Arc<dyn PriceSource>,
    ) -> Self {
        let jwt = Arc::new(JwtManager::new(&config.jwt));
        Self {
            pool,
            config: Arc::new(config),
            jwt,
            mailer,
            price_source,
        }
    }

    pub fn job_context(&self) -> JobContext {
        JobContext::new(self.pool.clone(), self.price_source.clone())
    }
}
