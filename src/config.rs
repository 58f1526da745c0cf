use std::net::SocketAddr;

use url::Url;

pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=info,sqlx=warn";

/// Where and how much the service logs.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub filter: String,
    pub environment: String,
    /// Loki push endpoint; `None` keeps logging on the console.
    pub loki_url: Option<Url>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Runtime configuration, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub jwt: JwtConfig,
    pub frontend_base_url: String,
    pub cors_origins: Vec<String>,
    pub admin_api_key: Option<String>,
    pub price_refresh_schedule: String,
    pub job_scheduler_test_mode: bool,
    pub run_migrations: bool,
    pub smtp: Option<SmtpConfig>,
    pub log: LogConfig,
}

pub const DEFAULT_PRICE_REFRESH_SCHEDULE: &str = "0 */15 * * * *";
const TEST_MODE_PRICE_REFRESH_SCHEDULE: &str = "0 */1 * * * *";

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().to_lowercase().parse::<bool>().ok())
        .unwrap_or(default)
}

fn loki_url(enabled: bool, raw: Option<String>) -> Result<Option<Url>, String> {
    if !enabled {
        return Ok(None);
    }
    let raw = raw
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| "LOKI_ENABLED is true but LOKI_URL is not set".to_string())?;
    Url::parse(raw.trim())
        .map(Some)
        .map_err(|e| format!("Invalid LOKI_URL: {}", e))
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL must be set".to_string())?;

        let bind_addr = env_or("BIND_ADDR", "0.0.0.0:3000")
            .parse::<SocketAddr>()
            .map_err(|e| format!("Invalid BIND_ADDR: {}", e))?;

        let ttl_minutes = env_or("JWT_TTL_MINUTES", "1440")
            .parse::<i64>()
            .map_err(|e| format!("Invalid JWT_TTL_MINUTES: {}", e))?;

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")
                .map_err(|_| "JWT_SECRET must be set".to_string())?,
            issuer: env_or("JWT_ISSUER", "calmative-api"),
            audience: env_or("JWT_AUDIENCE", "calmative-clients"),
            ttl_minutes,
        };

        let cors_origins = env_or("CORS_ORIGINS", "http://localhost:5297,https://localhost:7294")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let job_scheduler_test_mode = env_flag("JOB_SCHEDULER_TEST_MODE", false);
        let price_refresh_schedule = if job_scheduler_test_mode {
            TEST_MODE_PRICE_REFRESH_SCHEDULE.to_string()
        } else {
            env_or("PRICE_REFRESH_SCHEDULE", DEFAULT_PRICE_REFRESH_SCHEDULE)
        };

        let smtp = if env_flag("SMTP_ENABLED", false) {
            Some(SmtpConfig {
                host: std::env::var("SMTP_HOST")
                    .map_err(|_| "SMTP_ENABLED is true but SMTP_HOST is not set".to_string())?,
                port: env_or("SMTP_PORT", "587")
                    .parse::<u16>()
                    .map_err(|e| format!("Invalid SMTP_PORT: {}", e))?,
                username: env_or("SMTP_USERNAME", ""),
                password: env_or("SMTP_PASSWORD", ""),
                from_email: std::env::var("SMTP_FROM_EMAIL")
                    .map_err(|_| "SMTP_ENABLED is true but SMTP_FROM_EMAIL is not set".to_string())?,
                from_name: env_or("SMTP_FROM_NAME", "Calmative"),
            })
        } else {
            None
        };

        let log = LogConfig {
            filter: env_or("RUST_LOG", DEFAULT_LOG_FILTER),
            environment: env_or("ENVIRONMENT", "development"),
            loki_url: loki_url(env_flag("LOKI_ENABLED", false), std::env::var("LOKI_URL").ok())?,
        };

        let config = Self {
            database_url,
            bind_addr,
            jwt,
            frontend_base_url: env_or("FRONTEND_BASE_URL", "http://localhost:5297"),
            cors_origins,
            admin_api_key: std::env::var("ADMIN_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            price_refresh_schedule,
            job_scheduler_test_mode,
            run_migrations: env_flag("RUN_MIGRATIONS", true),
            smtp,
            log,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.jwt.secret.len() < 32 {
            return Err("JWT_SECRET must be at least 32 characters".to_string());
        }
        if self.jwt.ttl_minutes <= 0 {
            return Err("JWT_TTL_MINUTES must be positive".to_string());
        }
        Url::parse(&self.frontend_base_url)
            .map_err(|e| format!("Invalid FRONTEND_BASE_URL: {}", e))?;
        tracing_subscriber::EnvFilter::try_new(&self.log.filter)
            .map_err(|e| format!("Invalid RUST_LOG filter: {}", e))?;
        Ok(())
    }

    /// Frontend base URL without a trailing slash.
    pub fn frontend_base(&self) -> &str {
        self.frontend_base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://localhost/calmative_test".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        jwt: JwtConfig {
            secret: "test-secret-test-secret-test-secret-42".to_string(),
            issuer: "calmative-api".to_string(),
            audience: "calmative-clients".to_string(),
            ttl_minutes: 60,
        },
        frontend_base_url: "http://localhost:5297/".to_string(),
        cors_origins: vec!["http://localhost:5297".to_string()],
        admin_api_key: Some("admin-key".to_string()),
        price_refresh_schedule: DEFAULT_PRICE_REFRESH_SCHEDULE.to_string(),
        job_scheduler_test_mode: false,
        run_migrations: false,
        smtp: None,
        log: LogConfig {
            filter: DEFAULT_LOG_FILTER.to_string(),
            environment: "test".to_string(),
            loki_url: None,
        },
    }
}
