//! Global tracing subscriber: env filter and console output, with a Loki
//! layer stacked on top when `LogConfig::loki_url` is set.

use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;

pub const SERVICE_NAME: &str = "calmative-backend";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[cfg(feature = "loki")]
    #[error("failed to build Loki layer: {0}")]
    Loki(#[from] tracing_loki::Error),

    #[error("a global subscriber is already installed: {0}")]
    AlreadyInstalled(#[from] tracing_subscriber::util::TryInitError),
}

/// Installs the subscriber. Must run inside the tokio runtime when Loki is
/// configured, since the shipping task is spawned here.
pub fn init_logging(config: &LogConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_new(&config.filter)?;
    let loki = loki_layer(config)?;
    let shipping = loki.is_some();

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(loki)
        .try_init()?;

    match &config.loki_url {
        Some(url) if shipping => info!(
            "📊 Logging {} ({}) to console and Loki at {}",
            SERVICE_NAME, config.environment, url
        ),
        Some(url) => warn!("LOKI_URL {} ignored: built without the `loki` feature", url),
        None => info!("📊 Logging {} ({}) to console", SERVICE_NAME, config.environment),
    }
    Ok(())
}

#[cfg(feature = "loki")]
fn loki_layer(config: &LogConfig) -> Result<Option<tracing_loki::Layer>, LoggingError> {
    let Some(url) = config.loki_url.clone() else {
        return Ok(None);
    };
    let (layer, task) = tracing_loki::builder()
        .label("service", SERVICE_NAME)?
        .label("environment", config.environment.as_str())?
        .build_url(url)?;
    tokio::spawn(task);
    Ok(Some(layer))
}

#[cfg(not(feature = "loki"))]
fn loki_layer(
    _config: &LogConfig,
) -> Result<Option<tracing_subscriber::layer::Identity>, LoggingError> {
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_only_has_no_loki_layer() {
        let config = LogConfig {
            filter: "debug".to_string(),
            environment: "test".to_string(),
            loki_url: None,
        };
        assert!(loki_layer(&config).unwrap().is_none());
    }

    #[test]
    fn test_bad_filter_is_reported_before_install() {
        let config = LogConfig {
            filter: "sqlx=loudest".to_string(),
            environment: "test".to_string(),
            loki_url: None,
        };
        assert!(matches!(init_logging(&config), Err(LoggingError::Filter(_))));
    }
}
