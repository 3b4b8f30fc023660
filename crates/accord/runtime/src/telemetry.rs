//! Tracing subscriber setup.

use crate::config::LoggingConfig;
use crate::{RuntimeError, RuntimeResult};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
///
/// Fails if a subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> RuntimeResult<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| RuntimeError::Telemetry(e.to_string()))?,
    };

    let result = if config.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer())
            .try_init()
    };

    result.map_err(|e| RuntimeError::Telemetry(e.to_string()))
}
