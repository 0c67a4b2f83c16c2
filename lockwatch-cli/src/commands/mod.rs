//! Command handlers -- one module per subcommand

pub mod audit;
pub mod config;

use std::path::Path;

use tracing::info;

use lockwatch_core::config::LockwatchConfig;
use lockwatch_core::error::{ConfigError, LockwatchError};

/// Load the effective configuration.
///
/// A missing file is not an error: built-in defaults plus `LOCKWATCH_*`
/// environment overrides apply instead. Any other load failure propagates.
pub async fn load_config(path: &Path) -> Result<LockwatchConfig, LockwatchError> {
    match LockwatchConfig::load(path).await {
        Err(LockwatchError::Config(ConfigError::FileNotFound { .. })) => {
            info!(path = %path.display(), "config file not found, using defaults");
            let mut config = LockwatchConfig::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
        other => other,
    }
}
