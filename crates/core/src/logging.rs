use thiserror::Error;
use tracing::Level;

use crate::config::{LogFormat, LoggingConfig};

#[derive(Debug, Error)]
#[error("logging initialization failed: {0}")]
pub struct LoggingInitError(String);

/// Installs the global tracing subscriber described by the logging
/// section. Call once per process, before the resolvers start working;
/// a second call reports an error instead of replacing the subscriber.
pub fn init(config: &LoggingConfig) -> Result<(), LoggingInitError> {
    let level = config.level.parse::<Level>().unwrap_or(Level::INFO);

    let result = match config.format {
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_target(false)
            .with_max_level(level)
            .compact()
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_target(false)
            .with_max_level(level)
            .pretty()
            .try_init(),
        LogFormat::Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(level).json().try_init()
        }
    };

    result.map_err(|error| LoggingInitError(error.to_string()))
}
