//! Logging configuration and setup
//!
//! This module provides tracing initialization for the PlayOn core.

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::utils::errors::Result;

/// Initialize logging based on configuration.
///
/// Returns the appender guard when a log file is configured; the caller
/// holds it for the process lifetime or buffered lines are lost.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let registry = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout));

    let guard = if let Some(file_path) = &config.file_path {
        let file_appender = tracing_appender::rolling::daily(file_path, "playon.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
            .init();
        Some(guard)
    } else {
        registry.init();
        None
    };

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}
