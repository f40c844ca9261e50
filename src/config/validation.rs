//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use super::Settings;
use crate::utils::errors::{PlayOnError, Result};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_logging_config(&settings.logging)?;
    validate_pagination_config(&settings.pagination)?;

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(PlayOnError::Config("Database URL is required".to_string()));
    }

    if config.max_connections == 0 {
        return Err(PlayOnError::Config(
            "Max connections must be greater than 0".to_string(),
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(PlayOnError::Config(
            "Min connections cannot be greater than max connections".to_string(),
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(PlayOnError::Config("Log level is required".to_string()));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(PlayOnError::Config(format!(
            "Invalid log level: {}. Valid levels: {:?}",
            config.level, valid_levels
        )));
    }

    Ok(())
}

/// Validate pagination bounds
fn validate_pagination_config(config: &super::PaginationConfig) -> Result<()> {
    if config.default_limit < 1 {
        return Err(PlayOnError::Config(
            "Default page limit must be at least 1".to_string(),
        ));
    }

    if config.max_limit < config.default_limit {
        return Err(PlayOnError::Config(
            "Max page limit cannot be below the default limit".to_string(),
        ));
    }

    Ok(())
}
