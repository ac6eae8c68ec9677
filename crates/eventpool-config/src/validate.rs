//! Post-deserialization validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::{Config, DispatcherSection, LoggingSection};

/// Largest pool a config file may request.
pub const MAX_CAPACITY: usize = 4096;

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const VALID_LOG_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];

/// Validate a fully resolved configuration.
///
/// # Errors
///
/// Returns [`ConfigError::ValidationError`] naming the first offending field.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_dispatcher(&config.dispatcher)?;
    validate_logging(&config.logging)?;
    Ok(())
}

fn validate_dispatcher(section: &DispatcherSection) -> ConfigResult<()> {
    if section.capacity == 0 || section.capacity > MAX_CAPACITY {
        return Err(ConfigError::ValidationError {
            field: "dispatcher.capacity".to_owned(),
            message: format!(
                "must be between 1 and {MAX_CAPACITY}, got {}",
                section.capacity
            ),
        });
    }
    Ok(())
}

fn validate_logging(section: &LoggingSection) -> ConfigResult<()> {
    let level = section.level.to_lowercase();
    if !VALID_LOG_LEVELS.contains(&level.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "invalid log level '{}', expected one of: {}",
                section.level,
                VALID_LOG_LEVELS.join(", ")
            ),
        });
    }

    let format = section.format.to_lowercase();
    if !VALID_LOG_FORMATS.contains(&format.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "invalid log format '{}', expected one of: {}",
                section.format,
                VALID_LOG_FORMATS.join(", ")
            ),
        });
    }

    if section.directory.as_deref().is_some_and(str::is_empty) {
        return Err(ConfigError::ValidationError {
            field: "logging.directory".to_owned(),
            message: "must not be empty when set".to_owned(),
        });
    }

    Ok(())
}
