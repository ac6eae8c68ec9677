//! Config file loading.
//!
//! 1. Parse the TOML source into a raw tree
//! 2. Apply env var fallbacks for unset fields
//! 3. Deserialize into [`Config`]
//! 4. Validate

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;
use crate::validate;

/// Maximum config file size accepted (1 MiB).
pub const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Load a config file, using the process environment for fallbacks.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read or parsed, or if the
/// result fails validation.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    load_file_with_env(path, &collect_env_vars())
}

/// Load a config file with an explicit environment snapshot.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read or parsed, or if the
/// result fails validation.
pub fn load_file_with_env<S: ::std::hash::BuildHasher>(
    path: &Path,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<Config> {
    let path_str = path.display().to_string();

    // Check file size before reading to prevent OOM.
    let metadata = std::fs::metadata(path).map_err(|e| ConfigError::ReadError {
        path: path_str.clone(),
        source: e,
    })?;
    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path_str,
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                metadata.len(),
            ),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path_str.clone(),
        source: e,
    })?;

    let config = parse(&content, &path_str, env_vars)?;
    info!(path = %path_str, "loaded config");
    Ok(config)
}

/// Parse config from a TOML string with an explicit environment snapshot.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the source is malformed or fails validation.
pub fn load_str<S: ::std::hash::BuildHasher>(
    source: &str,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<Config> {
    parse(source, "<string>", env_vars)
}

fn parse<S: ::std::hash::BuildHasher>(
    source: &str,
    origin: &str,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<Config> {
    let mut raw: toml::Value = toml::from_str(source).map_err(|e| ConfigError::ParseError {
        path: origin.to_owned(),
        source: e,
    })?;

    let applied = apply_env_fallbacks(&mut raw, env_vars);
    if applied > 0 {
        debug!(count = applied, "applied environment variable fallbacks");
    }

    let config: Config = raw
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError {
            path: origin.to_owned(),
            source: e,
        })?;

    validate::validate(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn test_load_str_defaults() {
        let config = load_str("", &no_env()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_str_with_env_fallback() {
        let env: HashMap<String, String> = [
            ("EVENTPOOL_CAPACITY".to_owned(), "8".to_owned()),
            ("EVENTPOOL_WAIT_TIMEOUT_MS".to_owned(), "250".to_owned()),
        ]
        .into_iter()
        .collect();

        let config = load_str("[logging]\nlevel = \"warn\"\n", &env).unwrap();
        assert_eq!(config.dispatcher.capacity, 8);
        assert_eq!(config.dispatcher.wait_timeout_ms, 250);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_load_str_malformed() {
        let err = load_str("[dispatcher\ncapacity = 4", &no_env()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_load_str_wrong_type() {
        let err = load_str("[dispatcher]\ncapacity = \"lots\"\n", &no_env()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_load_str_invalid_value() {
        let err = load_str("[dispatcher]\ncapacity = 0\n", &no_env()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ValidationError { ref field, .. } if field == "dispatcher.capacity"
        ));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[dispatcher]\ncapacity = 32\nwait_timeout_ms = 1000").unwrap();

        let config = load_file_with_env(file.path(), &no_env()).unwrap();
        assert_eq!(config.dispatcher.capacity, 32);
        assert_eq!(config.dispatcher.wait_timeout_ms, 1000);
    }

    #[test]
    fn test_load_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_file_with_env(&dir.path().join("absent.toml"), &no_env()).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }
}
