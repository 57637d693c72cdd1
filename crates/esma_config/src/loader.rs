//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::EsmaConfig;
use std::path::Path;

/// File name looked up in a configuration directory.
pub const CONFIG_FILE_NAME: &str = "esma.toml";

/// Loads `<dir>/esma.toml`, or the defaults if the file does not exist.
pub fn load_config(dir: &Path) -> Result<EsmaConfig, ConfigError> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        let config = EsmaConfig::default();
        validate_config(&config)?;
        return Ok(config);
    }
    load_config_file(&config_path)
}

/// Loads and validates a configuration file at an explicit path.
///
/// Unlike [`load_config`], a missing file is an error.
pub fn load_config_file(path: &Path) -> Result<EsmaConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates an `esma.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<EsmaConfig, ConfigError> {
    let config: EsmaConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &EsmaConfig) -> Result<(), ConfigError> {
    let folder = &config.cache.folder;
    if folder.is_empty() || folder.contains(['/', '\\']) {
        return Err(ConfigError::ValidationError(format!(
            "cache.folder must be a single directory name, got '{folder}'"
        )));
    }
    if config.query.limit == 0 {
        return Err(ConfigError::ValidationError(
            "query.limit must be positive".to_string(),
        ));
    }
    if let Some(to) = config.query.creation_date_to {
        if to < config.query.creation_date_from {
            return Err(ConfigError::ValidationError(format!(
                "query.creation_date_to ({to}) is before query.creation_date_from ({})",
                config.query.creation_date_from
            )));
        }
    }
    if config.download.workers == 0 {
        return Err(ConfigError::ValidationError(
            "download.workers must be at least 1".to_string(),
        ));
    }
    if config.download.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "download.timeout_secs must be positive".to_string(),
        ));
    }
    Ok(())
}
