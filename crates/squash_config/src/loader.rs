//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::normalize::normalize;
use crate::types::SquashConfig;
use std::path::Path;

/// Name of the configuration file looked up in a project directory.
pub const CONFIG_FILE: &str = "squash.toml";

/// Loads and validates `squash.toml` from a project directory.
pub fn load_config(project_dir: &Path) -> Result<SquashConfig, ConfigError> {
    load_config_file(&project_dir.join(CONFIG_FILE))
}

/// Loads and validates a configuration file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<SquashConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<SquashConfig, ConfigError> {
    let config: SquashConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// A file that declares `[minimizer]` must list at least one valid plugin.
///
/// Programmatic callers that build options in code skip this check; an empty
/// list there simply means "no transformation".
fn validate_config(config: &SquashConfig) -> Result<(), ConfigError> {
    if let crate::types::CacheSetting::Dir(dir) = &config.cache {
        if dir.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "cache directory must not be empty".to_string(),
            ));
        }
    }
    if let Some(minimizer) = &config.minimizer {
        if minimizer.plugins.is_empty() {
            return Err(ConfigError::NoPlugins);
        }
        let normalized = normalize(minimizer);
        if !normalized.errors.is_empty() {
            return Err(ConfigError::ValidationError(normalized.errors.join("; ")));
        }
    }
    Ok(())
}
