//! Configuration lookup shared by CLI commands.

use std::path::{Path, PathBuf};

use squash_cache::{CacheLocation, KeyPart};
use squash_config::{
    load_config, load_config_file, CacheSetting, PluginSpec, SquashConfig, CONFIG_FILE,
};
use tracing::debug;

use crate::GlobalArgs;

/// Loads `--config`, or `squash.toml` from the current directory, or the
/// defaults when neither exists.
pub fn load_settings(global: &GlobalArgs) -> Result<SquashConfig, Box<dyn std::error::Error>> {
    if let Some(ref path) = global.config {
        return Ok(load_config_file(Path::new(path))?);
    }
    let cwd = std::env::current_dir()?;
    if cwd.join(CONFIG_FILE).is_file() {
        return Ok(load_config(&cwd)?);
    }
    debug!("no {CONFIG_FILE} in {}, using defaults", cwd.display());
    Ok(SquashConfig::default())
}

/// Combines the configured cache setting with command-line overrides.
pub fn cache_location(
    setting: &CacheSetting,
    no_cache: bool,
    cache_dir: Option<&Path>,
) -> CacheLocation {
    if no_cache {
        return CacheLocation::Disabled;
    }
    if let Some(dir) = cache_dir {
        return CacheLocation::Explicit(dir.to_path_buf());
    }
    match setting {
        CacheSetting::Flag(false) => CacheLocation::Disabled,
        CacheSetting::Flag(true) => CacheLocation::Default,
        CacheSetting::Dir(dir) => CacheLocation::Explicit(PathBuf::from(dir)),
    }
}

/// Cache-key part describing the plugin configuration.
pub fn plugins_key(plugins: &[PluginSpec]) -> KeyPart {
    KeyPart::List(
        plugins
            .iter()
            .map(|plugin| {
                KeyPart::Map(
                    [
                        ("name".to_string(), KeyPart::from(plugin.name.as_str())),
                        ("command".to_string(), KeyPart::from(plugin.command.as_str())),
                        ("args".to_string(), KeyPart::from(plugin.args.clone())),
                    ]
                    .into_iter()
                    .collect(),
                )
            })
            .collect(),
    )
}
