//! Configuration types deserialized from `squash.toml`.

use serde::Deserialize;
use std::collections::BTreeMap;

/// The top-level configuration parsed from `squash.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct SquashConfig {
    /// Where (and whether) transformation results are cached on disk.
    #[serde(default)]
    pub cache: CacheSetting,
    /// Plugin configuration. `None` when the file has no `[minimizer]` table.
    #[serde(default)]
    pub minimizer: Option<MinimizerOptions>,
    /// Treat plugin failures as errors. When `false` they are reported as
    /// warnings and do not fail the run.
    #[serde(default)]
    pub bail: bool,
}

/// The `cache` setting: `false`, `true`, or an explicit directory.
///
/// Uses serde's untagged enum so the TOML value can be written as either a
/// boolean or a path string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CacheSetting {
    /// `true` selects the default cache directory, `false` disables caching.
    Flag(bool),
    /// An explicit cache directory.
    Dir(String),
}

impl Default for CacheSetting {
    fn default() -> Self {
        CacheSetting::Flag(true)
    }
}

/// Options for the transformation pipeline.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MinimizerOptions {
    /// Plugins to run, in order. Each one is applied to the original input.
    #[serde(default)]
    pub plugins: Vec<PluginEntry>,
}

impl MinimizerOptions {
    /// Creates options from a list of plugin entries.
    pub fn with_plugins(plugins: impl IntoIterator<Item = PluginEntry>) -> Self {
        Self {
            plugins: plugins.into_iter().collect(),
        }
    }
}

/// A single, not yet validated, plugin entry.
///
/// Accepts `"optipng"`, `["optipng", { o = 5 }]`, or a table with optional
/// `name`, `command`, `args`, and `options` keys.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PluginEntry {
    /// A bare plugin name.
    Name(String),
    /// A plugin name paired with an options table.
    WithOptions(String, BTreeMap<String, toml::Value>),
    /// The fully spelled-out table form.
    Table(PluginTable),
}

impl PluginEntry {
    /// Shorthand for [`PluginEntry::Name`].
    pub fn named(name: impl Into<String>) -> Self {
        PluginEntry::Name(name.into())
    }
}

/// Table form of a plugin entry. Every field is optional here; missing or
/// inconsistent values are reported during normalization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PluginTable {
    /// The plugin name. Falls back to `command` when absent.
    #[serde(default)]
    pub name: Option<String>,
    /// The program to run. Defaults to the plugin name.
    #[serde(default)]
    pub command: Option<String>,
    /// Extra arguments passed before any option arguments.
    #[serde(default)]
    pub args: Vec<String>,
    /// Plugin options, rendered as `--key=value` arguments.
    #[serde(default)]
    pub options: BTreeMap<String, toml::Value>,
}
