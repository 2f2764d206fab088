//! Normalization of loose plugin entries into validated plugin specs.
//!
//! Invalid entries never abort normalization: they are dropped and described
//! in [`Normalized::errors`] so the caller can surface them next to the
//! results of the plugins that did run.

use std::collections::BTreeMap;
use std::fmt;

use crate::types::{MinimizerOptions, PluginEntry};

/// A validated plugin invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSpec {
    /// The plugin name, used in error messages and registry lookups.
    pub name: String,
    /// The program to run for command-backed plugins.
    pub command: String,
    /// Arguments, with option arguments appended in key order.
    pub args: Vec<String>,
}

impl PluginSpec {
    /// Creates a spec whose command is the plugin name and which takes no arguments.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            command: name.clone(),
            name,
            args: Vec::new(),
        }
    }
}

impl fmt::Display for PluginSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Output of [`normalize`].
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    /// Valid plugins, in configuration order.
    pub plugins: Vec<PluginSpec>,
    /// One message per rejected entry.
    pub errors: Vec<String>,
}

/// Validates every plugin entry of `options`.
pub fn normalize(options: &MinimizerOptions) -> Normalized {
    let mut out = Normalized::default();
    for (index, entry) in options.plugins.iter().enumerate() {
        match normalize_entry(entry) {
            Ok(spec) => out.plugins.push(spec),
            Err(reason) => out.errors.push(format!("plugin #{index}: {reason}")),
        }
    }
    out
}

fn normalize_entry(entry: &PluginEntry) -> Result<PluginSpec, String> {
    match entry {
        PluginEntry::Name(name) => Ok(PluginSpec::new(checked_name(name)?)),
        PluginEntry::WithOptions(name, options) => {
            let mut spec = PluginSpec::new(checked_name(name)?);
            spec.args = option_args(options)?;
            Ok(spec)
        }
        PluginEntry::Table(table) => {
            let name = match (&table.name, &table.command) {
                (Some(name), _) => checked_name(name)?,
                (None, Some(command)) => checked_name(command)?,
                (None, None) => return Err("missing `name`".to_string()),
            };
            let command = match &table.command {
                Some(command) if command.trim().is_empty() => {
                    return Err(format!("`{name}` has an empty command"));
                }
                Some(command) => command.trim().to_string(),
                None => name.clone(),
            };
            let mut args = table.args.clone();
            args.extend(option_args(&table.options)?);
            Ok(PluginSpec {
                name,
                command,
                args,
            })
        }
    }
}

fn checked_name(name: &str) -> Result<String, String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("empty plugin name".to_string());
    }
    Ok(trimmed.to_string())
}

/// Renders options as `--key=value` arguments in key order.
///
/// `true` becomes a bare `--key` flag and `false` is omitted.
fn option_args(options: &BTreeMap<String, toml::Value>) -> Result<Vec<String>, String> {
    let mut args = Vec::with_capacity(options.len());
    for (key, value) in options {
        match value {
            toml::Value::String(s) => args.push(format!("--{key}={s}")),
            toml::Value::Integer(i) => args.push(format!("--{key}={i}")),
            toml::Value::Float(f) => args.push(format!("--{key}={f}")),
            toml::Value::Boolean(true) => args.push(format!("--{key}")),
            toml::Value::Boolean(false) => {}
            other => {
                return Err(format!(
                    "option `{key}` has unsupported type {}",
                    other.type_str()
                ));
            }
        }
    }
    Ok(args)
}
