//! Parsing, validation, and normalization of `squash.toml` configuration.
//!
//! This crate reads the project configuration file and produces a
//! strongly-typed [`SquashConfig`]. Loosely-shaped plugin entries are turned
//! into validated [`PluginSpec`]s by [`normalize`].

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod normalize;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE};
pub use normalize::{normalize, Normalized, PluginSpec};
pub use types::*;
