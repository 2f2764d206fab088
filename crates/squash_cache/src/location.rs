//! Cache directory resolution.

use std::path::PathBuf;

/// Name of the cache directory created under the platform cache location.
pub const CACHE_NAME: &str = "squash";

/// Where durable cache entries live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLocation {
    /// No durable cache; only the identity cache is consulted.
    Disabled,
    /// The platform default, see [`default_cache_dir`].
    Default,
    /// An explicit directory.
    Explicit(PathBuf),
}

impl CacheLocation {
    /// Returns the cache directory, or `None` when caching is disabled.
    pub fn resolve(&self) -> Option<PathBuf> {
        match self {
            CacheLocation::Disabled => None,
            CacheLocation::Default => Some(default_cache_dir()),
            CacheLocation::Explicit(dir) => Some(dir.clone()),
        }
    }
}

/// The per-user cache directory, falling back to the system temp directory.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(CACHE_NAME)
}
