//! Failures while reading `squash.toml`.

/// Why a `squash.toml` could not be turned into a [`SquashConfig`](crate::SquashConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The file is not valid TOML, or does not match the expected shape.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A `[minimizer]` table is present but lists no plugins.
    #[error("no plugins found in [minimizer]")]
    NoPlugins,

    /// A value parsed but is not usable, e.g. a plugin entry without a name.
    #[error("validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_no_plugins() {
        assert_eq!(
            format!("{}", ConfigError::NoPlugins),
            "no plugins found in [minimizer]"
        );
    }

    #[test]
    fn display_parse_error() {
        let err = ConfigError::ParseError("expected '=' at line 3".to_string());
        assert_eq!(
            format!("{err}"),
            "failed to parse configuration: expected '=' at line 3"
        );
    }

    #[test]
    fn display_validation_error() {
        let err = ConfigError::ValidationError("plugin #0: empty plugin name".to_string());
        assert_eq!(
            format!("{err}"),
            "validation error: plugin #0: empty plugin name"
        );
    }

    #[test]
    fn display_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::IoError(io_err);
        assert!(format!("{err}").starts_with("failed to read configuration:"));
    }
}
