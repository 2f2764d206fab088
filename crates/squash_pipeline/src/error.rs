//! Error types for plugin execution.

/// Errors produced while locating or running plugins.
///
/// These never cross the [`generate`](crate::TransformPipeline::generate)
/// boundary as `Err`; they are rendered into result `errors` instead.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The execution facility as a whole cannot be used.
    #[error("plugin executor unavailable: {reason}")]
    Unavailable {
        /// Why the facility could not be loaded.
        reason: String,
    },

    /// No plugin with this name is registered.
    #[error("unknown plugin '{0}'")]
    UnknownPlugin(String),

    /// The program backing a plugin could not be found.
    #[error("command '{command}' not found: {reason}")]
    CommandNotFound {
        /// The command that was looked up.
        command: String,
        /// Description of the lookup failure.
        reason: String,
    },

    /// The program backing a plugin could not be started.
    #[error("failed to run '{command}': {source}")]
    Spawn {
        /// The command that failed to start.
        command: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The program exited unsuccessfully.
    #[error("'{command}' exited with {status}: {stderr}")]
    ExitStatus {
        /// The command that failed.
        command: String,
        /// The exit status, as displayed by the platform.
        status: String,
        /// Trimmed standard error output.
        stderr: String,
    },

    /// An in-process plugin rejected its input.
    #[error("{0}")]
    Failed(String),

    /// An I/O error while exchanging data with a plugin.
    #[error("plugin I/O error: {0}")]
    Io(#[from] std::io::Error),
}
