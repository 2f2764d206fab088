//! The plugin execution facility.

use squash_config::PluginSpec;

use crate::error::PipelineError;

/// Bytes produced by a plugin, plus any warnings it emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginOutput {
    /// The transformed bytes.
    pub data: Vec<u8>,
    /// Non-fatal diagnostics.
    pub warnings: Vec<String>,
}

impl From<Vec<u8>> for PluginOutput {
    fn from(data: Vec<u8>) -> Self {
        Self {
            data,
            warnings: Vec::new(),
        }
    }
}

/// Runs plugins against input bytes.
///
/// Implementations may wrap native resources that are not reentrant, so the
/// pipeline calls `execute` sequentially within one `generate` call.
pub trait PluginExecutor: Send + Sync {
    /// Checks that the facility can run plugins at all.
    fn probe(&self) -> Result<(), PipelineError> {
        Ok(())
    }

    /// Runs `plugin` against `input`.
    fn execute(&self, input: &[u8], plugin: &PluginSpec) -> Result<PluginOutput, PipelineError>;
}
