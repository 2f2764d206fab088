//! In-process plugin registry.

use std::collections::HashMap;
use std::sync::Arc;

use squash_config::PluginSpec;

use crate::error::PipelineError;
use crate::executor::{PluginExecutor, PluginOutput};

/// A transformation implemented in-process.
pub trait Plugin: Send + Sync {
    /// Transforms `input`. `spec` carries the configured arguments.
    fn run(&self, input: &[u8], spec: &PluginSpec) -> Result<PluginOutput, PipelineError>;
}

struct FnPlugin<F>(F);

impl<F> Plugin for FnPlugin<F>
where
    F: Fn(&[u8], &PluginSpec) -> Result<PluginOutput, PipelineError> + Send + Sync,
{
    fn run(&self, input: &[u8], spec: &PluginSpec) -> Result<PluginOutput, PipelineError> {
        (self.0)(input, spec)
    }
}

/// A [`PluginExecutor`] dispatching on plugin name to registered plugins.
#[derive(Default, Clone)]
pub struct PluginRegistry {
    plugins: HashMap<String, Arc<dyn Plugin>>,
}

impl PluginRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `plugin` under `name`, replacing any previous registration.
    pub fn register(&mut self, name: impl Into<String>, plugin: Arc<dyn Plugin>) -> &mut Self {
        self.plugins.insert(name.into(), plugin);
        self
    }

    /// Registers a closure under `name`.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&[u8], &PluginSpec) -> Result<PluginOutput, PipelineError> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(FnPlugin(f)))
    }

    /// Returns `true` if a plugin is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Number of registered plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl PluginExecutor for PluginRegistry {
    fn execute(&self, input: &[u8], plugin: &PluginSpec) -> Result<PluginOutput, PipelineError> {
        let registered = self
            .plugins
            .get(&plugin.name)
            .ok_or_else(|| PipelineError::UnknownPlugin(plugin.name.clone()))?;
        registered.run(input, plugin)
    }
}
