//! The transformation pipeline.
//!
//! Plugins are independent alternatives, not a chain: each one receives the
//! original input. They run one after another in configuration order.

use std::sync::Arc;

use squash_common::{extension, replace_extension};
use squash_config::{normalize, MinimizerOptions};
use tracing::{debug, warn};

use crate::executor::PluginExecutor;
use crate::result::TransformResult;
use crate::sniff::{ContentSniffer, MagicSniffer};

/// Runs configured plugins over one input and collects their results.
#[derive(Clone)]
pub struct TransformPipeline {
    executor: Arc<dyn PluginExecutor>,
    sniffer: Arc<dyn ContentSniffer>,
}

impl TransformPipeline {
    /// Creates a pipeline using `executor` and the [`MagicSniffer`].
    pub fn new(executor: Arc<dyn PluginExecutor>) -> Self {
        Self {
            executor,
            sniffer: Arc::new(MagicSniffer),
        }
    }

    /// Replaces the content sniffer.
    pub fn with_sniffer(mut self, sniffer: Arc<dyn ContentSniffer>) -> Self {
        self.sniffer = sniffer;
        self
    }

    /// Applies every configured plugin to `input`.
    ///
    /// The first result is always the baseline: `filename` and `input`
    /// unchanged, carrying every error (invalid plugin entries, an unusable
    /// executor, failed plugins). It is followed by one generated result per
    /// successful plugin, in configuration order. With no valid plugins the
    /// baseline is returned alone.
    pub fn generate(
        &self,
        filename: &str,
        input: &Arc<[u8]>,
        options: &MinimizerOptions,
    ) -> Vec<TransformResult> {
        let mut baseline = TransformResult::baseline(filename, Arc::clone(input));
        let normalized = normalize(options);
        baseline.errors.extend(normalized.errors);

        if normalized.plugins.is_empty() {
            return vec![baseline];
        }

        if let Err(e) = self.executor.probe() {
            warn!(filename, error = %e, "plugin executor unavailable");
            baseline.errors.push(e.to_string());
            return vec![baseline];
        }

        let mut generated = Vec::with_capacity(normalized.plugins.len());
        for plugin in &normalized.plugins {
            match self.executor.execute(input, plugin) {
                Ok(output) => {
                    let name = self.output_filename(filename, &output.data);
                    debug!(
                        filename,
                        plugin = %plugin,
                        output = %name,
                        before = input.len(),
                        after = output.data.len(),
                        "plugin succeeded"
                    );
                    generated.push(TransformResult::generated(
                        name,
                        Arc::from(output.data),
                        output.warnings,
                    ));
                }
                Err(e) => {
                    warn!(filename, plugin = %plugin, error = %e, "plugin failed");
                    baseline.errors.push(format!("{plugin}: {e}"));
                }
            }
        }

        let mut results = Vec::with_capacity(1 + generated.len());
        results.push(baseline);
        results.extend(generated);
        results
    }

    /// Renames `filename` when the sniffed type of `data` disagrees with its
    /// extension. Unrecognized content keeps the original name.
    fn output_filename(&self, filename: &str, data: &[u8]) -> String {
        let Some(detected) = self.sniffer.sniff(data) else {
            return filename.to_string();
        };
        match extension(filename) {
            Some(ext) if ext == detected.ext => filename.to_string(),
            _ => replace_extension(filename, detected.ext),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use squash_config::{PluginEntry, PluginSpec};

    use crate::error::PipelineError;
    use crate::executor::PluginOutput;
    use crate::registry::PluginRegistry;
    use crate::result::ResultKind;
    use crate::sniff::FileType;

    const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR-original";
    const JPEG_BYTES: &[u8] = &[0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

    fn input() -> Arc<[u8]> {
        Arc::from(PNG_BYTES)
    }

    fn options(names: &[&str]) -> MinimizerOptions {
        MinimizerOptions::with_plugins(names.iter().map(|n| PluginEntry::named(*n)))
    }

    fn registry() -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        registry
            .register_fn("shrink", |input: &[u8], _: &PluginSpec| {
                Ok(input[..input.len() - 9].to_vec().into())
            })
            .register_fn("to-jpeg", |_: &[u8], _: &PluginSpec| Ok(JPEG_BYTES.to_vec().into()))
            .register_fn("to-text", |_: &[u8], _: &PluginSpec| Ok(b"plain".to_vec().into()))
            .register_fn("broken", |_: &[u8], _: &PluginSpec| {
                Err(PipelineError::Failed("unsupported format".to_string()))
            })
            .register_fn("noisy", |input: &[u8], _: &PluginSpec| {
                Ok(PluginOutput {
                    data: input.to_vec(),
                    warnings: vec!["palette truncated".to_string()],
                })
            });
        registry
    }

    fn pipeline() -> TransformPipeline {
        TransformPipeline::new(Arc::new(registry()))
    }

    struct Unavailable;

    impl PluginExecutor for Unavailable {
        fn probe(&self) -> Result<(), PipelineError> {
            Err(PipelineError::Unavailable {
                reason: "no plugin runtime".to_string(),
            })
        }

        fn execute(&self, _: &[u8], _: &PluginSpec) -> Result<PluginOutput, PipelineError> {
            panic!("execute must not be called when probe fails");
        }
    }

    #[test]
    fn empty_plugin_list_returns_baseline_only() {
        let input = input();
        let results = pipeline().generate("a.png", &input, &MinimizerOptions::default());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0], TransformResult::baseline("a.png", input.clone()));
        assert_eq!(&*results[0].data, PNG_BYTES);
    }

    #[test]
    fn baseline_then_generated_in_order() {
        let results = pipeline().generate("a.png", &input(), &options(&["shrink", "noisy"]));
        assert_eq!(results.len(), 3);
        assert!(results[0].kind.is_none());
        assert!(results[0].errors.is_empty());
        assert_eq!(results[1].kind, Some(ResultKind::Generated));
        assert_eq!(results[1].size(), PNG_BYTES.len() - 9);
        assert_eq!(results[2].warnings, vec!["palette truncated"]);
    }

    #[test]
    fn failing_plugin_is_isolated() {
        let results = pipeline().generate(
            "a.png",
            &input(),
            &options(&["shrink", "broken", "noisy"]),
        );
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].errors, vec!["broken: unsupported format"]);
        assert_eq!(results[1].size(), PNG_BYTES.len() - 9);
        assert_eq!(results[2].warnings, vec!["palette truncated"]);
        assert!(results[1..].iter().all(|r| r.errors.is_empty()));
    }

    #[test]
    fn all_plugins_failing_leaves_baseline() {
        let results = pipeline().generate("a.png", &input(), &options(&["broken", "missing"]));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].errors.len(), 2);
        assert_eq!(results[0].errors[1], "missing: unknown plugin 'missing'");
    }

    #[test]
    fn format_change_renames_output() {
        let results = pipeline().generate("input.png", &input(), &options(&["to-jpeg"]));
        assert_eq!(results[0].filename, "input.png");
        assert_eq!(results[1].filename, "input.jpg");
    }

    #[test]
    fn unrecognized_output_keeps_name() {
        let results = pipeline().generate("input.png", &input(), &options(&["to-text"]));
        assert_eq!(results[1].filename, "input.png");
    }

    #[test]
    fn matching_extension_is_case_insensitive() {
        let results = pipeline().generate("INPUT.PNG", &input(), &options(&["shrink"]));
        assert_eq!(results[1].filename, "INPUT.PNG");
    }

    #[test]
    fn every_plugin_sees_the_original_input() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = PluginRegistry::new();
        for name in ["first", "second"] {
            let seen = Arc::clone(&seen);
            registry.register_fn(name, move |input: &[u8], _: &PluginSpec| {
                seen.lock().unwrap().push(input.to_vec());
                Ok(b"changed".to_vec().into())
            });
        }
        TransformPipeline::new(Arc::new(registry)).generate(
            "a.png",
            &input(),
            &options(&["first", "second"]),
        );
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|s| s == PNG_BYTES));
    }

    #[test]
    fn unavailable_executor_degrades_to_baseline() {
        let results = TransformPipeline::new(Arc::new(Unavailable)).generate(
            "a.png",
            &input(),
            &options(&["shrink"]),
        );
        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].errors,
            vec!["plugin executor unavailable: no plugin runtime"]
        );
    }

    #[test]
    fn unavailable_executor_not_probed_without_plugins() {
        let results = TransformPipeline::new(Arc::new(Unavailable)).generate(
            "a.png",
            &input(),
            &MinimizerOptions::default(),
        );
        assert!(results[0].errors.is_empty());
    }

    #[test]
    fn normalization_errors_reach_baseline() {
        let opts = MinimizerOptions::with_plugins(vec![
            PluginEntry::named(""),
            PluginEntry::named("shrink"),
        ]);
        let results = pipeline().generate("a.png", &input(), &opts);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].errors, vec!["plugin #0: empty plugin name"]);
    }

    #[test]
    fn custom_sniffer() {
        struct AlwaysWebp;
        impl ContentSniffer for AlwaysWebp {
            fn sniff(&self, _: &[u8]) -> Option<FileType> {
                Some(FileType {
                    ext: "webp",
                    mime: "image/webp",
                })
            }
        }
        let results = pipeline()
            .with_sniffer(Arc::new(AlwaysWebp))
            .generate("photo", &input(), &options(&["shrink"]));
        assert_eq!(results[1].filename, "photo.webp");
    }
}
