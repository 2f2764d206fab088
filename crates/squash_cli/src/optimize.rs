//! `squash optimize`: the cache-aware optimization driver.
//!
//! Each asset goes through get -> (on miss) generate -> store on its own;
//! assets are processed in parallel, while the plugins for one asset run
//! sequentially inside the pipeline.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rayon::prelude::*;
use serde::Serialize;
use squash_cache::{ArtifactCache, CacheEntry, CacheKey, KeyPart, Payload, RawBytes};
use squash_common::ContentHash;
use squash_config::{normalize, MinimizerOptions};
use squash_pipeline::{select_smallest, CommandExecutor, PluginExecutor, TransformPipeline};
use tracing::{error, info, warn};

use crate::settings::{cache_location, load_settings, plugins_key};
use crate::{GlobalArgs, OptimizeArgs, ReportFormat};

/// Version component of every cache key, so upgrades never reuse stale results.
const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Outcome for one asset.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssetReport {
    /// The input path.
    pub input: String,
    /// Where the result was written, if it was.
    pub output: Option<String>,
    /// Input size in bytes.
    pub original_size: usize,
    /// Output size in bytes.
    pub optimized_size: usize,
    /// Whether the result came from the cache.
    pub cached: bool,
    /// Warnings from the plugins, and plugin failures when not bailing.
    pub warnings: Vec<String>,
    /// Failures: I/O, cache writes, and plugin failures when bailing.
    pub errors: Vec<String>,
}

/// Everything an asset needs, shared across worker threads.
pub struct Context {
    cache: ArtifactCache<RawBytes>,
    pipeline: TransformPipeline,
    options: MinimizerOptions,
    plugins_key: KeyPart,
    out_dir: PathBuf,
    /// Inputs below this directory keep their relative directory in `out_dir`.
    base_dir: PathBuf,
    bail: bool,
    /// Output paths already written during this run.
    claimed: Mutex<HashSet<PathBuf>>,
}

impl Context {
    /// Builds a context from explicit parts. Inputs are laid out relative to
    /// the current directory and plugin failures are warnings.
    pub fn new(
        cache: ArtifactCache<RawBytes>,
        executor: Arc<dyn PluginExecutor>,
        options: MinimizerOptions,
        out_dir: PathBuf,
    ) -> Self {
        let plugins_key = plugins_key(&normalize(&options).plugins);
        Self {
            cache,
            pipeline: TransformPipeline::new(executor),
            options,
            plugins_key,
            out_dir,
            base_dir: std::env::current_dir().unwrap_or_default(),
            bail: false,
            claimed: Mutex::new(HashSet::new()),
        }
    }

    /// Sets the directory input paths are made relative to.
    pub fn with_base_dir(mut self, base_dir: PathBuf) -> Self {
        self.base_dir = base_dir;
        self
    }

    /// Sets whether plugin failures are errors.
    pub fn with_bail(mut self, bail: bool) -> Self {
        self.bail = bail;
        self
    }

    fn cache_key(&self, path: &Path, input: &[u8]) -> CacheKey {
        CacheKey::new(vec![
            KeyPart::from(TOOL_VERSION),
            self.plugins_key.clone(),
            KeyPart::from(path.display().to_string()),
            KeyPart::from(ContentHash::from_bytes(input)),
        ])
    }

    /// Directory under `out_dir` for `input`: its parent relative to
    /// `base_dir`, or `out_dir` itself when the input lies elsewhere.
    fn output_dir(&self, input: &Path) -> PathBuf {
        let absolute = self.base_dir.join(input);
        let relative_parent = absolute
            .strip_prefix(&self.base_dir)
            .ok()
            .filter(|rel| rel.components().all(|c| matches!(c, Component::Normal(_))))
            .and_then(Path::parent);
        match relative_parent {
            Some(parent) => self.out_dir.join(parent),
            None => self.out_dir.clone(),
        }
    }

    /// Reserves `output` for one asset. Returns `false` if another asset of
    /// this run already wrote there.
    fn claim(&self, output: &Path) -> bool {
        self.claimed.lock().insert(output.to_path_buf())
    }
}

/// Runs the `optimize` command. Returns the process exit code.
pub fn run(args: &OptimizeArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_settings(global)?;
    let bail = args.bail_override().unwrap_or(config.bail);
    let options = config.minimizer.unwrap_or_default();
    if options.plugins.is_empty() {
        warn!("no plugins configured, assets are copied unchanged");
    }

    let location = cache_location(&config.cache, args.no_cache, args.cache_dir.as_deref());
    let executor: Arc<dyn PluginExecutor> = match &args.tools_dir {
        Some(dir) => Arc::new(CommandExecutor::with_tools_dir(dir)),
        None => Arc::new(CommandExecutor::new()),
    };
    let ctx = Context::new(
        ArtifactCache::new(&location),
        executor,
        options,
        args.out_dir.clone(),
    )
    .with_bail(bail);

    std::fs::create_dir_all(&ctx.out_dir)?;

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = args.jobs {
        builder = builder.num_threads(jobs);
    }
    let pool = builder.build()?;
    let reports: Vec<AssetReport> = pool.install(|| {
        args.files
            .par_iter()
            .map(|path| process(&ctx, path))
            .collect()
    });

    print_reports(&reports, args.format, global.quiet)?;
    Ok(exit_code(&reports))
}

/// `1` if any asset reported an error, else `0`.
pub fn exit_code(reports: &[AssetReport]) -> i32 {
    let failed = reports.iter().filter(|r| !r.errors.is_empty()).count();
    if failed > 0 {
        error!("{failed} of {} asset(s) reported errors", reports.len());
        return 1;
    }
    0
}

/// Optimizes one asset. Failures are recorded in the report, never returned.
pub fn process(ctx: &Context, path: &Path) -> AssetReport {
    let mut report = AssetReport {
        input: path.display().to_string(),
        ..AssetReport::default()
    };

    let input: Arc<[u8]> = match std::fs::read(path) {
        Ok(bytes) => Arc::from(bytes),
        Err(e) => {
            report.errors.push(format!("failed to read {}: {e}", report.input));
            return report;
        }
    };
    report.original_size = input.len();
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| report.input.clone());

    let mut entry = CacheEntry::new(Arc::clone(&input), ctx.cache_key(path, &input));
    let mut plugin_failures = Vec::new();
    let payload = match ctx.cache.get(&entry) {
        Some(hit) => {
            report.cached = true;
            hit
        }
        None => {
            let results = ctx.pipeline.generate(&filename, &input, &ctx.options);
            if let Some(baseline) = results.first() {
                plugin_failures.extend(baseline.errors.iter().cloned());
            }
            let Some(best) = select_smallest(&results) else {
                report.errors.push("pipeline produced no result".to_string());
                return report;
            };
            let payload = Payload {
                filename: best.filename.clone(),
                compressed: best.data.to_vec(),
                warnings: results
                    .iter()
                    .flat_map(|r| r.warnings.iter().cloned())
                    .collect(),
            };

            // Results with plugin failures are not cached so the next run retries.
            if plugin_failures.is_empty() {
                entry.set_payload(payload.clone());
                if let Err(e) = ctx.cache.store(&entry) {
                    report.errors.push(format!("failed to write cache: {e}"));
                }
            }
            payload
        }
    };

    report.optimized_size = payload.compressed.len();
    report.warnings = payload.warnings;
    if ctx.bail {
        report.errors.extend(plugin_failures);
    } else {
        report.warnings.extend(plugin_failures);
    }

    let output = ctx.output_dir(path).join(&payload.filename);
    if !ctx.claim(&output) {
        report.errors.push(format!(
            "output {} is also produced by another asset",
            output.display()
        ));
    } else if let Err(e) = write_output(&output, &payload.compressed) {
        report
            .errors
            .push(format!("failed to write {}: {e}", output.display()));
    } else {
        report.output = Some(output.display().to_string());
    }

    for warning in &report.warnings {
        warn!(asset = %report.input, "{warning}");
    }
    for err in &report.errors {
        error!(asset = %report.input, "{err}");
    }
    report
}

fn write_output(output: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(dir) = output.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(output, data)
}

fn print_reports(
    reports: &[AssetReport],
    format: ReportFormat,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(reports)?),
        ReportFormat::Text if quiet => {}
        ReportFormat::Text => {
            for report in reports {
                let Some(output) = &report.output else {
                    continue;
                };
                let saved = if report.original_size == 0 {
                    0.0
                } else {
                    100.0 * (1.0 - report.optimized_size as f64 / report.original_size as f64)
                };
                let cached = if report.cached { " (cached)" } else { "" };
                println!(
                    "{} -> {output}: {} -> {} bytes, {saved:.1}% saved{cached}",
                    report.input, report.original_size, report.optimized_size
                );
            }
            let total_before: usize = reports.iter().map(|r| r.original_size).sum();
            let total_after: usize = reports.iter().map(|r| r.optimized_size).sum();
            info!("{} asset(s): {total_before} -> {total_after} bytes", reports.len());
        }
    }
    Ok(())
}
