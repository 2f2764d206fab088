//! squash: cached, multi-plugin asset minimizer.
//!
//! Provides `squash optimize` to run the configured plugins over explicit
//! asset paths with a persistent result cache, and `squash cache` to inspect
//! or clear that cache.

#![warn(missing_docs)]

mod cache_cmd;
mod optimize;
mod settings;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// squash: cached, multi-plugin asset minimizer.
#[derive(Parser, Debug)]
#[command(name = "squash", version, about = "Cached multi-plugin asset minimizer")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `squash.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Optimize the given assets.
    Optimize(OptimizeArgs),
    /// Inspect or clear the result cache.
    Cache {
        /// Use this cache directory instead of the configured one.
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// The cache action to perform.
        #[command(subcommand)]
        action: CacheAction,
    },
}

/// Arguments for the `squash optimize` subcommand.
#[derive(Parser, Debug)]
pub struct OptimizeArgs {
    /// Asset files to optimize.
    #[arg(required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Directory the optimized assets are written to.
    #[arg(short, long, default_value = "dist")]
    pub out_dir: PathBuf,

    /// Disable the persistent cache for this run.
    #[arg(long)]
    pub no_cache: bool,

    /// Use this cache directory instead of the configured one.
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Only look up plugin programs inside this directory.
    #[arg(long)]
    pub tools_dir: Option<PathBuf>,

    /// Number of assets processed in parallel (default: one per CPU).
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Fail the run when a plugin fails (overrides `bail` in `squash.toml`).
    #[arg(long, conflicts_with = "no_bail")]
    pub bail: bool,

    /// Report plugin failures as warnings (overrides `bail` in `squash.toml`).
    #[arg(long)]
    pub no_bail: bool,

    /// Output format for the summary.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

impl OptimizeArgs {
    /// The bail policy requested on the command line, if any.
    pub fn bail_override(&self) -> Option<bool> {
        match (self.bail, self.no_bail) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

/// Cache maintenance actions.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    /// Print the resolved cache directory.
    Dir,
    /// Remove every cached result.
    Clear,
}

/// Summary output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Optimize(ref args) => optimize::run(args, &global),
        Command::Cache {
            ref cache_dir,
            action,
        } => cache_cmd::run(action, cache_dir.as_deref(), &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the stderr log subscriber. `SQUASH_LOG` overrides the level
/// implied by `--quiet` / `--verbose`.
fn init_logging(quiet: bool, verbose: bool) {
    let default = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_env("SQUASH_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
