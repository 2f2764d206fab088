//! Multi-plugin transformation pipeline.
//!
//! [`TransformPipeline::generate`] runs every configured plugin against the
//! same input and returns the untouched input as a baseline result followed
//! by one result per successful plugin. Plugin failures never escape the
//! pipeline: they are recorded in the baseline's `errors`.

#![warn(missing_docs)]

pub mod command;
pub mod error;
pub mod executor;
pub mod pipeline;
pub mod registry;
pub mod result;
pub mod sniff;

pub use command::CommandExecutor;
pub use error::PipelineError;
pub use executor::{PluginExecutor, PluginOutput};
pub use pipeline::TransformPipeline;
pub use registry::{Plugin, PluginRegistry};
pub use result::{select_smallest, ResultKind, TransformResult};
pub use sniff::{ContentSniffer, FileType, MagicSniffer};
