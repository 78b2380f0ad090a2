//! Shared configuration types for diff runs.

mod base;
mod diff;
mod output;
mod pipeline;
mod producer;

pub use base::ValidationError;
pub use diff::DiffConfig;
pub use output::{DiffModes, OutputConfig, OutputFormat};
pub use pipeline::PipelineConfig;
pub use producer::ProducerConfig;
