use serde::{Deserialize, Serialize};

use crate::load::Config;
use crate::shared::{OutputConfig, PipelineConfig, ProducerConfig, ValidationError};

/// Complete configuration of a diff run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DiffConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub producer: ProducerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl DiffConfig {
    /// Validates every section of the configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.pipeline.validate()?;
        self.producer.validate()?;
        self.output.validate()?;

        Ok(())
    }
}

impl Config for DiffConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &[];
}
