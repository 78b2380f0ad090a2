use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Configuration of the diff pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    /// Capacity of the bounded channels between producers, the differ and the printer.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Whether each side is checked to be strictly ascending by id.
    #[serde(default = "default_check_order")]
    pub check_order: bool,
}

impl PipelineConfig {
    /// Default capacity of the bounded channels.
    pub const DEFAULT_CHANNEL_CAPACITY: usize = 128;

    /// Validates pipeline configuration settings.
    ///
    /// Ensures channel_capacity is non-zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.channel_capacity == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "pipeline.channel_capacity".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            check_order: default_check_order(),
        }
    }
}

fn default_channel_capacity() -> usize {
    PipelineConfig::DEFAULT_CHANNEL_CAPACITY
}

fn default_check_order() -> bool {
    true
}
