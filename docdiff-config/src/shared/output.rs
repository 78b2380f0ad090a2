use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Rendering used for emitted diffs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// One tab-separated, human-readable line per diff.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!(
                "{other} is not a supported output format. Use either `text` or `json`."
            )),
        }
    }
}

/// Which diff classifications are rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DiffModes {
    #[serde(default)]
    pub unchanged: bool,
    #[serde(default = "enabled")]
    pub created: bool,
    #[serde(default = "enabled")]
    pub updated: bool,
    #[serde(default = "enabled")]
    pub deleted: bool,
}

impl Default for DiffModes {
    fn default() -> Self {
        Self {
            unchanged: false,
            created: true,
            updated: true,
            deleted: true,
        }
    }
}

fn enabled() -> bool {
    true
}

/// Configuration of the diff output.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub modes: DiffModes,
}

impl OutputConfig {
    /// Validates output configuration settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let DiffModes {
            unchanged,
            created,
            updated,
            deleted,
        } = self.modes;

        if !(unchanged || created || updated || deleted) {
            return Err(ValidationError::NoDiffModesEnabled);
        }

        Ok(())
    }
}
