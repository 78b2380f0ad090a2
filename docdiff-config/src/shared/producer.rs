use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Configuration shared by every producer backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProducerConfig {
    /// Number of records fetched per round trip.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// How long, in seconds, a remote cursor is kept alive between two fetches.
    #[serde(default = "default_scroll_keepalive_secs")]
    pub scroll_keepalive_secs: u64,
    /// Timeout, in seconds, of a single request to a remote store.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ProducerConfig {
    /// Default number of records fetched per round trip.
    pub const DEFAULT_BATCH_SIZE: usize = 100;

    /// Default cursor keepalive in seconds.
    pub const DEFAULT_SCROLL_KEEPALIVE_SECS: u64 = 60;

    /// Default request timeout in seconds.
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

    pub fn scroll_keepalive(&self) -> Duration {
        Duration::from_secs(self.scroll_keepalive_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validates producer configuration settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let positive = [
            ("producer.batch_size", self.batch_size as u64),
            ("producer.scroll_keepalive_secs", self.scroll_keepalive_secs),
            ("producer.request_timeout_secs", self.request_timeout_secs),
        ];

        for (field, value) in positive {
            if value == 0 {
                return Err(ValidationError::InvalidFieldValue {
                    field: field.to_string(),
                    constraint: "must be greater than 0".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            scroll_keepalive_secs: default_scroll_keepalive_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_batch_size() -> usize {
    ProducerConfig::DEFAULT_BATCH_SIZE
}

fn default_scroll_keepalive_secs() -> u64 {
    ProducerConfig::DEFAULT_SCROLL_KEEPALIVE_SECS
}

fn default_request_timeout_secs() -> u64 {
    ProducerConfig::DEFAULT_REQUEST_TIMEOUT_SECS
}
