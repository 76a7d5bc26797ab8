use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Batching of documents submitted to the destination.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BatchConfig {
    /// Maximum number of documents in one bulk submission.
    #[serde(default = "default_batch_max_size")]
    pub max_size: usize,
    /// Maximum number of bulk submissions in flight at the same time.
    #[serde(default = "default_max_concurrent_batches")]
    pub max_concurrent_batches: usize,
}

impl BatchConfig {
    /// Default maximum batch size, matching the bulk helper chunk size of common clients.
    pub const DEFAULT_MAX_SIZE: usize = 500;

    /// Default number of concurrent bulk submissions.
    pub const DEFAULT_MAX_CONCURRENT_BATCHES: usize = 4;

    /// Ensures both limits are non-zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_size == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "batch.max_size".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        if self.max_concurrent_batches == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "batch.max_concurrent_batches".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_size: default_batch_max_size(),
            max_concurrent_batches: default_max_concurrent_batches(),
        }
    }
}

fn default_batch_max_size() -> usize {
    BatchConfig::DEFAULT_MAX_SIZE
}

fn default_max_concurrent_batches() -> usize {
    BatchConfig::DEFAULT_MAX_CONCURRENT_BATCHES
}
