use serde::{Deserialize, Serialize};

use crate::shared::{BatchConfig, ValidationError};

/// What the loader does when a source row cannot be transformed.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RowErrorPolicy {
    /// Stop reading the source at the first bad row and fail the load.
    #[default]
    Abort,
    /// Log the bad row, count it, and keep loading.
    Skip,
}

fn default_index_name() -> String {
    PipelineConfig::DEFAULT_INDEX_NAME.to_string()
}

fn default_timezone() -> String {
    PipelineConfig::DEFAULT_TIMEZONE.to_string()
}

/// Settings of one load run.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Name of the index that is dropped and recreated on every run.
    #[serde(default = "default_index_name")]
    pub index_name: String,
    /// IANA timezone in which the source's naive stop date and time are expressed.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Bulk submission settings.
    #[serde(default)]
    pub batch: BatchConfig,
    /// Handling of rows that fail to transform.
    #[serde(default)]
    pub row_errors: RowErrorPolicy,
}

impl PipelineConfig {
    /// Index used for the San Diego police department stops dataset.
    pub const DEFAULT_INDEX_NAME: &'static str = "sd-ripa-ca0371100";

    /// Timezone of the San Diego stops dataset.
    pub const DEFAULT_TIMEZONE: &'static str = "America/Los_Angeles";

    /// Validates the index name and batch settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let index_name = self.index_name.as_str();
        let invalid_index_name = index_name.is_empty()
            || index_name != index_name.to_lowercase()
            || index_name.starts_with(['-', '_', '+'])
            || index_name.contains(['\\', '/', '*', '?', '"', '<', '>', '|', ' ', ',', '#']);

        if invalid_index_name {
            return Err(ValidationError::InvalidFieldValue {
                field: "pipeline.index_name".to_string(),
                constraint: "must be a non-empty lowercase index name without special characters"
                    .to_string(),
            });
        }

        self.batch.validate()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            index_name: default_index_name(),
            timezone: default_timezone(),
            batch: BatchConfig::default(),
            row_errors: RowErrorPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pipeline_targets_san_diego_index() {
        let config = PipelineConfig::default();
        assert_eq!(config.index_name, "sd-ripa-ca0371100");
        assert_eq!(config.timezone, "America/Los_Angeles");
        assert_eq!(config.row_errors, RowErrorPolicy::Abort);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_invalid_index_names() {
        for name in ["", "Stops", "_stops", "stops/2022", "a b"] {
            let config = PipelineConfig {
                index_name: name.to_string(),
                ..PipelineConfig::default()
            };
            assert!(config.validate().is_err(), "{name:?} should be rejected");
        }
    }
}
