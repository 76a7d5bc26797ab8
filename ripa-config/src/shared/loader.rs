use serde::{Deserialize, Serialize};

use crate::Config;
use crate::shared::{
    DestinationConfig, DestinationConfigWithoutSecrets, PipelineConfig, ValidationError,
};

/// Complete configuration of the loader binary.
///
/// This intentionally does not implement [`Serialize`] to avoid accidentally
/// leaking secrets in the config into serialized forms.
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    /// Where documents are written.
    pub destination: DestinationConfig,
    /// How the run is performed.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl LoaderConfig {
    /// Validates every section of the configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.destination.validate()?;
        self.pipeline.validate()
    }
}

impl Config for LoaderConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &[];
}

/// Same as [`LoaderConfig`] but without secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfigWithoutSecrets {
    pub destination: DestinationConfigWithoutSecrets,
    pub pipeline: PipelineConfig,
}

impl From<LoaderConfig> for LoaderConfigWithoutSecrets {
    fn from(value: LoaderConfig) -> Self {
        LoaderConfigWithoutSecrets {
            destination: value.destination.into(),
            pipeline: value.pipeline,
        }
    }
}
