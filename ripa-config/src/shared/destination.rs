use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

const fn default_request_timeout_ms() -> u64 {
    DestinationConfig::DEFAULT_REQUEST_TIMEOUT_MS
}

/// Document store the loader writes into.
///
/// This intentionally does not implement [`Serialize`] to avoid accidentally
/// leaking secrets in the config into serialized forms.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationConfig {
    /// In-memory index, useful for dry runs over a source file.
    Memory,
    /// Elasticsearch (or API-compatible) cluster reached over HTTP.
    Elasticsearch {
        /// Base URL of the cluster, e.g. `http://localhost:9200`.
        url: String,
        /// Username for basic authentication.
        username: Option<String>,
        /// Password for basic authentication.
        password: Option<SecretString>,
        /// Timeout applied to every HTTP request, in milliseconds.
        #[serde(default = "default_request_timeout_ms")]
        request_timeout_ms: u64,
    },
}

impl DestinationConfig {
    /// Default timeout of a single request to the document store.
    pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

    /// Validates credentials and timeouts.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            DestinationConfig::Memory => Ok(()),
            DestinationConfig::Elasticsearch {
                url,
                username,
                password,
                request_timeout_ms,
            } => {
                if url.trim().is_empty() {
                    return Err(ValidationError::InvalidFieldValue {
                        field: "destination.elasticsearch.url".to_string(),
                        constraint: "must not be empty".to_string(),
                    });
                }

                if password.is_some() && username.is_none() {
                    return Err(ValidationError::PasswordWithoutUsername);
                }

                if *request_timeout_ms == 0 {
                    return Err(ValidationError::InvalidFieldValue {
                        field: "destination.elasticsearch.request_timeout_ms".to_string(),
                        constraint: "must be greater than 0".to_string(),
                    });
                }

                Ok(())
            }
        }
    }
}

/// Same as [`DestinationConfig`] but without secrets, safe to serialize and log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationConfigWithoutSecrets {
    Memory,
    Elasticsearch {
        url: String,
        username: Option<String>,
        request_timeout_ms: u64,
    },
}

impl From<DestinationConfig> for DestinationConfigWithoutSecrets {
    fn from(value: DestinationConfig) -> Self {
        match value {
            DestinationConfig::Memory => DestinationConfigWithoutSecrets::Memory,
            DestinationConfig::Elasticsearch {
                url,
                username,
                password: _,
                request_timeout_ms,
            } => DestinationConfigWithoutSecrets::Elasticsearch {
                url,
                username,
                request_timeout_ms,
            },
        }
    }
}
