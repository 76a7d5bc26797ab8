use ripa_config::load_config;
use ripa_config::shared::LoaderConfig;

use crate::error::{LoaderError, LoaderResult};

/// Loads and validates the loader configuration.
pub fn load_loader_config() -> LoaderResult<LoaderConfig> {
    let config = load_config::<LoaderConfig>().map_err(LoaderError::config)?;
    config.validate().map_err(LoaderError::config)?;

    Ok(config)
}
