use std::fs::File;
use std::path::Path;
use std::time::Duration;

use ripa::destination::Destination;
use ripa::destination::memory::MemoryDestination;
use ripa::error::EtlResult;
use ripa::load::LoadSummary;
use ripa::pipeline::Pipeline;
use ripa::source::CsvSource;
use ripa_config::shared::{
    DestinationConfig, LoaderConfig, LoaderConfigWithoutSecrets, PipelineConfig,
};
use ripa_destinations::elasticsearch::ElasticsearchDestination;
use tracing::{debug, info, warn};

/// Loads `source_path` into the destination described by `loader_config`.
///
/// The destination is built here and closed when the run ends, whether it succeeded or not.
pub async fn run_loader(loader_config: LoaderConfig, source_path: &Path) -> EtlResult<LoadSummary> {
    info!(source = %source_path.display(), "starting loader");

    let without_secrets = LoaderConfigWithoutSecrets::from(loader_config.clone());
    debug!(config = ?without_secrets, "loaded configuration");

    let source = CsvSource::from_path(source_path)?;
    let LoaderConfig {
        destination,
        pipeline,
    } = loader_config;

    // Static dispatch per destination keeps the pipeline monomorphic.
    match destination {
        DestinationConfig::Memory => {
            let destination = MemoryDestination::new();
            let summary = run_pipeline(pipeline, destination.clone(), source).await?;
            info!(
                indexes = ?destination.index_names().await,
                "dry run finished, documents were kept in memory only"
            );
            Ok(summary)
        }
        DestinationConfig::Elasticsearch {
            url,
            username,
            password,
            request_timeout_ms,
        } => {
            let destination = ElasticsearchDestination::new(
                url,
                username,
                password,
                Duration::from_millis(request_timeout_ms),
            )?;
            destination.client().ping().await?;

            run_pipeline(pipeline, destination, source).await
        }
    }
}

async fn run_pipeline<D>(
    config: PipelineConfig,
    destination: D,
    source: CsvSource<File>,
) -> EtlResult<LoadSummary>
where
    D: Destination + Clone + Send + Sync + 'static,
{
    let pipeline = Pipeline::new(config, destination)?;
    let result = pipeline.run(source).await;

    if let Err(err) = pipeline.shutdown().await {
        warn!(error = %err, "destination did not shut down cleanly");
    }

    result
}
