//! One end-to-end load: recreate the index, transform the source, write the documents.

use ripa_config::shared::PipelineConfig;
use tracing::info;

use crate::destination::Destination;
use crate::error::{ErrorKind, EtlResult};
use crate::etl_error;
use crate::index::recreate_index;
use crate::load::{LoadSummary, Loader};
use crate::metrics::register_metrics;
use crate::producer::DocumentProducer;
use crate::transform::RowTransformer;
use crate::types::RawRecord;

/// Loads stop records into the configured index of `destination`.
///
/// The destination is owned by the pipeline and closed by [`Pipeline::shutdown`].
#[derive(Debug)]
pub struct Pipeline<D> {
    config: PipelineConfig,
    transformer: RowTransformer,
    destination: D,
}

impl<D> Pipeline<D>
where
    D: Destination + Clone + Send + Sync + 'static,
{
    /// Validates `config` and resolves its timezone.
    pub fn new(config: PipelineConfig, destination: D) -> EtlResult<Self> {
        config.validate().map_err(|err| {
            etl_error!(
                ErrorKind::ConfigError,
                "Invalid pipeline configuration",
                err.to_string(),
                source: err
            )
        })?;
        let transformer = RowTransformer::from_timezone_name(&config.timezone)?;

        Ok(Self {
            config,
            transformer,
            destination,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn destination(&self) -> &D {
        &self.destination
    }

    /// Replaces the index with one holding a document per record of `records`.
    ///
    /// The index is recreated before the first record is read, so a failed run leaves the
    /// documents written up to the failure and nothing from earlier runs.
    pub async fn run<I>(&self, records: I) -> EtlResult<LoadSummary>
    where
        I: IntoIterator<Item = EtlResult<RawRecord>>,
        I::IntoIter: Send + 'static,
    {
        register_metrics();

        let index_name = self.config.index_name.as_str();
        info!(
            index_name,
            destination = D::name(),
            timezone = %self.transformer.timezone(),
            max_batch_size = self.config.batch.max_size,
            max_concurrent_batches = self.config.batch.max_concurrent_batches,
            "starting load"
        );

        recreate_index(&self.destination, index_name, self.transformer.schema()).await?;

        let producer = DocumentProducer::new(records.into_iter(), self.transformer);
        let loader = Loader::new(
            self.destination.clone(),
            index_name,
            self.config.batch.clone(),
            self.config.row_errors,
        );

        loader.load(producer).await
    }

    /// Closes the destination.
    pub async fn shutdown(self) -> EtlResult<()> {
        info!(destination = D::name(), "shutting down destination");
        self.destination.shutdown().await
    }
}
