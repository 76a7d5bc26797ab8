//! Batched, concurrent submission of documents to a destination.

use metrics::{counter, histogram};
use ripa_config::shared::{BatchConfig, RowErrorPolicy};
use std::mem;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::{self, JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::destination::Destination;
use crate::error::{EtlError, EtlResult};
use crate::metrics::{
    ERROR_KIND_LABEL, INDEX_LABEL, RIPA_BATCH_DURATION_SECONDS, RIPA_BATCHES_FAILED_TOTAL,
    RIPA_DOCUMENTS_WRITTEN_TOTAL, RIPA_ROWS_SKIPPED_TOTAL,
};
use crate::types::StopDocument;

/// Outcome of a successful load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub documents_written: u64,
    /// Rows dropped under [`RowErrorPolicy::Skip`].
    pub rows_skipped: u64,
    pub batches: u64,
}

#[derive(Debug)]
struct BatchOutcome {
    documents: usize,
    result: EtlResult<()>,
}

/// Accumulates what the load has seen so far.
#[derive(Debug, Default)]
struct LoadState {
    summary: LoadSummary,
    errors: Vec<EtlError>,
}

impl LoadState {
    /// Records a failure, flattening aggregates so each document failure stays its own entry.
    fn push_error(&mut self, err: EtlError) {
        match err.errors() {
            Some(errors) => self.errors.extend(errors.iter().cloned()),
            None => self.errors.push(err),
        }
    }
}

/// Submits documents in batches of `max_size`, keeping at most `max_concurrent_batches` in
/// flight.
///
/// A failing batch does not stop its siblings. Once the source is drained (or abandoned under
/// [`RowErrorPolicy::Abort`]) every in-flight batch is awaited and all failures are returned
/// together.
#[derive(Debug, Clone)]
pub struct Loader<D> {
    destination: D,
    index_name: String,
    batch: BatchConfig,
    row_errors: RowErrorPolicy,
}

impl<D> Loader<D>
where
    D: Destination + Clone + Send + Sync + 'static,
{
    pub fn new(
        destination: D,
        index_name: impl Into<String>,
        batch: BatchConfig,
        row_errors: RowErrorPolicy,
    ) -> Self {
        Self {
            destination,
            index_name: index_name.into(),
            batch,
            row_errors,
        }
    }

    /// Drains `documents` into the destination.
    ///
    /// The source is iterated on the blocking thread pool, since reading and transforming rows
    /// does file I/O and CPU work. Documents reach the batching loop through a channel bounded
    /// by `max_size`, so a slow destination also pauses the source.
    ///
    /// Under [`RowErrorPolicy::Abort`] the first row error stops consumption; documents read
    /// before it are still written and the load then fails with that error plus any write
    /// failures. Under [`RowErrorPolicy::Skip`] row errors are logged and counted.
    pub async fn load<I>(&self, documents: I) -> EtlResult<LoadSummary>
    where
        I: IntoIterator<Item = EtlResult<StopDocument>> + Send + 'static,
    {
        let max_size = self.batch.max_size.max(1);
        let mut in_flight = JoinSet::new();
        let mut state = LoadState::default();
        let mut pending = Vec::with_capacity(max_size);

        let (items_tx, mut items_rx) = mpsc::channel(max_size);
        let source = task::spawn_blocking(move || {
            for item in documents {
                // The receiver is gone once the load aborts.
                if items_tx.blocking_send(item).is_err() {
                    break;
                }
            }
        });

        let mut row = 0u64;
        while let Some(item) = items_rx.recv().await {
            row += 1;
            match item {
                Ok(document) => {
                    pending.push(document);
                    if pending.len() >= max_size {
                        let batch = mem::replace(&mut pending, Vec::with_capacity(max_size));
                        self.submit(&mut in_flight, &mut state, batch).await;
                    }
                }
                Err(err) => match self.row_errors {
                    RowErrorPolicy::Abort => {
                        error!(row, error = %err, "row could not be transformed, aborting load");
                        state.push_error(err);
                        break;
                    }
                    RowErrorPolicy::Skip => {
                        warn!(row, error = %err, "skipping row that could not be transformed");
                        counter!(
                            RIPA_ROWS_SKIPPED_TOTAL,
                            INDEX_LABEL => self.index_name.clone(),
                            ERROR_KIND_LABEL => format!("{:?}", err.kind())
                        )
                        .increment(1);
                        state.summary.rows_skipped += 1;
                    }
                },
            }
        }
        drop(items_rx);

        if let Err(err) = source.await {
            error!(error = %err, "source task did not complete");
            state.push_error(err.into());
        }

        if !pending.is_empty() {
            self.submit(&mut in_flight, &mut state, pending).await;
        }

        while let Some(joined) = in_flight.join_next().await {
            self.record_outcome(&mut state, joined);
        }

        let LoadState { summary, errors } = state;
        if !errors.is_empty() {
            error!(
                index_name = %self.index_name,
                failures = errors.len(),
                documents_written = summary.documents_written,
                "load failed"
            );
            return Err(errors.into());
        }

        info!(
            index_name = %self.index_name,
            documents_written = summary.documents_written,
            rows_skipped = summary.rows_skipped,
            batches = summary.batches,
            "load finished"
        );

        Ok(summary)
    }

    async fn submit(
        &self,
        in_flight: &mut JoinSet<BatchOutcome>,
        state: &mut LoadState,
        batch: Vec<StopDocument>,
    ) {
        let max_concurrent = self.batch.max_concurrent_batches.max(1);
        while in_flight.len() >= max_concurrent {
            match in_flight.join_next().await {
                Some(joined) => self.record_outcome(state, joined),
                None => break,
            }
        }

        state.summary.batches += 1;
        let batch_number = state.summary.batches;
        let destination = self.destination.clone();
        let index_name = self.index_name.clone();

        debug!(batch_number, documents = batch.len(), "submitting batch");
        in_flight.spawn(async move {
            let documents = batch.len();
            let started = Instant::now();
            let result = destination.write_documents(&index_name, batch).await;
            histogram!(RIPA_BATCH_DURATION_SECONDS, INDEX_LABEL => index_name)
                .record(started.elapsed().as_secs_f64());

            BatchOutcome { documents, result }
        });
    }

    fn record_outcome(&self, state: &mut LoadState, joined: Result<BatchOutcome, JoinError>) {
        match joined {
            Ok(BatchOutcome {
                documents,
                result: Ok(()),
            }) => {
                counter!(RIPA_DOCUMENTS_WRITTEN_TOTAL, INDEX_LABEL => self.index_name.clone())
                    .increment(documents as u64);
                state.summary.documents_written += documents as u64;
            }
            Ok(BatchOutcome {
                documents,
                result: Err(err),
            }) => {
                let written = written_in_failed_batch(documents, &err);
                error!(documents, written, error = %err, "batch failed");
                counter!(RIPA_BATCHES_FAILED_TOTAL, INDEX_LABEL => self.index_name.clone())
                    .increment(1);
                counter!(RIPA_DOCUMENTS_WRITTEN_TOTAL, INDEX_LABEL => self.index_name.clone())
                    .increment(written as u64);
                state.summary.documents_written += written as u64;
                state.push_error(err);
            }
            Err(err) => {
                error!(error = %err, "batch task did not complete");
                state.push_error(err.into());
            }
        }
    }
}

/// Returns how many documents of a failed batch were still written.
///
/// Destinations report one error per document that was not written.
fn written_in_failed_batch(documents: usize, err: &EtlError) -> usize {
    let failed = err.errors().map_or(1, <[EtlError]>::len);
    documents.saturating_sub(failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::memory::MemoryDestination;
    use crate::error::ErrorKind;
    use crate::etl_error;
    use crate::schema::STOP_SCHEMA;
    use crate::test_utils::faulty_destination::FaultyDestination;
    use crate::test_utils::records::stop_record;
    use crate::transform::RowTransformer;

    fn documents(count: usize) -> Vec<EtlResult<StopDocument>> {
        let transformer = RowTransformer::default();
        (0..count)
            .map(|index| transformer.transform(&stop_record(&index.to_string(), "1")))
            .collect()
    }

    async fn prepared() -> FaultyDestination<MemoryDestination> {
        let destination = MemoryDestination::new();
        destination
            .create_index("stops", &STOP_SCHEMA.index_mappings())
            .await
            .unwrap();
        FaultyDestination::wrap(destination)
    }

    fn batch(max_size: usize, max_concurrent_batches: usize) -> BatchConfig {
        BatchConfig {
            max_size,
            max_concurrent_batches,
        }
    }

    #[tokio::test]
    async fn splits_documents_into_bounded_batches() {
        let destination = prepared().await;
        let loader = Loader::new(destination.clone(), "stops", batch(3, 2), RowErrorPolicy::Abort);

        let summary = loader.load(documents(10)).await.unwrap();

        assert_eq!(
            summary,
            LoadSummary {
                documents_written: 10,
                rows_skipped: 0,
                batches: 4,
            }
        );
        assert_eq!(destination.write_calls().await, 4);
        assert_eq!(destination.largest_batch().await, 3);
        assert!(destination.max_writes_in_flight().await <= 2);
        assert_eq!(destination.wrapped().documents("stops").await.len(), 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn never_exceeds_the_concurrency_limit() {
        let destination = prepared().await;
        let loader = Loader::new(destination.clone(), "stops", batch(1, 3), RowErrorPolicy::Abort);

        loader.load(documents(40)).await.unwrap();

        assert!(destination.max_writes_in_flight().await <= 3);
        assert_eq!(destination.write_calls().await, 40);
    }

    #[tokio::test]
    async fn rejected_documents_are_named_and_siblings_still_land() {
        let destination = prepared().await;
        destination.reject_document("31").await;
        destination.reject_document("71").await;
        let loader = Loader::new(destination.clone(), "stops", batch(2, 2), RowErrorPolicy::Abort);

        let err = loader.load(documents(10)).await.unwrap_err();

        assert_eq!(err.kinds(), vec![ErrorKind::DestinationError; 2]);
        let mut details: Vec<_> = err
            .errors()
            .unwrap()
            .iter()
            .filter_map(|err| err.detail().map(str::to_string))
            .collect();
        details.sort();
        assert!(details[0].contains("`31`"));
        assert!(details[1].contains("`71`"));
        assert_eq!(destination.wrapped().documents("stops").await.len(), 8);
    }

    #[tokio::test]
    async fn abort_policy_stops_at_the_first_row_error() {
        let destination = prepared().await;
        let loader = Loader::new(destination.clone(), "stops", batch(2, 1), RowErrorPolicy::Abort);
        let mut items = documents(6);
        items[3] = Err(etl_error!(ErrorKind::ConversionError, "Invalid stop date"));

        let err = loader.load(items).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConversionError);
        assert_eq!(destination.wrapped().documents("stops").await.len(), 3);
    }

    #[tokio::test]
    async fn skip_policy_counts_and_continues() {
        let destination = prepared().await;
        let loader = Loader::new(destination.clone(), "stops", batch(2, 2), RowErrorPolicy::Skip);
        let mut items = documents(6);
        items[1] = Err(etl_error!(ErrorKind::SchemaViolation, "Required column is missing"));
        items[4] = Err(etl_error!(ErrorKind::ConversionError, "Invalid stop time"));

        let summary = loader.load(items).await.unwrap();

        assert_eq!(summary.documents_written, 4);
        assert_eq!(summary.rows_skipped, 2);
        assert_eq!(summary.batches, 2);
    }

    #[tokio::test]
    async fn empty_source_writes_nothing() {
        let destination = prepared().await;
        let loader = Loader::new(destination.clone(), "stops", batch(5, 2), RowErrorPolicy::Abort);

        let summary = loader
            .load(Vec::<EtlResult<StopDocument>>::new())
            .await
            .unwrap();

        assert_eq!(summary, LoadSummary::default());
        assert_eq!(destination.write_calls().await, 0);
    }

    #[tokio::test]
    async fn source_is_read_off_the_runtime_thread() {
        let destination = prepared().await;
        let loader = Loader::new(destination.clone(), "stops", batch(2, 2), RowErrorPolicy::Abort);
        let runtime_thread = std::thread::current().id();
        let reader_threads = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));

        let threads = reader_threads.clone();
        let items = documents(4).into_iter().inspect(move |_| {
            threads.lock().unwrap().push(std::thread::current().id());
        });
        let summary = loader.load(items).await.unwrap();

        assert_eq!(summary.documents_written, 4);
        let reader_threads = reader_threads.lock().unwrap();
        assert_eq!(reader_threads.len(), 4);
        assert!(reader_threads.iter().all(|thread| *thread != runtime_thread));
    }

    #[test]
    fn failed_batches_count_the_documents_that_were_accepted() {
        let one_rejected = etl_error!(
            ErrorKind::DestinationError,
            "Document rejected",
            "document `31`"
        );
        let two_rejected: EtlError = vec![
            etl_error!(ErrorKind::DestinationError, "Document rejected", "document `31`"),
            etl_error!(ErrorKind::DestinationError, "Document rejected", "document `41`"),
        ]
        .into();

        assert_eq!(written_in_failed_batch(5, &one_rejected), 4);
        assert_eq!(written_in_failed_batch(5, &two_rejected), 3);
        assert_eq!(written_in_failed_batch(1, &two_rejected), 0);
    }

    #[tokio::test]
    async fn batches_failing_as_a_whole_name_each_document() {
        let destination = FaultyDestination::wrap(MemoryDestination::new());
        let loader = Loader::new(destination.clone(), "missing", batch(3, 1), RowErrorPolicy::Abort);

        let err = loader.load(documents(3)).await.unwrap_err();

        assert_eq!(err.kinds(), vec![ErrorKind::DestinationError; 3]);
        let details: Vec<&str> = err
            .errors()
            .unwrap()
            .iter()
            .filter_map(|err| err.detail())
            .collect();
        assert!(details[0].contains("`01`"));
        assert!(details[2].contains("`21`"));
    }
}
