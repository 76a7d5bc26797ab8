use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::destination::Destination;
use crate::error::{ErrorKind, EtlError, EtlResult};
use crate::etl_error;
use crate::types::StopDocument;

#[derive(Debug, Default)]
struct FaultState {
    rejected_ids: HashSet<String>,
    write_calls: u64,
    largest_batch: usize,
    writes_in_flight: usize,
    max_writes_in_flight: usize,
    shutdown_called: bool,
}

/// Wraps a destination, rejecting chosen documents and recording how it was driven.
///
/// Rejected documents fail with [`ErrorKind::DestinationError`] naming their id, the same way
/// a real store reports per-item failures; the rest of their batch is forwarded.
#[derive(Debug, Clone)]
pub struct FaultyDestination<D> {
    wrapped_destination: D,
    state: Arc<Mutex<FaultState>>,
}

impl<D> FaultyDestination<D> {
    pub fn wrap(destination: D) -> Self {
        Self {
            wrapped_destination: destination,
            state: Arc::new(Mutex::new(FaultState::default())),
        }
    }

    /// Makes every future write of the document with `id` fail.
    pub async fn reject_document(&self, id: &str) {
        self.state.lock().await.rejected_ids.insert(id.to_string());
    }

    pub async fn write_calls(&self) -> u64 {
        self.state.lock().await.write_calls
    }

    pub async fn largest_batch(&self) -> usize {
        self.state.lock().await.largest_batch
    }

    /// Highest number of batches that were being written at the same time.
    pub async fn max_writes_in_flight(&self) -> usize {
        self.state.lock().await.max_writes_in_flight
    }

    pub async fn shutdown_called(&self) -> bool {
        self.state.lock().await.shutdown_called
    }

    pub fn wrapped(&self) -> &D {
        &self.wrapped_destination
    }
}

impl<D> Destination for FaultyDestination<D>
where
    D: Destination + Send + Sync,
{
    fn name() -> &'static str {
        "faulty"
    }

    async fn shutdown(&self) -> EtlResult<()> {
        self.state.lock().await.shutdown_called = true;
        self.wrapped_destination.shutdown().await
    }

    async fn delete_index(&self, index_name: &str) -> EtlResult<()> {
        self.wrapped_destination.delete_index(index_name).await
    }

    async fn create_index(&self, index_name: &str, mappings: &Value) -> EtlResult<()> {
        self.wrapped_destination
            .create_index(index_name, mappings)
            .await
    }

    async fn write_documents(
        &self,
        index_name: &str,
        documents: Vec<StopDocument>,
    ) -> EtlResult<()> {
        let (accepted, errors) = {
            let mut state = self.state.lock().await;
            state.write_calls += 1;
            state.largest_batch = state.largest_batch.max(documents.len());
            state.writes_in_flight += 1;
            state.max_writes_in_flight = state.max_writes_in_flight.max(state.writes_in_flight);

            let mut accepted = Vec::with_capacity(documents.len());
            let mut errors: Vec<EtlError> = Vec::new();
            for document in documents {
                if state.rejected_ids.contains(document.id().as_str()) {
                    errors.push(etl_error!(
                        ErrorKind::DestinationError,
                        "Document rejected by the destination",
                        format!("document `{}` in index `{index_name}`", document.id())
                    ));
                } else {
                    accepted.push(document);
                }
            }

            (accepted, errors)
        };

        // Give sibling batches a chance to start so overlap is observable.
        tokio::task::yield_now().await;

        let result = self
            .wrapped_destination
            .write_documents(index_name, accepted)
            .await;

        self.state.lock().await.writes_in_flight -= 1;

        result?;
        if !errors.is_empty() {
            return Err(errors.into());
        }

        Ok(())
    }
}
