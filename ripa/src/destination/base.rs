use serde_json::Value;
use std::future::Future;

use crate::error::EtlResult;
use crate::types::StopDocument;

/// A document store holding named indexes.
///
/// Implementations are constructed explicitly and handed to the pipeline; there is no
/// process-wide client. Writes are keyed by [`StopDocument::id`], so writing a document twice
/// leaves a single copy.
pub trait Destination {
    /// Returns the name of the destination.
    fn name() -> &'static str;

    /// Releases connections held by the destination. The default implementation is a no-op.
    fn shutdown(&self) -> impl Future<Output = EtlResult<()>> + Send {
        async { Ok(()) }
    }

    /// Deletes `index_name` and every document in it.
    ///
    /// Deleting an index that does not exist succeeds.
    fn delete_index(&self, index_name: &str) -> impl Future<Output = EtlResult<()>> + Send;

    /// Creates an empty index with the given mappings.
    fn create_index(
        &self,
        index_name: &str,
        mappings: &Value,
    ) -> impl Future<Output = EtlResult<()>> + Send;

    /// Writes a batch of documents, replacing documents with the same identity.
    ///
    /// Every document that was not written is reported as its own error whose detail names the
    /// document id, aggregated into one error when there are several. This holds when the whole
    /// batch fails too. Documents of the batch that were accepted stay written.
    fn write_documents(
        &self,
        index_name: &str,
        documents: Vec<StopDocument>,
    ) -> impl Future<Output = EtlResult<()>> + Send;
}
