use std::sync::Arc;
use std::time::{Duration, Instant};

use ripa::destination::Destination;
use ripa::error::{ErrorKind, EtlError, EtlResult};
use ripa::etl_error;
use ripa::types::StopDocument;
use secrecy::SecretString;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::elasticsearch::client::ElasticsearchClient;
use crate::elasticsearch::metrics::{
    RIPA_ES_BULK_DURATION_SECONDS, RIPA_ES_REJECTED_DOCUMENTS_TOTAL, register_metrics,
};

/// Elasticsearch destination.
///
/// Documents are written with the `_bulk` API as `index` actions keyed by the document
/// identity, so a document written twice is overwritten in place. Items Elasticsearch rejects
/// are reported one error per document.
///
/// Cheaply cloneable; clones share one HTTP connection pool.
#[derive(Debug, Clone)]
pub struct ElasticsearchDestination {
    client: Arc<ElasticsearchClient>,
}

impl ElasticsearchDestination {
    /// Creates a destination for the cluster at `url`.
    pub fn new(
        url: impl Into<String>,
        username: Option<String>,
        password: Option<SecretString>,
        request_timeout: Duration,
    ) -> EtlResult<Self> {
        register_metrics();

        let client = ElasticsearchClient::new(url, username, password, request_timeout)?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    pub fn client(&self) -> &ElasticsearchClient {
        &self.client
    }
}

impl Destination for ElasticsearchDestination {
    fn name() -> &'static str {
        "elasticsearch"
    }

    async fn delete_index(&self, index_name: &str) -> EtlResult<()> {
        info!(index_name, url = self.client.base_url(), "deleting index");
        self.client.delete_index(index_name).await
    }

    async fn create_index(&self, index_name: &str, mappings: &Value) -> EtlResult<()> {
        info!(index_name, url = self.client.base_url(), "creating index");
        self.client.create_index(index_name, mappings).await
    }

    async fn write_documents(
        &self,
        index_name: &str,
        documents: Vec<StopDocument>,
    ) -> EtlResult<()> {
        if documents.is_empty() {
            return Ok(());
        }

        let started = Instant::now();
        let rejected = match self.client.bulk_index(index_name, &documents).await {
            Ok(rejected) => rejected,
            Err(err) => return Err(unwritten_batch_error(index_name, &documents, err)),
        };
        metrics::histogram!(RIPA_ES_BULK_DURATION_SECONDS, "index" => index_name.to_string())
            .record(started.elapsed().as_secs_f64());

        debug!(
            index_name,
            documents = documents.len(),
            rejected = rejected.len(),
            "bulk request completed"
        );

        if rejected.is_empty() {
            return Ok(());
        }

        metrics::counter!(RIPA_ES_REJECTED_DOCUMENTS_TOTAL, "index" => index_name.to_string())
            .increment(rejected.len() as u64);

        let errors: Vec<EtlError> = rejected
            .into_iter()
            .map(|document| {
                warn!(
                    index_name,
                    document_id = %document.id,
                    status = document.status,
                    reason = %document.reason,
                    "document rejected"
                );
                etl_error!(
                    ErrorKind::DestinationError,
                    "Document rejected by Elasticsearch",
                    format!(
                        "document `{}` in index `{index_name}` (status {}): {}",
                        document.id, document.status, document.reason
                    )
                )
            })
            .collect();

        Err(errors.into())
    }
}

/// Attributes a `_bulk` request that failed as a whole to every document it carried.
///
/// Each error keeps the kind of the request failure, so connection problems stay
/// [`ErrorKind::DestinationConnectionFailed`].
fn unwritten_batch_error(index_name: &str, documents: &[StopDocument], err: EtlError) -> EtlError {
    warn!(
        index_name,
        documents = documents.len(),
        error = %err,
        "bulk request failed, no document of the batch was written"
    );

    let kind = err.kind();
    let cause = err.detail().unwrap_or("no detail").to_string();
    let errors: Vec<EtlError> = documents
        .iter()
        .map(|document| {
            etl_error!(
                kind,
                "Document not written, bulk request failed",
                format!(
                    "document `{}` in index `{index_name}`: {cause}",
                    document.id()
                )
            )
        })
        .collect();

    errors.into()
}
