use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::bail;
use crate::destination::Destination;
use crate::error::{ErrorKind, EtlError, EtlResult};
use crate::etl_error;
use crate::types::{DocumentId, StopDocument};

#[derive(Debug, Default)]
struct MemoryIndex {
    mappings: Value,
    documents: BTreeMap<DocumentId, StopDocument>,
}

#[derive(Debug, Default)]
struct Inner {
    indexes: HashMap<String, MemoryIndex>,
}

/// In-memory destination for tests and dry runs.
///
/// Mirrors the store semantics the loader relies on: deleting a missing index succeeds, writing
/// to a missing index fails, and documents are keyed by identity. Everything is lost when the
/// process exits.
#[derive(Debug, Clone, Default)]
pub struct MemoryDestination {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryDestination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the documents of `index_name` ordered by identity.
    pub async fn documents(&self, index_name: &str) -> Vec<StopDocument> {
        let inner = self.inner.lock().await;
        inner
            .indexes
            .get(index_name)
            .map(|index| index.documents.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the mappings `index_name` was created with.
    pub async fn mappings(&self, index_name: &str) -> Option<Value> {
        let inner = self.inner.lock().await;
        inner
            .indexes
            .get(index_name)
            .map(|index| index.mappings.clone())
    }

    pub async fn index_names(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        let mut names: Vec<_> = inner.indexes.keys().cloned().collect();
        names.sort_unstable();
        names
    }
}

impl Destination for MemoryDestination {
    fn name() -> &'static str {
        "memory"
    }

    async fn delete_index(&self, index_name: &str) -> EtlResult<()> {
        let mut inner = self.inner.lock().await;

        match inner.indexes.remove(index_name) {
            Some(index) => info!(
                index_name,
                documents = index.documents.len(),
                "deleted index"
            ),
            None => debug!(index_name, "index to delete does not exist"),
        }

        Ok(())
    }

    async fn create_index(&self, index_name: &str, mappings: &Value) -> EtlResult<()> {
        let mut inner = self.inner.lock().await;

        if inner.indexes.contains_key(index_name) {
            bail!(
                ErrorKind::DestinationError,
                "Index already exists",
                format!("index `{index_name}`")
            );
        }

        info!(index_name, "creating index");
        inner.indexes.insert(
            index_name.to_string(),
            MemoryIndex {
                mappings: mappings.clone(),
                documents: BTreeMap::new(),
            },
        );

        Ok(())
    }

    async fn write_documents(
        &self,
        index_name: &str,
        documents: Vec<StopDocument>,
    ) -> EtlResult<()> {
        let mut inner = self.inner.lock().await;

        let Some(index) = inner.indexes.get_mut(index_name) else {
            let errors: Vec<EtlError> = documents
                .iter()
                .map(|document| {
                    etl_error!(
                        ErrorKind::DestinationError,
                        "Index does not exist",
                        format!("document `{}` in index `{index_name}`", document.id())
                    )
                })
                .collect();
            if errors.is_empty() {
                return Ok(());
            }
            return Err(errors.into());
        };

        debug!(index_name, count = documents.len(), "writing documents");
        for document in documents {
            index.documents.insert(document.id().clone(), document);
        }

        Ok(())
    }
}
