use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use ripa::error::{ErrorKind, EtlError, EtlResult};
use ripa::etl_error;
use ripa::types::StopDocument;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

/// Content type of `_bulk` request bodies.
const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// A document Elasticsearch refused inside a `_bulk` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedDocument {
    pub id: String,
    pub status: u16,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    errors: bool,
    #[serde(default)]
    items: Vec<BulkAction>,
}

#[derive(Debug, Deserialize)]
struct BulkAction {
    index: BulkItem,
}

#[derive(Debug, Deserialize)]
struct BulkItem {
    #[serde(rename = "_id")]
    id: Option<String>,
    status: u16,
    error: Option<BulkItemError>,
}

#[derive(Debug, Deserialize)]
struct BulkItemError {
    #[serde(rename = "type")]
    kind: String,
    reason: Option<String>,
}

/// Thin client for the Elasticsearch REST endpoints the loader needs.
///
/// Sends basic auth on every request when a username is configured.
#[derive(Debug)]
pub struct ElasticsearchClient {
    http: reqwest::Client,
    base_url: String,
    username: Option<String>,
    password: Option<SecretString>,
}

impl ElasticsearchClient {
    pub fn new(
        url: impl Into<String>,
        username: Option<String>,
        password: Option<SecretString>,
        request_timeout: Duration,
    ) -> EtlResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|err| {
                etl_error!(
                    ErrorKind::ConfigError,
                    "Elasticsearch HTTP client could not be built",
                    err.to_string(),
                    source: err
                )
            })?;

        Ok(Self {
            http,
            base_url: url.into().trim_end_matches('/').to_string(),
            username,
            password,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Checks that the cluster answers.
    pub async fn ping(&self) -> EtlResult<()> {
        let response = self
            .request(Method::GET, "")
            .send()
            .await
            .map_err(|err| request_error(err, "Elasticsearch connectivity check failed"))?;

        ensure_success(response, "Elasticsearch connectivity check failed").await?;
        Ok(())
    }

    /// Deletes `index_name`. A missing index is not an error.
    pub(crate) async fn delete_index(&self, index_name: &str) -> EtlResult<()> {
        let response = self
            .request(Method::DELETE, index_name)
            .send()
            .await
            .map_err(|err| request_error(err, "Elasticsearch index deletion failed"))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(index_name, "index to delete does not exist");
            return Ok(());
        }

        ensure_success(response, "Elasticsearch index deletion failed").await?;
        Ok(())
    }

    /// Creates `index_name` with the given field mappings.
    pub(crate) async fn create_index(&self, index_name: &str, mappings: &Value) -> EtlResult<()> {
        let response = self
            .request(Method::PUT, index_name)
            .json(&json!({ "mappings": mappings }))
            .send()
            .await
            .map_err(|err| request_error(err, "Elasticsearch index creation failed"))?;

        ensure_success(response, "Elasticsearch index creation failed").await?;
        Ok(())
    }

    /// Indexes `documents` in one `_bulk` request and returns the ones that were rejected.
    pub(crate) async fn bulk_index(
        &self,
        index_name: &str,
        documents: &[StopDocument],
    ) -> EtlResult<Vec<RejectedDocument>> {
        let body = bulk_body(index_name, documents)?;

        let response = self
            .request(Method::POST, "_bulk")
            .header(reqwest::header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|err| request_error(err, "Elasticsearch bulk request failed"))?;
        let response = ensure_success(response, "Elasticsearch bulk request failed").await?;

        let bulk: BulkResponse = response.json().await.map_err(|err| {
            etl_error!(
                ErrorKind::DestinationError,
                "Elasticsearch bulk response could not be parsed",
                err.to_string(),
                source: err
            )
        })?;

        if !bulk.errors {
            return Ok(Vec::new());
        }

        // Items come back in request order, which also covers items without an `_id`.
        let rejected = bulk
            .items
            .into_iter()
            .zip(documents)
            .filter_map(|(action, document)| {
                let item = action.index;
                item.error.map(|error| RejectedDocument {
                    id: item.id.unwrap_or_else(|| document.id().to_string()),
                    status: item.status,
                    reason: match error.reason {
                        Some(reason) => format!("{}: {reason}", error.kind),
                        None => error.kind,
                    },
                })
            })
            .collect();

        Ok(rejected)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self
            .http
            .request(method, format!("{}/{path}", self.base_url));

        match &self.username {
            Some(username) => request.basic_auth(
                username,
                self.password.as_ref().map(|password| password.expose_secret()),
            ),
            None => request,
        }
    }
}

/// Builds the NDJSON body: an `index` action line followed by the document line, per document.
fn bulk_body(index_name: &str, documents: &[StopDocument]) -> EtlResult<Vec<u8>> {
    let mut body = Vec::new();

    for document in documents {
        let action = json!({ "index": { "_index": index_name, "_id": document.id().as_str() } });
        serde_json::to_writer(&mut body, &action)?;
        body.push(b'\n');
        serde_json::to_writer(&mut body, document)?;
        body.push(b'\n');
    }

    Ok(body)
}

fn request_error(err: reqwest::Error, description: &'static str) -> EtlError {
    let kind = if err.is_connect() || err.is_timeout() {
        ErrorKind::DestinationConnectionFailed
    } else {
        ErrorKind::DestinationError
    };

    etl_error!(kind, description, err.to_string(), source: err)
}

async fn ensure_success(response: Response, description: &'static str) -> EtlResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unable to read body>".to_string());

    Err(etl_error!(
        ErrorKind::DestinationError,
        description,
        format!("status {status}: {body}")
    ))
}
