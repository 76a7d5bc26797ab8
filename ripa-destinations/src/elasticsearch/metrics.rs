use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};

static REGISTER_METRICS: Once = Once::new();

/// Duration of a `_bulk` request from send to parsed response. Labels: `index`.
pub const RIPA_ES_BULK_DURATION_SECONDS: &str = "ripa_es_bulk_duration_seconds";

/// Documents Elasticsearch rejected inside an otherwise successful `_bulk` request.
/// Labels: `index`.
pub const RIPA_ES_REJECTED_DOCUMENTS_TOTAL: &str = "ripa_es_rejected_documents_total";

/// Register Elasticsearch-specific metrics.
///
/// Safe to call multiple times; registration happens only once.
pub fn register_metrics() {
    REGISTER_METRICS.call_once(|| {
        describe_histogram!(
            RIPA_ES_BULK_DURATION_SECONDS,
            Unit::Seconds,
            "Duration of Elasticsearch _bulk requests, labeled by index"
        );

        describe_counter!(
            RIPA_ES_REJECTED_DOCUMENTS_TOTAL,
            Unit::Count,
            "Documents rejected by Elasticsearch in _bulk responses, labeled by index"
        );
    });
}
