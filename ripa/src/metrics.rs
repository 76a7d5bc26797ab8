//! Metric names recorded by the loader.

use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};

static REGISTER_METRICS: Once = Once::new();

/// Label carrying the target index name.
pub const INDEX_LABEL: &str = "index";

/// Label for error kind in metrics.
pub const ERROR_KIND_LABEL: &str = "error_kind";

/// Counter of documents the destination accepted. Labels: `index`.
pub const RIPA_DOCUMENTS_WRITTEN_TOTAL: &str = "ripa_documents_written_total";

/// Counter of batches the destination rejected in whole or in part. Labels: `index`.
pub const RIPA_BATCHES_FAILED_TOTAL: &str = "ripa_batches_failed_total";

/// Counter of source rows dropped under the skip policy. Labels: `index`, `error_kind`.
pub const RIPA_ROWS_SKIPPED_TOTAL: &str = "ripa_rows_skipped_total";

/// Duration of one batch submission. Labels: `index`.
pub const RIPA_BATCH_DURATION_SECONDS: &str = "ripa_batch_duration_seconds";

/// Registers metric descriptions. Only the first call has an effect.
pub fn register_metrics() {
    REGISTER_METRICS.call_once(|| {
        describe_counter!(
            RIPA_DOCUMENTS_WRITTEN_TOTAL,
            Unit::Count,
            "Documents accepted by the destination, labeled by index"
        );

        describe_counter!(
            RIPA_BATCHES_FAILED_TOTAL,
            Unit::Count,
            "Batches the destination rejected in whole or in part, labeled by index"
        );

        describe_counter!(
            RIPA_ROWS_SKIPPED_TOTAL,
            Unit::Count,
            "Source rows skipped because they could not be transformed, labeled by index and error kind"
        );

        describe_histogram!(
            RIPA_BATCH_DURATION_SECONDS,
            Unit::Seconds,
            "Duration of a batch submission to the destination, labeled by index"
        );
    });
}
