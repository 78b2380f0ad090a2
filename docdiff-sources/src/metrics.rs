use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};

static REGISTER_METRICS: Once = Once::new();

/// Duration of a single request sent to Elasticsearch.
/// Labels: `operation` (`info`, `search`, `scroll`, `clear_scroll`).
pub const DOCDIFF_ES_REQUEST_DURATION_SECONDS: &str = "docdiff_es_request_duration_seconds";

/// Number of lines read from NDJSON files, including blank lines.
pub const DOCDIFF_NDJSON_LINES_READ_TOTAL: &str = "docdiff_ndjson_lines_read_total";

/// Label key for the Elasticsearch operation.
pub const OPERATION_LABEL: &str = "operation";

/// Register producer-specific metrics.
///
/// Safe to call multiple times, registration happens only once.
pub fn register_metrics() {
    REGISTER_METRICS.call_once(|| {
        describe_histogram!(
            DOCDIFF_ES_REQUEST_DURATION_SECONDS,
            Unit::Seconds,
            "Duration of requests sent to Elasticsearch, labeled by operation"
        );

        describe_counter!(
            DOCDIFF_NDJSON_LINES_READ_TOTAL,
            Unit::Count,
            "Number of lines read from NDJSON record files"
        );
    });
}
