//! Metrics definitions for diff monitoring.
//!
//! Metrics are emitted through the [`metrics`] facade, binaries decide whether a recorder is
//! installed.

/// Label for the diff classification in metrics.
pub const MODE_LABEL: &str = "mode";

/// Label for the merge input in metrics.
pub const SIDE_LABEL: &str = "side";

/// Label for error kind in metrics.
pub const ERROR_KIND_LABEL: &str = "error_kind";

/// Counter for records forwarded by producer workers.
pub const DOCDIFF_RECORDS_RECEIVED_TOTAL: &str = "docdiff_records_received_total";

/// Counter for diffs emitted by the engine.
pub const DOCDIFF_DIFFS_EMITTED_TOTAL: &str = "docdiff_diffs_emitted_total";

/// Counter for diffs written by the printer.
pub const DOCDIFF_DIFFS_PRINTED_TOTAL: &str = "docdiff_diffs_printed_total";

/// Counter for faults reported by workers.
pub const DOCDIFF_FAULTS_TOTAL: &str = "docdiff_faults_total";
