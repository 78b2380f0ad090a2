//! Telemetry for docdiff binaries and tests.

pub mod tracing;
