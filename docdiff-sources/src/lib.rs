//! Record producers for docdiff.
//!
//! Provides implementations of the [`docdiff::producer::Producer`] contract that read sorted
//! records from an Elasticsearch index or from a newline-delimited JSON file.

#[cfg(feature = "elastic")]
pub mod elastic;
mod metrics;
pub mod ndjson;
