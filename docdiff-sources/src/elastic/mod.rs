//! Elasticsearch producer based on the scroll API.
//!
//! Supports clusters running Elasticsearch 5.x, 6.x and 7.x. The cluster version is negotiated
//! once when connecting and decides whether document types are part of search paths.

pub mod client;
mod config;
mod core;

pub use client::{ElasticClient, ElasticVersion};
pub use config::ElasticConfig;
pub use core::{ElasticOptions, ElasticProducer};
