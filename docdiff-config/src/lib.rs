//! Configuration for docdiff.
//!
//! Provides the configuration types shared by the diff engine and the binary, their validation
//! and the layered loading from files and `APP_`-prefixed environment variables.

pub mod environment;
pub mod load;
pub mod shared;

pub use load::{Config, LoadConfigError, load_config};
