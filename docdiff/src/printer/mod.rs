//! Consumers rendering the diffs emitted by the engine.

mod base;
pub mod changes;
pub mod json;
pub mod memory;
pub mod text;

pub use base::*;
