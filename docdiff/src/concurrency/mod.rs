//! Concurrency utilities for coordinating diff workers.
//!
//! The [`shutdown`] module provides the single cancellation signal shared by both producers,
//! the engine and the printer. The [`stream`] module provides the stream adapters used to move
//! records between workers and to check their ordering.

pub mod shutdown;
pub mod stream;
