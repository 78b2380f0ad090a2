use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::error::DiffResult;
use crate::printer::base::Printer;
use crate::types::{Diff, DiffMode};

#[derive(Debug, Default)]
struct Inner {
    diffs: Vec<Diff>,
    flushed: bool,
}

/// In-memory printer for testing and embedding.
///
/// [`MemoryPrinter`] keeps every diff it receives, regardless of its mode. Clones share the
/// same storage, so a clone handed to a pipeline can be inspected after the run.
#[derive(Debug, Clone, Default)]
pub struct MemoryPrinter {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every diff received so far.
    pub async fn diffs(&self) -> Vec<Diff> {
        self.inner.lock().await.diffs.clone()
    }

    /// Returns the relevant id and mode of every diff received so far.
    pub async fn summary(&self) -> Vec<(DiffMode, String)> {
        self.inner
            .lock()
            .await
            .diffs
            .iter()
            .map(|diff| (diff.mode(), diff.id().to_owned()))
            .collect()
    }

    /// Returns `true` once the printer was flushed.
    pub async fn flushed(&self) -> bool {
        self.inner.lock().await.flushed
    }
}

impl Printer for MemoryPrinter {
    fn name() -> &'static str {
        "memory"
    }

    async fn print(&mut self, diff: &Diff) -> DiffResult<()> {
        debug!(mode = %diff.mode(), id = diff.id(), "storing diff");
        self.inner.lock().await.diffs.push(diff.clone());

        Ok(())
    }

    async fn flush(&mut self) -> DiffResult<()> {
        self.inner.lock().await.flushed = true;

        Ok(())
    }
}
