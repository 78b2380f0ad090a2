use metrics::counter;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, error, info};

use crate::concurrency::shutdown::ShutdownTx;
use crate::error::DiffResult;
use crate::metrics::{DOCDIFF_DIFFS_PRINTED_TOTAL, MODE_LABEL};
use crate::printer::Printer;
use crate::types::{Diff, DiffSummary};
use crate::workers::base::{WorkerHandle, WorkerType, join_worker};

/// Handle for waiting on the printer worker.
#[derive(Debug)]
pub struct PrinterWorkerHandle {
    handle: Option<JoinHandle<DiffResult<DiffSummary>>>,
}

impl WorkerHandle<DiffSummary> for PrinterWorkerHandle {
    /// Waits for the printer to drain every diff and returns the per-mode counts.
    async fn wait(mut self) -> DiffResult<DiffSummary> {
        let Some(handle) = self.handle.take() else {
            return Ok(DiffSummary::default());
        };

        join_worker(handle, WorkerType::Printer).await
    }
}

/// Worker that drains the diff channel into a [`Printer`].
///
/// The worker runs until the engine drops its sender, so every diff emitted before a fault is
/// still printed. A printer failure requests shutdown of the whole run.
#[derive(Debug)]
pub struct PrinterWorker<W> {
    printer: W,
    diff_rx: mpsc::Receiver<Diff>,
    shutdown_tx: ShutdownTx,
}

impl<W> PrinterWorker<W>
where
    W: Printer + Send + 'static,
{
    pub fn new(printer: W, diff_rx: mpsc::Receiver<Diff>, shutdown_tx: ShutdownTx) -> Self {
        Self {
            printer,
            diff_rx,
            shutdown_tx,
        }
    }

    /// Spawns the printer worker and returns a handle for waiting on it.
    pub fn spawn(self) -> PrinterWorkerHandle {
        info!(printer = W::name(), "starting printer worker");

        let span = tracing::info_span!("printer_worker", printer = W::name());
        let Self {
            mut printer,
            mut diff_rx,
            shutdown_tx,
        } = self;

        let worker = async move {
            let mut summary = DiffSummary::default();

            while let Some(diff) = diff_rx.recv().await {
                let mode = diff.mode();
                if let Err(err) = printer.print(&diff).await {
                    error!(error = %err, "printer failed, shutting down the diff");
                    shutdown_tx.shutdown();

                    return Err(err);
                }

                summary.record(mode);
                counter!(DOCDIFF_DIFFS_PRINTED_TOTAL, MODE_LABEL => mode.as_str()).increment(1);
            }

            if let Err(err) = printer.flush().await {
                error!(error = %err, "printer failed to flush, shutting down the diff");
                shutdown_tx.shutdown();

                return Err(err);
            }

            info!(
                unchanged = summary.unchanged,
                created = summary.created,
                updated = summary.updated,
                deleted = summary.deleted,
                "printer drained every diff"
            );

            Ok(summary)
        }
        .instrument(span.or_current());

        PrinterWorkerHandle {
            handle: Some(tokio::spawn(worker)),
        }
    }
}
