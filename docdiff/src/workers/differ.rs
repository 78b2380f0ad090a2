use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, info};

use crate::concurrency::shutdown::ShutdownRx;
use crate::concurrency::stream::ReceiverStream;
use crate::differ::{DiffOptions, diff_records};
use crate::error::DiffResult;
use crate::types::Diff;
use crate::workers::base::{WorkerHandle, WorkerType, join_worker};
use crate::workers::producer::RecordReceiver;

/// Handle for waiting on the differ worker.
#[derive(Debug)]
pub struct DiffWorkerHandle {
    handle: Option<JoinHandle<DiffResult<()>>>,
}

impl WorkerHandle<()> for DiffWorkerHandle {
    /// Waits for the engine to complete and returns its fault signal.
    async fn wait(mut self) -> DiffResult<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        join_worker(handle, WorkerType::Differ).await
    }
}

/// Worker that runs the merge-diff engine over the record channels of both sides.
///
/// An absent receiver means the side itself is absent.
#[derive(Debug)]
pub struct DiffWorker {
    source_rx: Option<RecordReceiver>,
    destination_rx: Option<RecordReceiver>,
    diff_tx: mpsc::Sender<Diff>,
    options: DiffOptions,
    shutdown_rx: ShutdownRx,
}

impl DiffWorker {
    pub fn new(
        source_rx: Option<RecordReceiver>,
        destination_rx: Option<RecordReceiver>,
        diff_tx: mpsc::Sender<Diff>,
        options: DiffOptions,
        shutdown_rx: ShutdownRx,
    ) -> Self {
        Self {
            source_rx,
            destination_rx,
            diff_tx,
            options,
            shutdown_rx,
        }
    }

    /// Spawns the differ worker and returns a handle for waiting on it.
    pub fn spawn(self) -> DiffWorkerHandle {
        info!(
            has_source = self.source_rx.is_some(),
            has_destination = self.destination_rx.is_some(),
            check_order = self.options.check_order,
            "starting differ worker"
        );

        let span = tracing::info_span!("differ_worker");
        let worker = async move {
            diff_records(
                self.source_rx.map(ReceiverStream::new),
                self.destination_rx.map(ReceiverStream::new),
                self.diff_tx,
                self.options,
                self.shutdown_rx,
            )
            .await
        }
        .instrument(span.or_current());

        DiffWorkerHandle {
            handle: Some(tokio::spawn(worker)),
        }
    }
}
