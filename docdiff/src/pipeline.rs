use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::bail;
use crate::diff_error;
use crate::concurrency::shutdown::{ShutdownTx, create_shutdown_channel};
use crate::config::PipelineConfig;
use crate::differ::DiffOptions;
use crate::error::{DiffError, DiffResult, ErrorKind};
use crate::printer::Printer;
use crate::producer::{IterateRequest, Producer};
use crate::types::{DiffSummary, Side};
use crate::workers::base::WorkerHandle;
use crate::workers::differ::{DiffWorker, DiffWorkerHandle};
use crate::workers::printer::{PrinterWorker, PrinterWorkerHandle};
use crate::workers::producer::{ProducerWorker, ProducerWorkerHandle};

#[derive(Debug)]
enum PipelineState {
    NotStarted,
    Started {
        source: Option<ProducerWorkerHandle>,
        destination: Option<ProducerWorkerHandle>,
        differ: DiffWorkerHandle,
        printer: PrinterWorkerHandle,
    },
}

/// Driver of a single diff run.
///
/// The pipeline spawns one producer worker per present side, the differ worker and the printer
/// worker, wires them with bounded channels and shares one shutdown signal between all of them.
#[derive(Debug)]
pub struct Pipeline<P, Q, W> {
    config: Arc<PipelineConfig>,
    source: Option<P>,
    destination: Option<Q>,
    printer: Option<W>,
    source_request: IterateRequest,
    destination_request: IterateRequest,
    state: PipelineState,
    shutdown_tx: ShutdownTx,
}

impl<P, Q, W> Pipeline<P, Q, W>
where
    P: Producer,
    Q: Producer,
    W: Printer + Send + 'static,
{
    /// Creates a new pipeline. An absent producer is a valid, empty-by-definition side.
    pub fn new(
        config: PipelineConfig,
        source: Option<P>,
        destination: Option<Q>,
        printer: W,
    ) -> Self {
        // The receiver is dropped here, every worker subscribes through the sender.
        let (shutdown_tx, _) = create_shutdown_channel();

        Self {
            config: Arc::new(config),
            source,
            destination,
            printer: Some(printer),
            source_request: IterateRequest::default(),
            destination_request: IterateRequest::default(),
            state: PipelineState::NotStarted,
            shutdown_tx,
        }
    }

    /// Sets the request sent to the source producer.
    pub fn with_source_request(mut self, request: IterateRequest) -> Self {
        self.source_request = request;
        self
    }

    /// Sets the request sent to the destination producer.
    pub fn with_destination_request(mut self, request: IterateRequest) -> Self {
        self.destination_request = request;
        self
    }

    pub fn shutdown_tx(&self) -> ShutdownTx {
        self.shutdown_tx.clone()
    }

    /// Spawns every worker of the run.
    pub fn start(&mut self) -> DiffResult<()> {
        let Some(printer) = self.printer.take() else {
            bail!(
                ErrorKind::InvalidData,
                "Pipeline already started",
                "a pipeline can only run once"
            );
        };

        info!(
            source = self.source.is_some(),
            destination = self.destination.is_some(),
            channel_capacity = self.config.channel_capacity,
            "starting diff pipeline"
        );

        let capacity = self.config.channel_capacity.max(1);

        let (source, source_rx) = match self.source.take() {
            Some(producer) => {
                let (record_tx, record_rx) = mpsc::channel(capacity);
                let worker = ProducerWorker::new(
                    Side::Source,
                    producer,
                    self.source_request.clone(),
                    record_tx,
                    self.shutdown_tx.clone(),
                );

                (Some(worker.spawn()), Some(record_rx))
            }
            None => (None, None),
        };

        let (destination, destination_rx) = match self.destination.take() {
            Some(producer) => {
                let (record_tx, record_rx) = mpsc::channel(capacity);
                let worker = ProducerWorker::new(
                    Side::Destination,
                    producer,
                    self.destination_request.clone(),
                    record_tx,
                    self.shutdown_tx.clone(),
                );

                (Some(worker.spawn()), Some(record_rx))
            }
            None => (None, None),
        };

        let (diff_tx, diff_rx) = mpsc::channel(capacity);

        let options = DiffOptions {
            check_order: self.config.check_order,
        };
        let differ = DiffWorker::new(
            source_rx,
            destination_rx,
            diff_tx,
            options,
            self.shutdown_tx.subscribe(),
        )
        .spawn();

        let printer = PrinterWorker::new(printer, diff_rx, self.shutdown_tx.clone()).spawn();

        self.state = PipelineState::Started {
            source,
            destination,
            differ,
            printer,
        };

        Ok(())
    }

    /// Waits for every worker to complete.
    ///
    /// Every worker is joined on every path. When more than one worker failed, the root fault is
    /// the first non-cancellation fault of the printer, the differ, the source producer and the
    /// destination producer, in this order. The remaining faults are logged.
    pub async fn wait(self) -> DiffResult<DiffSummary> {
        let PipelineState::Started {
            source,
            destination,
            differ,
            printer,
        } = self.state
        else {
            info!("pipeline was not started, nothing to wait for");

            return Ok(DiffSummary::default());
        };

        info!("waiting for diff workers to complete");

        let (printer_result, differ_result, source_result, destination_result) = tokio::join!(
            printer.wait(),
            differ.wait(),
            wait_producer(source),
            wait_producer(destination),
        );

        let mut faults = Vec::new();
        let summary = match printer_result {
            Ok(summary) => summary,
            Err(err) => {
                faults.push(("printer", err));
                DiffSummary::default()
            }
        };

        for (worker, result) in [
            ("differ", differ_result),
            ("source producer", source_result),
            ("destination producer", destination_result),
        ] {
            if let Err(err) = result {
                faults.push((worker, err));
            }
        }

        if !faults.is_empty() {
            return Err(root_fault(faults));
        }

        info!(
            total = summary.total(),
            unchanged = summary.unchanged,
            created = summary.created,
            updated = summary.updated,
            deleted = summary.deleted,
            "diff pipeline completed"
        );

        Ok(summary)
    }

    /// Requests shutdown of every worker.
    pub fn shutdown(&self) {
        info!("trying to shut down the diff pipeline");

        self.shutdown_tx.shutdown();

        info!("shut down signal successfully sent to all workers");
    }

    pub async fn shutdown_and_wait(self) -> DiffResult<DiffSummary> {
        self.shutdown();
        self.wait().await
    }
}

async fn wait_producer(handle: Option<ProducerWorkerHandle>) -> DiffResult<()> {
    match handle {
        Some(handle) => handle.wait().await,
        None => Ok(()),
    }
}

/// Picks the fault reported for the run and logs the others.
fn root_fault(faults: Vec<(&'static str, DiffError)>) -> DiffError {
    let root_index = faults
        .iter()
        .position(|(_, err)| !err.is_cancellation())
        .unwrap_or(0);

    let mut root = None;
    for (index, (worker, err)) in faults.into_iter().enumerate() {
        if index == root_index {
            error!(worker, error = %err, "diff pipeline failed");
            root = Some(err);
        } else {
            warn!(worker, error = %err, "additional worker fault");
        }
    }

    match root {
        Some(err) => err,
        None => diff_error!(ErrorKind::Unknown, "Diff pipeline failed without a fault"),
    }
}
