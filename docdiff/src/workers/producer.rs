use futures::StreamExt;
use metrics::counter;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info};

use crate::concurrency::shutdown::ShutdownTx;
use crate::error::DiffResult;
use crate::metrics::{
    DOCDIFF_FAULTS_TOTAL, DOCDIFF_RECORDS_RECEIVED_TOTAL, ERROR_KIND_LABEL, SIDE_LABEL,
};
use crate::producer::{IterateRequest, Producer};
use crate::types::{Record, Side};
use crate::workers::base::{WorkerHandle, WorkerType, join_worker};

/// Sending half of the channel carrying the records of one side.
pub type RecordSender = mpsc::Sender<DiffResult<Record>>;

/// Receiving half of the channel carrying the records of one side.
pub type RecordReceiver = mpsc::Receiver<DiffResult<Record>>;

/// Handle for waiting on a producer worker.
#[derive(Debug)]
pub struct ProducerWorkerHandle {
    side: Side,
    handle: Option<JoinHandle<DiffResult<()>>>,
}

impl ProducerWorkerHandle {
    pub fn side(&self) -> Side {
        self.side
    }
}

impl WorkerHandle<()> for ProducerWorkerHandle {
    /// Waits for the producer worker to complete.
    ///
    /// Returns the producer's fault, if it had one. Stopping because of shutdown or because the
    /// engine stopped reading is not a fault.
    async fn wait(mut self) -> DiffResult<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        join_worker(handle, WorkerType::Producer { side: self.side }).await
    }
}

/// Worker that pulls the records of one side and forwards them to the engine.
///
/// Records travel through a bounded channel so a slow engine applies backpressure to the
/// producer. A fault is forwarded in-band as the last item of the channel when there is room
/// for it, requests shutdown of the whole run and is returned from the worker. The engine may
/// be waiting on the other side only, so the in-band item alone cannot stop it.
#[derive(Debug)]
pub struct ProducerWorker<P> {
    side: Side,
    producer: P,
    request: IterateRequest,
    record_tx: RecordSender,
    shutdown_tx: ShutdownTx,
}

impl<P> ProducerWorker<P>
where
    P: Producer,
{
    pub fn new(
        side: Side,
        producer: P,
        request: IterateRequest,
        record_tx: RecordSender,
        shutdown_tx: ShutdownTx,
    ) -> Self {
        Self {
            side,
            producer,
            request,
            record_tx,
            shutdown_tx,
        }
    }

    /// Spawns the producer worker and returns a handle for waiting on it.
    pub fn spawn(self) -> ProducerWorkerHandle {
        let Self {
            side,
            producer,
            request,
            record_tx,
            shutdown_tx,
        } = self;

        info!(%side, producer = P::name(), "starting producer worker");

        let span = tracing::info_span!("producer_worker", %side, producer = P::name());
        let records = producer.records(request);

        let mut shutdown_rx = shutdown_tx.subscribe();
        let worker = async move {
            let mut records = std::pin::pin!(records);
            let mut forwarded: u64 = 0;

            loop {
                let item = tokio::select! {
                    biased;

                    _ = shutdown_rx.wait_for_shutdown() => {
                        info!(forwarded, "shutdown requested, stopping producer");
                        return Ok(());
                    }
                    _ = record_tx.closed() => {
                        debug!(forwarded, "records no longer needed, stopping producer");
                        return Ok(());
                    }
                    item = records.next() => item,
                };

                match item {
                    None => {
                        info!(forwarded, "producer exhausted");
                        return Ok(());
                    }
                    Some(Ok(record)) => {
                        tokio::select! {
                            biased;

                            _ = shutdown_rx.wait_for_shutdown() => {
                                info!(forwarded, "shutdown requested, stopping producer");
                                return Ok(());
                            }
                            result = record_tx.send(Ok(record)) => {
                                if result.is_err() {
                                    debug!(forwarded, "records no longer needed, stopping producer");
                                    return Ok(());
                                }
                            }
                        }

                        forwarded += 1;
                        counter!(DOCDIFF_RECORDS_RECEIVED_TOTAL, SIDE_LABEL => side.as_str())
                            .increment(1);
                    }
                    Some(Err(err)) => {
                        error!(forwarded, error = %err, "producer failed");
                        counter!(
                            DOCDIFF_FAULTS_TOTAL,
                            SIDE_LABEL => side.as_str(),
                            ERROR_KIND_LABEL => format!("{:?}", err.kind())
                        )
                        .increment(1);

                        // A full or closed channel drops the in-band copy, shutdown still stops
                        // the engine and the fault is returned below.
                        if record_tx.try_send(Err(err.clone())).is_err() {
                            debug!(forwarded, "fault not forwarded in-band");
                        }
                        shutdown_tx.shutdown();

                        return Err(err);
                    }
                }
            }
        }
        .instrument(span.or_current());

        ProducerWorkerHandle {
            side,
            handle: Some(tokio::spawn(worker)),
        }
    }
}
