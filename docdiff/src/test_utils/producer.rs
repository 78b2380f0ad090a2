use std::sync::Arc;

use futures::{Stream, StreamExt, stream};

use crate::diff_error;
use crate::error::{DiffResult, ErrorKind};
use crate::producer::{IterateRequest, Producer};
use crate::test_utils::notify::TimedNotify;
use crate::types::Record;

/// Producer that yields its records and then fails with the given error kind.
#[derive(Debug, Clone)]
pub struct FaultingProducer {
    records: Arc<Vec<Record>>,
    kind: ErrorKind,
}

impl FaultingProducer {
    pub fn new(records: Vec<Record>, kind: ErrorKind) -> Self {
        Self {
            records: Arc::new(records),
            kind,
        }
    }
}

impl Producer for FaultingProducer {
    fn name() -> &'static str {
        "faulting"
    }

    fn records(
        &self,
        _request: IterateRequest,
    ) -> impl Stream<Item = DiffResult<Record>> + Send + 'static {
        let records: Vec<DiffResult<Record>> = self.records.iter().cloned().map(Ok).collect();
        let kind = self.kind;

        stream::iter(records).chain(stream::once(async move {
            Err(diff_error!(kind, "Injected producer fault"))
        }))
    }
}

/// Producer that yields its records and then never completes.
///
/// The notify fires once every record was handed out, which lets a test cancel the run while a
/// producer is blocked mid-stream.
#[derive(Debug, Clone)]
pub struct PendingProducer {
    records: Arc<Vec<Record>>,
    stalled: TimedNotify,
}

impl PendingProducer {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: Arc::new(records),
            stalled: TimedNotify::new(),
        }
    }

    /// Returns the notify fired when the producer stalls.
    pub fn stalled(&self) -> TimedNotify {
        self.stalled.clone()
    }
}

impl Producer for PendingProducer {
    fn name() -> &'static str {
        "pending"
    }

    fn records(
        &self,
        _request: IterateRequest,
    ) -> impl Stream<Item = DiffResult<Record>> + Send + 'static {
        let records: Vec<DiffResult<Record>> = self.records.iter().cloned().map(Ok).collect();
        let stalled = self.stalled.clone();

        stream::iter(records).chain(stream::once(async move {
            stalled.notify();
            std::future::pending::<DiffResult<Record>>().await
        }))
    }
}
