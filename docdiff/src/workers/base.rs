use std::fmt;
use std::future::Future;

use tokio::task::JoinHandle;

use crate::diff_error;
use crate::error::{DiffResult, ErrorKind};
use crate::types::Side;

/// Classification of diff worker types.
///
/// [`WorkerType`] distinguishes the tasks spawned for a diff run and is used for logging and
/// to classify worker panics.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WorkerType {
    /// Worker that pulls the records of one side from its producer
    Producer {
        /// Side the producer feeds
        side: Side,
    },
    /// Worker that runs the merge-diff engine
    Differ,
    /// Worker that feeds emitted diffs to the printer
    Printer,
}

impl WorkerType {
    fn panic_kind(&self) -> ErrorKind {
        match self {
            WorkerType::Producer { .. } => ErrorKind::ProducerWorkerPanic,
            WorkerType::Differ => ErrorKind::DiffWorkerPanic,
            WorkerType::Printer => ErrorKind::PrinterWorkerPanic,
        }
    }
}

impl fmt::Display for WorkerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerType::Producer { side } => write!(f, "{side} producer"),
            WorkerType::Differ => f.write_str("differ"),
            WorkerType::Printer => f.write_str("printer"),
        }
    }
}

/// Handle for waiting on a running worker.
///
/// The generic parameter `T` is the value the worker produces when it completes successfully.
pub trait WorkerHandle<T> {
    /// Waits for the worker to complete and returns the final result.
    ///
    /// The handle is consumed by this operation.
    fn wait(self) -> impl Future<Output = DiffResult<T>> + Send;
}

/// Joins a spawned worker task, mapping task failures to diff errors.
///
/// A panicking task yields the panic kind of `worker_type`, an aborted task yields
/// [`ErrorKind::OperationCanceled`].
pub(crate) async fn join_worker<T>(
    handle: JoinHandle<DiffResult<T>>,
    worker_type: WorkerType,
) -> DiffResult<T> {
    handle.await.map_err(|err| {
        if err.is_cancelled() {
            diff_error!(
                ErrorKind::OperationCanceled,
                "Worker was cancelled",
                format!("{worker_type} worker: {err}")
            )
        } else {
            diff_error!(
                worker_type.panic_kind(),
                "Worker panicked",
                format!("{worker_type} worker: {err}")
            )
        }
    })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn panics_map_to_worker_kind() {
        let handle = tokio::spawn(async {
            if true {
                panic!("boom");
            }

            Ok(())
        });

        let err = join_worker(handle, WorkerType::Differ).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DiffWorkerPanic);
        assert_eq!(err.detail().map(|d| d.starts_with("differ worker")), Some(true));
    }

    #[tokio::test]
    async fn aborted_task_is_cancellation() {
        let handle = tokio::spawn(async {
            std::future::pending::<()>().await;
            Ok(())
        });
        handle.abort();

        let err = join_worker(
            handle,
            WorkerType::Producer { side: Side::Source },
        )
        .await
        .unwrap_err();
        assert!(err.is_cancellation());
    }

    #[tokio::test]
    async fn worker_result_is_forwarded() {
        let handle = tokio::spawn(async { Ok(7) });
        assert_eq!(join_worker(handle, WorkerType::Printer).await.unwrap(), 7);
    }
}
