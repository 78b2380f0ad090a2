use core::pin::Pin;
use core::task::{Context, Poll};
use futures::{Stream, ready};
use pin_project_lite::pin_project;
use tokio::sync::mpsc;
use tracing::error;

use crate::diff_error;
use crate::error::{DiffResult, ErrorKind};
use crate::types::{Record, RecordId, Side};

/// A [`Stream`] over the receiving half of a bounded [`mpsc`] channel.
///
/// The stream ends once every sender has been dropped and the buffered items are drained.
#[must_use = "streams do nothing unless polled"]
#[derive(Debug)]
pub struct ReceiverStream<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> ReceiverStream<T> {
    /// Creates a new [`ReceiverStream`] wrapping `rx`.
    pub fn new(rx: mpsc::Receiver<T>) -> Self {
        Self { rx }
    }
}

impl<T> Stream for ReceiverStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

pin_project! {
    /// A stream adapter that fails fast when records are not strictly ascending by id.
    ///
    /// A record whose id is lower than or equal to the previous id on the same side is replaced
    /// by a single [`ErrorKind::UnsortedRecords`] error, after which the stream ends. Errors from
    /// the wrapped stream are passed through and also end the stream.
    #[must_use = "streams do nothing unless polled"]
    #[derive(Debug)]
    pub struct OrderedRecords<S> {
        #[pin]
        stream: S,
        side: Side,
        last_id: Option<RecordId>,
        terminated: bool,
    }
}

impl<S> OrderedRecords<S>
where
    S: Stream<Item = DiffResult<Record>>,
{
    /// Creates a new [`OrderedRecords`] checking the records of `side`.
    pub fn wrap(stream: S, side: Side) -> Self {
        Self {
            stream,
            side,
            last_id: None,
            terminated: false,
        }
    }
}

impl<S> Stream for OrderedRecords<S>
where
    S: Stream<Item = DiffResult<Record>>,
{
    type Item = DiffResult<Record>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();

        if *this.terminated {
            return Poll::Ready(None);
        }

        let item = match ready!(this.stream.poll_next(cx)) {
            Some(Ok(record)) => record,
            Some(Err(err)) => {
                *this.terminated = true;
                return Poll::Ready(Some(Err(err)));
            }
            None => {
                *this.terminated = true;
                return Poll::Ready(None);
            }
        };

        if let Some(last_id) = this.last_id.as_ref()
            && item.id <= *last_id
        {
            *this.terminated = true;

            error!(
                side = %this.side,
                previous_id = %last_id,
                id = %item.id,
                "records are not sorted ascending by id"
            );

            return Poll::Ready(Some(Err(diff_error!(
                ErrorKind::UnsortedRecords,
                "Records are not sorted ascending by id",
                format!(
                    "{} record '{}' follows '{}'",
                    this.side, item.id, last_id
                )
            ))));
        }

        *this.last_id = Some(item.id.clone());

        Poll::Ready(Some(Ok(item)))
    }
}
