use std::cmp::Ordering;

use futures::future::try_join;
use futures::{Stream, StreamExt};
use metrics::counter;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::concurrency::shutdown::ShutdownRx;
use crate::concurrency::stream::OrderedRecords;
use crate::diff_error;
use crate::error::{DiffError, DiffResult, ErrorKind};
use crate::metrics::{DOCDIFF_DIFFS_EMITTED_TOTAL, MODE_LABEL};
use crate::types::{Diff, Record, Side};

/// Options controlling the merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOptions {
    /// Fails the merge when a side yields records that are not strictly ascending by id.
    pub check_order: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self { check_order: true }
    }
}

/// Merges the records of `src` and `dst` into classified diffs sent on `diff_tx`.
///
/// Both inputs must be sorted ascending by id. An absent input is valid and makes every record
/// of the other side `Created` or `Deleted`. Diffs are emitted in ascending id order as soon as a
/// verdict is known, holding at most one record per side.
///
/// The first fault observed aborts the merge and is returned once: an `Err` item from either
/// side, an ordering violation, shutdown through `shutdown_rx`, or a dropped receiver. `diff_tx`
/// is dropped on return, which ends the diff sequence.
pub async fn diff_records<S, D>(
    src: Option<S>,
    dst: Option<D>,
    diff_tx: mpsc::Sender<Diff>,
    options: DiffOptions,
    shutdown_rx: ShutdownRx,
) -> DiffResult<()>
where
    S: Stream<Item = DiffResult<Record>> + Send,
    D: Stream<Item = DiffResult<Record>> + Send,
{
    let src = src.map(|stream| checked(stream, Side::Source, options));
    let dst = dst.map(|stream| checked(stream, Side::Destination, options));

    let mut merger = Merger {
        diff_tx,
        shutdown_rx,
        emitted: 0,
    };

    let result = match (src, dst) {
        (None, None) => {
            info!("no source and no destination, nothing to diff");
            Ok(())
        }
        (None, Some(mut dst)) => {
            info!("no source, every destination record is created");
            merger.drain(&mut dst, Side::Destination).await
        }
        (Some(mut src), None) => {
            info!("no destination, every source record is deleted");
            merger.drain(&mut src, Side::Source).await
        }
        (Some(mut src), Some(mut dst)) => merger.merge(&mut src, &mut dst).await,
    };

    match &result {
        Ok(()) => info!(emitted = merger.emitted, "diff completed"),
        Err(err) => debug!(emitted = merger.emitted, error = %err, "diff aborted"),
    }

    result
}

fn checked<S>(
    stream: S,
    side: Side,
    options: DiffOptions,
) -> impl Stream<Item = DiffResult<Record>> + Send + Unpin
where
    S: Stream<Item = DiffResult<Record>> + Send,
{
    let stream = if options.check_order {
        OrderedRecords::wrap(stream, side).left_stream()
    } else {
        stream.right_stream()
    };

    Box::pin(stream)
}

fn cancelled() -> DiffError {
    diff_error!(ErrorKind::OperationCanceled, "Diff was cancelled")
}

/// Merge cursor state shared by every branch of the merge.
struct Merger {
    diff_tx: mpsc::Sender<Diff>,
    shutdown_rx: ShutdownRx,
    emitted: u64,
}

impl Merger {
    /// Runs the ordered merge of two present inputs.
    async fn merge<S, D>(&mut self, src: &mut S, dst: &mut D) -> DiffResult<()>
    where
        S: Stream<Item = DiffResult<Record>> + Send + Unpin,
        D: Stream<Item = DiffResult<Record>> + Send + Unpin,
    {
        info!("merging source and destination records");

        let (mut src_record, mut dst_record) = self.next_both(src, dst).await?;

        loop {
            match (src_record.take(), dst_record.take()) {
                (None, None) => return Ok(()),
                (None, Some(record)) => {
                    debug!("source exhausted, draining destination");
                    self.emit(Diff::Created { dst: record }).await?;
                    return self.drain(dst, Side::Destination).await;
                }
                (Some(record), None) => {
                    debug!("destination exhausted, draining source");
                    self.emit(Diff::Deleted { src: record }).await?;
                    return self.drain(src, Side::Source).await;
                }
                (Some(src_current), Some(dst_current)) => {
                    match src_current.id.cmp(&dst_current.id) {
                        Ordering::Greater => {
                            self.emit(Diff::Created { dst: dst_current }).await?;
                            src_record = Some(src_current);
                            dst_record = self.next(dst, Side::Destination).await?;
                        }
                        Ordering::Less => {
                            self.emit(Diff::Deleted { src: src_current }).await?;
                            dst_record = Some(dst_current);
                            src_record = self.next(src, Side::Source).await?;
                        }
                        Ordering::Equal => {
                            self.emit(Diff::compare(src_current, dst_current)).await?;
                            (src_record, dst_record) = self.next_both(src, dst).await?;
                        }
                    }
                }
            }
        }
    }

    /// Emits the complementary classification for every remaining record of `side`.
    async fn drain<S>(&mut self, stream: &mut S, side: Side) -> DiffResult<()>
    where
        S: Stream<Item = DiffResult<Record>> + Send + Unpin,
    {
        while let Some(record) = self.next(stream, side).await? {
            let diff = match side {
                Side::Source => Diff::Deleted { src: record },
                Side::Destination => Diff::Created { dst: record },
            };

            self.emit(diff).await?;
        }

        Ok(())
    }

    /// Reads the next record of one side, racing the shutdown signal.
    async fn next<S>(&mut self, stream: &mut S, side: Side) -> DiffResult<Option<Record>>
    where
        S: Stream<Item = DiffResult<Record>> + Send + Unpin,
    {
        tokio::select! {
            biased;

            _ = self.shutdown_rx.wait_for_shutdown() => {
                info!(%side, "shutdown requested while waiting for records");
                Err(cancelled())
            }
            item = stream.next() => {
                let record = item.transpose()?;
                if record.is_none() {
                    debug!(%side, "records exhausted");
                }

                Ok(record)
            }
        }
    }

    /// Reads the next record of both sides concurrently, racing the shutdown signal.
    ///
    /// The first fault of either side wins without waiting for the other side.
    async fn next_both<S, D>(
        &mut self,
        src: &mut S,
        dst: &mut D,
    ) -> DiffResult<(Option<Record>, Option<Record>)>
    where
        S: Stream<Item = DiffResult<Record>> + Send + Unpin,
        D: Stream<Item = DiffResult<Record>> + Send + Unpin,
    {
        let src_next = async { src.next().await.transpose() };
        let dst_next = async { dst.next().await.transpose() };

        tokio::select! {
            biased;

            _ = self.shutdown_rx.wait_for_shutdown() => {
                info!("shutdown requested while waiting for records");
                Err(cancelled())
            }
            records = try_join(src_next, dst_next) => records,
        }
    }

    /// Sends a diff downstream, racing the shutdown signal.
    async fn emit(&mut self, diff: Diff) -> DiffResult<()> {
        let mode = diff.mode();
        trace!(%mode, id = diff.id(), "emitting diff");

        tokio::select! {
            biased;

            _ = self.shutdown_rx.wait_for_shutdown() => {
                info!("shutdown requested while emitting diff");
                Err(cancelled())
            }
            result = self.diff_tx.send(diff) => {
                if result.is_err() {
                    return Err(diff_error!(
                        ErrorKind::DiffChannelClosed,
                        "Diff receiver was dropped before the diff completed"
                    ));
                }

                self.emitted += 1;
                counter!(DOCDIFF_DIFFS_EMITTED_TOTAL, MODE_LABEL => mode.as_str()).increment(1);

                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::stream;
    use serde_json::json;

    use super::*;
    use crate::concurrency::shutdown::create_shutdown_channel;
    use crate::types::DiffMode;

    type Items = Vec<DiffResult<Record>>;

    fn records(entries: &[(&str, serde_json::Value)]) -> Items {
        entries
            .iter()
            .map(|(id, content)| Ok(Record::new(*id, content.clone())))
            .collect()
    }

    async fn run(src: Option<Items>, dst: Option<Items>) -> (Vec<Diff>, DiffResult<()>) {
        let (_shutdown_tx, shutdown_rx) = create_shutdown_channel();
        let (diff_tx, mut diff_rx) = mpsc::channel(64);

        let result = diff_records(
            src.map(stream::iter),
            dst.map(stream::iter),
            diff_tx,
            DiffOptions::default(),
            shutdown_rx,
        )
        .await;

        let mut diffs = Vec::new();
        while let Some(diff) = diff_rx.recv().await {
            diffs.push(diff);
        }

        (diffs, result)
    }

    fn summary(diffs: &[Diff]) -> Vec<(DiffMode, String)> {
        diffs
            .iter()
            .map(|diff| (diff.mode(), diff.id().to_owned()))
            .collect()
    }

    #[tokio::test]
    async fn both_absent_emits_nothing() {
        let (diffs, result) = run(None, None).await;

        assert!(diffs.is_empty());
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn empty_sides_emit_nothing() {
        let (diffs, result) = run(Some(vec![]), Some(vec![])).await;

        assert!(diffs.is_empty());
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn only_destination_yields_created() {
        let dst = records(&[("1", json!("One")), ("2", json!("Two"))]);
        let (diffs, result) = run(None, Some(dst)).await;

        assert!(result.is_ok());
        assert_eq!(
            summary(&diffs),
            vec![
                (DiffMode::Created, "1".to_owned()),
                (DiffMode::Created, "2".to_owned())
            ]
        );
    }

    #[tokio::test]
    async fn only_source_yields_deleted() {
        let src = records(&[("1", json!("One"))]);
        let (diffs, result) = run(Some(src), None).await;

        assert!(result.is_ok());
        assert_eq!(
            diffs,
            vec![Diff::Deleted {
                src: Record::new("1", json!("One"))
            }]
        );
    }

    #[tokio::test]
    async fn interleaved_sides_are_merged_in_order() {
        let src = records(&[
            ("2", json!({"Value": 2})),
            ("3", json!({"Value": 3})),
            ("4", json!({"Value": 3})),
            ("5", json!({"Value": 5})),
            ("6", json!({"Value": 6})),
        ]);
        let dst = records(&[
            ("1", json!({"Value": 1})),
            ("4", json!({"Value": 4})),
            ("6", json!({"Value": 6})),
        ]);

        let (diffs, result) = run(Some(src), Some(dst)).await;

        assert!(result.is_ok());
        assert_eq!(
            summary(&diffs),
            vec![
                (DiffMode::Created, "1".to_owned()),
                (DiffMode::Deleted, "2".to_owned()),
                (DiffMode::Deleted, "3".to_owned()),
                (DiffMode::Updated, "4".to_owned()),
                (DiffMode::Deleted, "5".to_owned()),
                (DiffMode::Unchanged, "6".to_owned()),
            ]
        );
    }

    #[tokio::test]
    async fn producer_fault_aborts_merge() {
        let mut src = records(&[("1", json!(1)), ("2", json!(2))]);
        src.push(Err(diff_error!(
            ErrorKind::ProducerConnectionFailed,
            "Connection lost"
        )));
        src.extend(records(&[("9", json!(9))]));
        let dst = records(&[("1", json!(1)), ("2", json!(2)), ("3", json!(3))]);

        let (diffs, result) = run(Some(src), Some(dst)).await;

        assert_eq!(
            summary(&diffs),
            vec![
                (DiffMode::Unchanged, "1".to_owned()),
                (DiffMode::Unchanged, "2".to_owned()),
            ]
        );
        assert_eq!(
            result.unwrap_err().kind(),
            ErrorKind::ProducerConnectionFailed
        );
    }

    #[tokio::test]
    async fn unsorted_side_fails_fast() {
        let src = records(&[("1", json!(1)), ("3", json!(3)), ("2", json!(2))]);

        let (diffs, result) = run(Some(src), None).await;

        assert_eq!(diffs.len(), 2);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::UnsortedRecords);
    }

    #[tokio::test]
    async fn unsorted_side_is_accepted_without_order_check() {
        let (_shutdown_tx, shutdown_rx) = create_shutdown_channel();
        let (diff_tx, mut diff_rx) = mpsc::channel(8);
        let src = records(&[("2", json!(2)), ("1", json!(1))]);

        let result = diff_records(
            Some(stream::iter(src)),
            None::<stream::Iter<std::vec::IntoIter<DiffResult<Record>>>>,
            diff_tx,
            DiffOptions { check_order: false },
            shutdown_rx,
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(diff_rx.recv().await.map(|d| d.id().to_owned()), Some("2".to_owned()));
        assert_eq!(diff_rx.recv().await.map(|d| d.id().to_owned()), Some("1".to_owned()));
    }

    #[tokio::test]
    async fn shutdown_before_start_is_cancellation() {
        let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
        shutdown_tx.shutdown();
        let (diff_tx, mut diff_rx) = mpsc::channel(8);

        let result = diff_records(
            Some(stream::iter(records(&[("1", json!(1))]))),
            Some(stream::iter(records(&[("1", json!(1))]))),
            diff_tx,
            DiffOptions::default(),
            shutdown_rx,
        )
        .await;

        assert!(result.unwrap_err().is_cancellation());
        assert!(diff_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn dropped_receiver_closes_diff_channel() {
        let (_shutdown_tx, shutdown_rx) = create_shutdown_channel();
        let (diff_tx, diff_rx) = mpsc::channel(1);
        drop(diff_rx);

        let result = diff_records(
            Some(stream::iter(records(&[("1", json!(1))]))),
            None::<stream::Iter<std::vec::IntoIter<DiffResult<Record>>>>,
            diff_tx,
            DiffOptions::default(),
            shutdown_rx,
        )
        .await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::DiffChannelClosed);
    }
}
