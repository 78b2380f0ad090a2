use docdiff::error::ErrorKind;
use docdiff::pipeline::Pipeline;
use docdiff::printer::memory::MemoryPrinter;
use docdiff::producer::memory::MemoryProducer;
use docdiff::test_utils::pipeline::{TEST_CHANNEL_CAPACITY, create_pipeline, create_pipeline_with};
use docdiff::test_utils::records::{numbered_records, records};
use docdiff::types::{DiffMode, DiffSummary, Record};
use docdiff_telemetry::tracing::init_test_tracing;
use serde_json::json;

/// Runs a pipeline to completion and returns the printed `(mode, id)` pairs.
async fn run(
    source: Option<MemoryProducer>,
    destination: Option<MemoryProducer>,
) -> (DiffSummary, Vec<(DiffMode, String)>) {
    let printer = MemoryPrinter::new();
    let mut pipeline = create_pipeline(source, destination, printer.clone());

    pipeline.start().unwrap();
    let summary = pipeline.wait().await.unwrap();

    (summary, printer.summary().await)
}

fn entries(diffs: &[(DiffMode, &str)]) -> Vec<(DiffMode, String)> {
    diffs
        .iter()
        .map(|(mode, id)| (*mode, (*id).to_owned()))
        .collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn both_sides_absent_emit_nothing() {
    init_test_tracing();

    let (summary, printed) = run(None, None).await;

    assert_eq!(summary, DiffSummary::default());
    assert!(printed.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn source_only_is_deleted() {
    init_test_tracing();

    let source = MemoryProducer::new(records(&[("1", json!("One"))]));

    let (summary, printed) = run(Some(source), None).await;

    assert_eq!(printed, entries(&[(DiffMode::Deleted, "1")]));
    assert_eq!(summary.deleted, 1);
    assert_eq!(summary.total(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn destination_only_is_created() {
    init_test_tracing();

    let destination = MemoryProducer::new(records(&[("1", json!("One"))]));

    let (summary, printed) = run(None, Some(destination)).await;

    assert_eq!(printed, entries(&[(DiffMode::Created, "1")]));
    assert_eq!(summary.created, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_producers_emit_nothing() {
    init_test_tracing();

    let (summary, printed) = run(
        Some(MemoryProducer::new(vec![])),
        Some(MemoryProducer::new(vec![])),
    )
    .await;

    assert_eq!(summary.total(), 0);
    assert!(printed.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn merge_classifies_both_sides() {
    init_test_tracing();

    let source = MemoryProducer::new(records(&[("1", json!("A")), ("3", json!("C"))]));
    let destination = MemoryProducer::new(records(&[("1", json!("A")), ("2", json!("B"))]));

    let (_, printed) = run(Some(source), Some(destination)).await;

    assert_eq!(
        printed,
        entries(&[
            (DiffMode::Unchanged, "1"),
            (DiffMode::Created, "2"),
            (DiffMode::Deleted, "3"),
        ])
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn numeric_content_is_compared_by_value() {
    init_test_tracing();

    let source = MemoryProducer::new(records(&[("1", json!({ "X": 599 }))]));

    let same = MemoryProducer::new(records(&[("1", json!({ "X": 599 }))]));
    let (_, printed) = run(Some(source.clone()), Some(same)).await;
    assert_eq!(printed, entries(&[(DiffMode::Unchanged, "1")]));

    let float = MemoryProducer::new(records(&[("1", json!({ "X": 599.0 }))]));
    let (_, printed) = run(Some(source.clone()), Some(float)).await;
    assert_eq!(printed, entries(&[(DiffMode::Unchanged, "1")]));

    let changed = MemoryProducer::new(records(&[("1", json!({ "X": 600 }))]));
    let (_, printed) = run(Some(source), Some(changed)).await;
    assert_eq!(printed, entries(&[(DiffMode::Updated, "1")]));
}

#[tokio::test(flavor = "multi_thread")]
async fn interleaved_ids_are_merged_in_order() {
    init_test_tracing();

    let source = MemoryProducer::new(records(&[
        ("2", json!({ "v": 2 })),
        ("3", json!({ "v": 3 })),
        ("4", json!({ "v": 4 })),
        ("5", json!({ "v": 5 })),
        ("6", json!({ "v": 6 })),
    ]));
    let destination = MemoryProducer::new(records(&[
        ("1", json!({ "v": 1 })),
        ("4", json!({ "v": 40 })),
        ("6", json!({ "v": 6 })),
    ]));

    let (summary, printed) = run(Some(source), Some(destination)).await;

    assert_eq!(
        printed,
        entries(&[
            (DiffMode::Created, "1"),
            (DiffMode::Deleted, "2"),
            (DiffMode::Deleted, "3"),
            (DiffMode::Updated, "4"),
            (DiffMode::Deleted, "5"),
            (DiffMode::Unchanged, "6"),
        ])
    );
    assert_eq!(
        summary,
        DiffSummary {
            unchanged: 1,
            created: 1,
            updated: 1,
            deleted: 3,
        }
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn large_inputs_flow_through_small_channels() {
    init_test_tracing();

    // Source holds 0..1000 and destination 500..1500, every tenth shared record is modified.
    let source = numbered_records(0, 1000);
    let destination: Vec<Record> = numbered_records(500, 1000)
        .into_iter()
        .map(|record| {
            let n = record.content.as_value()["n"].as_u64().unwrap();
            if n < 1000 && n % 10 == 0 {
                Record::new(record.id, json!({ "n": n, "touched": true }))
            } else {
                record
            }
        })
        .collect();

    let (summary, printed) = run(
        Some(MemoryProducer::new(source)),
        Some(MemoryProducer::new(destination)),
    )
    .await;

    assert!(TEST_CHANNEL_CAPACITY < printed.len());
    assert_eq!(printed.len(), 1500);
    assert!(printed.windows(2).all(|pair| pair[0].1 < pair[1].1));
    assert_eq!(
        summary,
        DiffSummary {
            unchanged: 450,
            created: 500,
            updated: 50,
            deleted: 500,
        }
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn diffs_fan_out_to_every_printer() {
    init_test_tracing();

    let first = MemoryPrinter::new();
    let second = MemoryPrinter::new();
    let source = MemoryProducer::new(records(&[("a", json!(1)), ("b", json!(2))]));
    let destination = MemoryProducer::new(records(&[("b", json!(3))]));

    let mut pipeline = create_pipeline(
        Some(source),
        Some(destination),
        vec![first.clone(), second.clone()],
    );
    pipeline.start().unwrap();
    let summary = pipeline.wait().await.unwrap();

    let expected = entries(&[(DiffMode::Deleted, "a"), (DiffMode::Updated, "b")]);
    assert_eq!(first.summary().await, expected);
    assert_eq!(second.summary().await, expected);
    assert!(first.flushed().await);
    assert!(second.flushed().await);
    assert_eq!(summary.total(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn unsorted_input_is_accepted_without_order_check() {
    init_test_tracing();

    let printer = MemoryPrinter::new();
    let source = MemoryProducer::new(records(&[("2", json!(2)), ("1", json!(1))]));
    let mut pipeline =
        create_pipeline_with(Some(source), None::<MemoryProducer>, printer.clone(), false);

    pipeline.start().unwrap();
    pipeline.wait().await.unwrap();

    assert_eq!(
        printer.summary().await,
        entries(&[(DiffMode::Deleted, "2"), (DiffMode::Deleted, "1")])
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn waiting_on_an_unstarted_pipeline_returns_empty_summary() {
    init_test_tracing();

    let pipeline: Pipeline<MemoryProducer, MemoryProducer, MemoryPrinter> =
        create_pipeline(None, None, MemoryPrinter::new());

    let summary = pipeline.wait().await.unwrap();

    assert_eq!(summary, DiffSummary::default());
}

#[tokio::test(flavor = "multi_thread")]
async fn pipeline_can_only_start_once() {
    init_test_tracing();

    let mut pipeline: Pipeline<MemoryProducer, MemoryProducer, MemoryPrinter> =
        create_pipeline(None, None, MemoryPrinter::new());

    pipeline.start().unwrap();
    let err = pipeline.start().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);

    pipeline.wait().await.unwrap();
}
