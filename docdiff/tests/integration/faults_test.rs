use std::time::Duration;

use docdiff::error::ErrorKind;
use docdiff::printer::memory::MemoryPrinter;
use docdiff::producer::memory::MemoryProducer;
use docdiff::test_utils::pipeline::create_pipeline;
use docdiff::test_utils::printer::FailingPrinter;
use docdiff::test_utils::producer::{FaultingProducer, PendingProducer};
use docdiff::test_utils::records::{numbered_records, records};
use docdiff::types::DiffMode;
use docdiff_telemetry::tracing::init_test_tracing;
use serde_json::json;

#[tokio::test(flavor = "multi_thread")]
async fn source_fault_stops_the_merge_after_its_prefix() {
    init_test_tracing();

    let printer = MemoryPrinter::new();
    let source = FaultingProducer::new(
        records(&[("1", json!(1)), ("2", json!(2))]),
        ErrorKind::ProducerConnectionFailed,
    );
    let destination = MemoryProducer::new(records(&[
        ("1", json!(1)),
        ("2", json!(20)),
        ("3", json!(3)),
        ("4", json!(4)),
    ]));

    let mut pipeline = create_pipeline(Some(source), Some(destination), printer.clone());
    pipeline.start().unwrap();
    let err = pipeline.wait().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ProducerConnectionFailed);

    // The fault also cancels the run, so the engine may stop before draining the records
    // that preceded it.
    let expected = vec![
        (DiffMode::Unchanged, "1".to_owned()),
        (DiffMode::Updated, "2".to_owned()),
    ];
    let printed = printer.summary().await;
    assert!(printed.len() <= expected.len());
    assert_eq!(printed[..], expected[..printed.len()]);
    assert!(printer.flushed().await);
}

#[tokio::test(flavor = "multi_thread")]
async fn source_fault_stops_the_run_while_destination_stalls() {
    init_test_tracing();

    let printer = MemoryPrinter::new();
    let source = FaultingProducer::new(
        records(&[("5", json!(5))]),
        ErrorKind::ProducerConnectionFailed,
    );
    let destination = PendingProducer::new(records(&[("1", json!(1))]));

    let mut pipeline = create_pipeline(Some(source), Some(destination), printer.clone());
    pipeline.start().unwrap();
    let err = tokio::time::timeout(Duration::from_secs(10), pipeline.wait())
        .await
        .expect("pipeline did not stop after the source fault")
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ProducerConnectionFailed);

    let printed = printer.summary().await;
    assert!(printed.len() <= 1);
    assert_eq!(printed[..], [(DiffMode::Created, "1".to_owned())][..printed.len()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn destination_fault_is_reported_when_source_is_absent() {
    init_test_tracing();

    let printer = MemoryPrinter::new();
    let destination = FaultingProducer::new(
        records(&[("a", json!(1))]),
        ErrorKind::ProducerMalformedRecord,
    );

    let mut pipeline = create_pipeline(None::<MemoryProducer>, Some(destination), printer.clone());
    pipeline.start().unwrap();
    let err = pipeline.wait().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ProducerMalformedRecord);

    let printed = printer.summary().await;
    assert!(printed.len() <= 1);
    assert_eq!(printed[..], [(DiffMode::Created, "a".to_owned())][..printed.len()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn unsorted_source_fails_fast() {
    init_test_tracing();

    let printer = MemoryPrinter::new();
    let source = MemoryProducer::new(records(&[("2", json!(2)), ("1", json!(1))]));

    let mut pipeline = create_pipeline(Some(source), None::<MemoryProducer>, printer.clone());
    pipeline.start().unwrap();
    let err = pipeline.wait().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnsortedRecords);
    assert_eq!(
        printer.summary().await,
        vec![(DiffMode::Deleted, "2".to_owned())]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_destination_ids_fail_fast() {
    init_test_tracing();

    let printer = MemoryPrinter::new();
    let source = MemoryProducer::new(records(&[("1", json!(1))]));
    let destination = MemoryProducer::new(records(&[("1", json!(1)), ("1", json!(1))]));

    let mut pipeline = create_pipeline(Some(source), Some(destination), printer.clone());
    pipeline.start().unwrap();
    let err = pipeline.wait().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnsortedRecords);
    assert!(err.detail().unwrap().contains("destination"));
}

#[tokio::test(flavor = "multi_thread")]
async fn cancellation_before_start_emits_nothing() {
    init_test_tracing();

    let printer = MemoryPrinter::new();
    let source = MemoryProducer::new(numbered_records(0, 10));
    let destination = MemoryProducer::new(numbered_records(5, 10));

    let mut pipeline = create_pipeline(Some(source), Some(destination), printer.clone());
    pipeline.shutdown();
    pipeline.start().unwrap();
    let err = pipeline.wait().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::OperationCanceled);
    assert!(err.is_cancellation());
    assert!(printer.summary().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn cancellation_mid_stream_keeps_a_prefix() {
    init_test_tracing();

    let printer = MemoryPrinter::new();
    let source = PendingProducer::new(records(&[("1", json!(1)), ("2", json!(2))]));
    let stalled = source.stalled();
    let destination = MemoryProducer::new(records(&[
        ("1", json!(1)),
        ("2", json!(2)),
        ("3", json!(3)),
    ]));

    let mut pipeline = create_pipeline(Some(source), Some(destination), printer.clone());
    pipeline.start().unwrap();

    stalled.notified().await;
    let err = pipeline.shutdown_and_wait().await.unwrap_err();

    assert!(err.is_cancellation());

    let expected = vec![
        (DiffMode::Unchanged, "1".to_owned()),
        (DiffMode::Unchanged, "2".to_owned()),
    ];
    let printed = printer.summary().await;
    assert!(printed.len() <= expected.len());
    assert_eq!(printed[..], expected[..printed.len()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_unblocks_a_stalled_producer_without_records() {
    init_test_tracing();

    let printer = MemoryPrinter::new();
    let source = PendingProducer::new(vec![]);
    let stalled = source.stalled();

    let mut pipeline = create_pipeline(Some(source), None::<MemoryProducer>, printer.clone());
    pipeline.start().unwrap();

    stalled.notified().await;
    let err = pipeline.shutdown_and_wait().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::OperationCanceled);
    assert!(printer.summary().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn printer_fault_is_the_root_fault() {
    init_test_tracing();

    let printer = FailingPrinter::new(1);
    let memory = printer.memory();
    let source = MemoryProducer::new(numbered_records(0, 50));

    let mut pipeline = create_pipeline(Some(source), None::<MemoryProducer>, printer);
    pipeline.start().unwrap();
    let err = pipeline.wait().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PrinterIoError);
    assert_eq!(
        memory.summary().await,
        vec![(DiffMode::Deleted, "00000000".to_owned())]
    );
}
