#![cfg(feature = "test-utils")]

use std::io::Cursor;

use ripa::destination::memory::MemoryDestination;
use ripa::error::ErrorKind;
use ripa::pipeline::Pipeline;
use ripa::source::CsvSource;
use ripa::test_utils::faulty_destination::FaultyDestination;
use ripa::test_utils::records::{stop_csv, stop_record, stop_record_with};
use ripa::types::Cell;
use ripa_config::shared::{BatchConfig, PipelineConfig, RowErrorPolicy};
use ripa_telemetry::tracing::init_test_tracing;

const INDEX: &str = "sd-ripa-test";

fn config(row_errors: RowErrorPolicy) -> PipelineConfig {
    PipelineConfig {
        index_name: INDEX.to_string(),
        batch: BatchConfig {
            max_size: 2,
            max_concurrent_batches: 2,
        },
        row_errors,
        ..PipelineConfig::default()
    }
}

#[tokio::test]
async fn running_twice_leaves_one_document_per_identity() {
    init_test_tracing();

    let destination = MemoryDestination::new();
    let pipeline = Pipeline::new(config(RowErrorPolicy::Abort), destination.clone()).unwrap();
    let csv = stop_csv(&[("100", "1"), ("100", "2"), ("101", "1"), ("100", "1")]);

    for _ in 0..2 {
        let source = CsvSource::from_reader(Cursor::new(csv.clone())).unwrap();
        let summary = pipeline.run(source).await.unwrap();
        assert_eq!(summary.documents_written, 4);
    }

    let ids: Vec<String> = destination
        .documents(INDEX)
        .await
        .iter()
        .map(|document| document.id().to_string())
        .collect();
    assert_eq!(ids, vec!["1001", "1002", "1011"]);
    assert_eq!(destination.index_names().await, vec![INDEX.to_string()]);
}

#[tokio::test]
async fn rerun_drops_documents_missing_from_the_new_source() {
    init_test_tracing();

    let destination = MemoryDestination::new();
    let pipeline = Pipeline::new(config(RowErrorPolicy::Abort), destination.clone()).unwrap();

    pipeline
        .run(vec![Ok(stop_record("1", "1")), Ok(stop_record("2", "1"))])
        .await
        .unwrap();
    pipeline.run(vec![Ok(stop_record("2", "1"))]).await.unwrap();

    let documents = destination.documents(INDEX).await;
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].id().as_str(), "21");
}

#[tokio::test]
async fn documents_are_normalized_on_the_way_in() {
    init_test_tracing();

    let destination = MemoryDestination::new();
    let pipeline = Pipeline::new(config(RowErrorPolicy::Abort), destination.clone()).unwrap();

    pipeline
        .run(vec![Ok(stop_record_with(
            "55",
            "2",
            &[
                ("perceived_gender", "Transboy"),
                ("intersection", "5th & Main"),
                ("perceived_limited_english", "Yes"),
            ],
        ))])
        .await
        .unwrap();

    let documents = destination.documents(INDEX).await;
    let document = &documents[0];
    assert_eq!(document.id().as_str(), "552");
    assert_eq!(document.get("driver"), Some(&Cell::Bool(false)));
    assert_eq!(
        document.get("perceived_gender"),
        Some(&Cell::String("Male".to_string()))
    );
    assert_eq!(document.get("perceived_transgender"), Some(&Cell::Bool(true)));
    assert_eq!(document.get("perceived_lgbtqia"), Some(&Cell::Bool(true)));
    assert_eq!(
        document.get("perceived_limited_english"),
        Some(&Cell::Bool(true))
    );
    assert_eq!(
        document.get("address_description"),
        Some(&Cell::String(
            "The intersection of 5th & Main and 400 Elm St".to_string()
        ))
    );
}

#[tokio::test]
async fn failed_documents_are_attributed_and_do_not_block_others() {
    init_test_tracing();

    let destination = FaultyDestination::wrap(MemoryDestination::new());
    destination.reject_document("1022").await;
    let pipeline = Pipeline::new(config(RowErrorPolicy::Abort), destination.clone()).unwrap();
    let csv = stop_csv(&[("100", "1"), ("101", "1"), ("102", "2"), ("103", "1")]);

    let err = pipeline
        .run(CsvSource::from_reader(Cursor::new(csv)).unwrap())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DestinationError);
    assert!(err.detail().unwrap().contains("`1022`"));
    assert_eq!(destination.wrapped().documents(INDEX).await.len(), 3);
}

#[tokio::test]
async fn malformed_row_aborts_by_default() {
    init_test_tracing();

    let destination = MemoryDestination::new();
    let pipeline = Pipeline::new(config(RowErrorPolicy::Abort), destination.clone()).unwrap();
    let records = vec![
        Ok(stop_record("1", "1")),
        Ok(stop_record_with("2", "1", &[("date_stop", "2022-13-99")])),
        Ok(stop_record("3", "1")),
    ];

    let err = pipeline.run(records).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConversionError);
    let ids: Vec<String> = destination
        .documents(INDEX)
        .await
        .iter()
        .map(|document| document.id().to_string())
        .collect();
    assert_eq!(ids, vec!["11"]);
}

#[tokio::test]
async fn malformed_rows_are_skipped_when_configured() {
    init_test_tracing();

    let destination = MemoryDestination::new();
    let pipeline = Pipeline::new(config(RowErrorPolicy::Skip), destination.clone()).unwrap();
    let records = vec![
        Ok(stop_record("1", "1")),
        Ok(stop_record_with("2", "1", &[("time_stop", "noon")])),
        Ok(stop_record("3", "1")),
    ];

    let summary = pipeline.run(records).await.unwrap();

    assert_eq!(summary.documents_written, 2);
    assert_eq!(summary.rows_skipped, 1);
    assert_eq!(destination.documents(INDEX).await.len(), 2);
}

#[tokio::test]
async fn invalid_configuration_is_rejected_up_front() {
    let bad_timezone = PipelineConfig {
        timezone: "Pacific/Atlantis".to_string(),
        ..config(RowErrorPolicy::Abort)
    };
    let err = Pipeline::new(bad_timezone, MemoryDestination::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigError);

    let bad_index = PipelineConfig {
        index_name: "Stops".to_string(),
        ..config(RowErrorPolicy::Abort)
    };
    let err = Pipeline::new(bad_index, MemoryDestination::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigError);
}

#[tokio::test]
async fn shutdown_reaches_the_destination() {
    let destination = FaultyDestination::wrap(MemoryDestination::new());
    let pipeline = Pipeline::new(config(RowErrorPolicy::Abort), destination.clone()).unwrap();

    pipeline.shutdown().await.unwrap();

    assert!(destination.shutdown_called().await);
}
