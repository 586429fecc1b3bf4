//! Tests for MetricsService and DispatchService against real files

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use nasutil::application::services::{DispatchService, MetricsService};
use nasutil::application::ApplicationError;
use nasutil::domain::{Device, MeterFormat};
use nasutil::infrastructure::traits::RealFileSystem;
use nasutil::util::testing::init_test_setup;

#[test]
fn given_metrics_log_when_replaying_then_averages_every_metric() {
    init_test_setup();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("train.jsonl");
    std::fs::write(
        &path,
        "{\"loss\": 2.0, \"acc\": 0.5}\n\n{\"loss\": 1.0, \"acc\": 0.75}\n{\"loss\": 0.0}\n",
    )
    .unwrap();
    let service = MetricsService::new(Arc::new(RealFileSystem));

    let mut steps = Vec::new();
    let group = service
        .replay(&path, MeterFormat::GROUP, |step, group| {
            steps.push((step, group.len()))
        })
        .unwrap();

    assert_eq!(steps, vec![(1, 2), (2, 2), (3, 2)]);
    assert_eq!(group["loss"].count(), 3);
    assert!((group["loss"].avg() - 1.0).abs() < 1e-12);
    assert_eq!(group["acc"].count(), 2);
    assert_eq!(group.summary(), "loss: 1.000000  acc: 0.625000");
}

#[test]
fn given_broken_line_when_replaying_then_parse_error_names_line() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.jsonl");
    std::fs::write(&path, "{\"loss\": 1}\nnot json\n").unwrap();
    let service = MetricsService::new(Arc::new(RealFileSystem));

    let err = service.replay(&path, MeterFormat::GROUP, |_, _| {}).unwrap_err();
    match err {
        ApplicationError::Parse { message, .. } => assert!(message.starts_with("line 2:")),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn given_batch_file_when_dispatching_then_only_tensors_change_device() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("batch.json");
    std::fs::write(
        &path,
        json!({
            "inputs": [{"$tensor": {"shape": [8, 3]}}, 7],
            "label": "cat"
        })
        .to_string(),
    )
    .unwrap();
    let service = DispatchService::new(Arc::new(RealFileSystem));

    let moved = service.dispatch_file(&path, Device::Cuda(1)).unwrap();

    assert_eq!(
        moved,
        json!({
            "inputs": [{"$tensor": {"shape": [8, 3], "device": "cuda:1"}}, 7],
            "label": "cat"
        })
    );
}

#[test]
fn given_null_in_batch_when_dispatching_then_unsupported_type() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("batch.json");
    std::fs::write(&path, r#"{"mask": null}"#).unwrap();
    let service = DispatchService::new(Arc::new(RealFileSystem));

    let err = service.dispatch_file(&path, Device::Cpu).unwrap_err();
    assert_eq!(err.to_string(), "'null' has unsupported type 'NoneType'");
}
