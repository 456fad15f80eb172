//! Integration tests for harbor-metrics.
//!
//! Tests the public API: registry creation, metric recording, and Prometheus export format.

use harbor_metrics::{types::PickerKind, Encoder, MetricsRegistry, TextEncoder};

#[test]
fn test_metrics_registry_creation() {
    let registry = MetricsRegistry::new();
    assert!(registry.is_ok(), "MetricsRegistry should create successfully");
}

#[test]
fn test_metrics_registry_default() {
    let _registry = MetricsRegistry::default();
}

#[test]
fn test_dispatch_metrics() {
    let registry = MetricsRegistry::new().unwrap();
    registry.record_dispatch(PickerKind::Object, true, 0.01);
    registry.record_dispatch(PickerKind::Delete, false, 0.02);
    registry.record_dispatch(PickerKind::BucketList, true, 0.03);
}

#[test]
fn test_backend_metrics() {
    let registry = MetricsRegistry::new().unwrap();
    registry.record_backend_round_trip("b1.local", true, 0.05);
    registry.record_backend_round_trip("b2.local", false, 0.2);
}

#[test]
fn test_repair_metrics() {
    let registry = MetricsRegistry::new().unwrap();
    for _ in 0..10 {
        registry.record_repair_emitted();
    }
    for _ in 0..2 {
        registry.record_repair_dropped();
    }
}

#[test]
fn test_multipart_ring_metrics() {
    let registry = MetricsRegistry::new().unwrap();
    registry.record_multipart_selection("b1.local");
    registry.record_multipart_selection("b2.local");
}

#[test]
fn test_prometheus_export_format() {
    let registry = MetricsRegistry::new().unwrap();
    registry.record_dispatch(PickerKind::Object, true, 0.01);
    registry.record_repair_emitted();

    let encoder = TextEncoder::new();
    let metric_families = registry.registry().gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();

    let output = String::from_utf8(buffer).unwrap();
    assert!(output.contains("harbor_dispatch_total"));
    assert!(output.contains("harbor_repair_records_emitted_total"));
}

#[test]
fn test_registry_thread_safety() {
    use std::sync::Arc;
    use std::thread;

    let registry = Arc::new(MetricsRegistry::new().unwrap());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let reg = Arc::clone(&registry);
            thread::spawn(move || {
                for j in 0..100 {
                    reg.record_backend_round_trip("b1.local", j % 2 == 0, 0.01);
                    reg.record_dispatch(PickerKind::Object, i % 2 == 0, 0.01);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
