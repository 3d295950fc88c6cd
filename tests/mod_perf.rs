use std::time::Duration;
use visioncache::perf::{MAX_SAMPLES, Operation, PerformanceMonitor};

#[test]
fn default_capacity_is_bounded() {
    let m = PerformanceMonitor::new();
    for i in 0..(MAX_SAMPLES as u64 + 25) {
        m.record(Operation::Classification, Duration::from_millis(1), i);
    }
    assert_eq!(m.len(), MAX_SAMPLES);
    assert_eq!(m.samples()[0].file_size, 25);
}

#[test]
fn metrics_serialize_per_operation() {
    let m = PerformanceMonitor::new();
    m.record(Operation::Optimization, Duration::from_millis(500), 2_000_000);
    m.record(Operation::Optimization, Duration::from_millis(1500), 2_000_000);
    let metrics = m.metrics();
    assert_eq!(metrics.optimization.samples, 2);
    assert!((metrics.optimization.average_ms - 1000.0).abs() < 1e-6);
    assert!((metrics.optimization.throughput_bytes_per_sec - 2_000_000.0).abs() < 1e-3);
    assert_eq!(metrics.classification.samples, 0);

    let v = serde_json::to_value(metrics).unwrap();
    assert_eq!(v["optimization"]["total_bytes"], 4_000_000);

    m.clear();
    assert!(m.is_empty());
}

#[tokio::test]
async fn timing_guard_measures_elapsed() {
    let m = PerformanceMonitor::new();
    let t = m.start_timing(Operation::Optimization);
    tokio::time::sleep(Duration::from_millis(20)).await;
    let d = t.stop(10);
    assert!(d >= Duration::from_millis(20));
    assert!(m.average_time(Operation::Optimization) >= Duration::from_millis(20));
}
