//! Timing and throughput bookkeeping for optimization and classification.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Samples kept per monitor; older samples are dropped first.
pub const MAX_SAMPLES: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Optimization,
    Classification,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PerformanceSample {
    pub operation: Operation,
    pub duration: Duration,
    pub file_size: u64,
    /// Epoch milliseconds when the sample was recorded.
    pub timestamp: i64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct OperationMetrics {
    pub samples: usize,
    pub average_ms: f64,
    pub total_bytes: u64,
    pub throughput_bytes_per_sec: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    pub optimization: OperationMetrics,
    pub classification: OperationMetrics,
}

/// Ring buffer of recent timing samples.
pub struct PerformanceMonitor {
    samples: Mutex<VecDeque<PerformanceSample>>,
    capacity: usize,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::with_capacity(MAX_SAMPLES)
    }
}

/// Running timer returned by [`PerformanceMonitor::start_timing`].
#[must_use = "call stop() to record the sample"]
pub struct TimingGuard<'a> {
    monitor: &'a PerformanceMonitor,
    operation: Operation,
    start: Instant,
}

impl TimingGuard<'_> {
    /// Records the elapsed time against `file_size` bytes and returns it.
    pub fn stop(self, file_size: u64) -> Duration {
        let elapsed = self.start.elapsed();
        self.monitor.record(self.operation, elapsed, file_size);
        elapsed
    }
}

impl PerformanceMonitor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { samples: Mutex::new(VecDeque::with_capacity(capacity)), capacity }
    }

    pub fn start_timing(&self, operation: Operation) -> TimingGuard<'_> {
        TimingGuard { monitor: self, operation, start: Instant::now() }
    }

    pub fn record(&self, operation: Operation, duration: Duration, file_size: u64) {
        let sample = PerformanceSample {
            operation,
            duration,
            file_size,
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        log::debug!(
            target: "visioncache::metrics",
            "{operation:?} took {:.1}ms for {file_size} bytes",
            duration.as_secs_f64() * 1000.0
        );
        let mut samples = self.samples.lock();
        while samples.len() >= self.capacity {
            samples.pop_front();
        }
        samples.push_back(sample);
    }

    #[must_use]
    pub fn samples(&self) -> Vec<PerformanceSample> {
        self.samples.lock().iter().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.samples.lock().clear();
    }

    /// Mean duration of `operation`, zero without samples.
    #[must_use]
    pub fn average_time(&self, operation: Operation) -> Duration {
        let samples = self.samples.lock();
        let (count, total) = samples
            .iter()
            .filter(|s| s.operation == operation)
            .fold((0u32, Duration::ZERO), |(n, t), s| (n + 1, t + s.duration));
        if count == 0 { Duration::ZERO } else { total / count }
    }

    /// Total bytes over total seconds for `operation`, zero without elapsed time.
    #[must_use]
    pub fn throughput(&self, operation: Operation) -> f64 {
        let samples = self.samples.lock();
        let (bytes, secs) = samples
            .iter()
            .filter(|s| s.operation == operation)
            .fold((0u64, 0f64), |(b, t), s| (b + s.file_size, t + s.duration.as_secs_f64()));
        if secs > 0.0 { bytes as f64 / secs } else { 0.0 }
    }

    fn operation_metrics(&self, operation: Operation) -> OperationMetrics {
        let (samples, total_bytes) = {
            let guard = self.samples.lock();
            guard
                .iter()
                .filter(|s| s.operation == operation)
                .fold((0usize, 0u64), |(n, b), s| (n + 1, b + s.file_size))
        };
        OperationMetrics {
            samples,
            average_ms: self.average_time(operation).as_secs_f64() * 1000.0,
            total_bytes,
            throughput_bytes_per_sec: self.throughput(operation),
        }
    }

    #[must_use]
    pub fn metrics(&self) -> PerformanceMetrics {
        PerformanceMetrics {
            optimization: self.operation_metrics(Operation::Optimization),
            classification: self.operation_metrics(Operation::Classification),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_buffer_drops_oldest() {
        let m = PerformanceMonitor::with_capacity(3);
        for size in 1..=5u64 {
            m.record(Operation::Optimization, Duration::from_millis(10), size);
        }
        let sizes: Vec<u64> = m.samples().iter().map(|s| s.file_size).collect();
        assert_eq!(sizes, vec![3, 4, 5]);
    }

    #[test]
    fn averages_are_per_operation() {
        let m = PerformanceMonitor::new();
        m.record(Operation::Optimization, Duration::from_millis(100), 1_000);
        m.record(Operation::Optimization, Duration::from_millis(300), 3_000);
        m.record(Operation::Classification, Duration::from_millis(50), 0);
        assert_eq!(m.average_time(Operation::Optimization), Duration::from_millis(200));
        assert!((m.throughput(Operation::Optimization) - 10_000.0).abs() < 1e-6);
        let all = m.metrics();
        assert_eq!(all.optimization.samples, 2);
        assert_eq!(all.classification.samples, 1);
        assert_eq!(all.classification.throughput_bytes_per_sec, 0.0);
    }

    #[test]
    fn empty_monitor_reports_zero() {
        let m = PerformanceMonitor::new();
        assert_eq!(m.average_time(Operation::Classification), Duration::ZERO);
        assert_eq!(m.throughput(Operation::Classification), 0.0);
    }

    #[test]
    fn guard_records_on_stop() {
        let m = PerformanceMonitor::new();
        let t = m.start_timing(Operation::Classification);
        let d = t.stop(42);
        let s = m.samples();
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].file_size, 42);
        assert_eq!(s[0].duration, d);
    }
}
