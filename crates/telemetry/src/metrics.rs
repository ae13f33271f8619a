//! Internal metrics collection.
//!
//! Collects counters in-memory; the daemon logs snapshots periodically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 10ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s, 30s
    buckets: [AtomicU64; 10],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 10] = [10, 50, 100, 250, 500, 1000, 2500, 5000, 10000, 30000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let last = Self::BUCKET_BOUNDS.len() - 1;
        let idx = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(last);
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Returns bucket counts.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for the dashboard engine.
#[derive(Debug, Default)]
pub struct Metrics {
    // Sync cycle metrics
    pub syncs_started: Counter,
    pub syncs_completed: Counter,
    pub syncs_failed: Counter,
    pub syncs_skipped: Counter,
    pub syncs_deferred: Counter,
    pub stale_results_discarded: Counter,

    // Record store metrics
    pub records_evicted: Counter,
    pub persist_errors: Counter,

    // Latency histograms
    pub fetch_latency_ms: Histogram,

    // Gauges
    pub records_loaded: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub syncs_started: u64,
    pub syncs_completed: u64,
    pub syncs_failed: u64,
    pub syncs_skipped: u64,
    pub syncs_deferred: u64,
    pub stale_results_discarded: u64,
    pub records_evicted: u64,
    pub persist_errors: u64,
    pub fetch_latency_mean_ms: f64,
    pub records_loaded: u64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            syncs_started: self.syncs_started.get(),
            syncs_completed: self.syncs_completed.get(),
            syncs_failed: self.syncs_failed.get(),
            syncs_skipped: self.syncs_skipped.get(),
            syncs_deferred: self.syncs_deferred.get(),
            stale_results_discarded: self.stale_results_discarded.get(),
            records_evicted: self.records_evicted.get(),
            persist_errors: self.persist_errors.get(),
            fetch_latency_mean_ms: self.fetch_latency_ms.mean(),
            records_loaded: self.records_loaded.get(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_buckets() {
        let h = Histogram::new();
        h.observe(5);
        h.observe(300);
        h.observe(60_000);

        assert_eq!(h.count(), 3);
        assert_eq!(h.sum(), 60_305);
        let buckets = h.buckets();
        assert_eq!(buckets[0], (10, 1));
        assert_eq!(buckets[4], (500, 1));
        assert_eq!(buckets[9], (30000, 1));
    }

    #[test]
    fn test_snapshot_reads_counters() {
        let m = Metrics::new();
        m.syncs_started.inc_by(3);
        m.records_loaded.set(42);
        let snap = m.snapshot();
        assert_eq!(snap.syncs_started, 3);
        assert_eq!(snap.records_loaded, 42);
        assert_eq!(snap.fetch_latency_mean_ms, 0.0);
    }
}
