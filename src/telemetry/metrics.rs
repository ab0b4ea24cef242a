//! Reactor metrics: task counters and latency histograms.

use crate::executor::Timestamps;
use hdrhistogram::Histogram;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

// one hour in nanoseconds
const MAX_TRACKED_NS: u64 = 3_600_000_000_000;

/// Metrics collector shared by a reactor and its worker.
#[derive(Debug)]
pub struct Metrics {
    tasks_submitted: AtomicU64,
    tasks_executed: AtomicU64,
    tasks_failed: AtomicU64,
    tasks_panicked: AtomicU64,

    queue_wait: Mutex<Histogram<u64>>,
    run_time: Mutex<Histogram<u64>>,

    start_time: Mutex<Instant>,
}

fn latency_histogram() -> Histogram<u64> {
    Histogram::new_with_max(MAX_TRACKED_NS, 3).expect("histogram bounds are constant and valid")
}

fn as_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            tasks_submitted: AtomicU64::new(0),
            tasks_executed: AtomicU64::new(0),
            tasks_failed: AtomicU64::new(0),
            tasks_panicked: AtomicU64::new(0),
            queue_wait: Mutex::new(latency_histogram()),
            run_time: Mutex::new(latency_histogram()),
            start_time: Mutex::new(Instant::now()),
        }
    }

    pub fn record_task_submitted(&self) {
        self.tasks_submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a task the executor has finished with, whatever the outcome.
    pub fn record_task_execution(&self, times: &Timestamps) {
        self.tasks_executed.fetch_add(1, Ordering::Relaxed);

        if let Some(wait) = times.queue_wait() {
            self.queue_wait.lock().saturating_record(as_nanos(wait));
        }
        if let Some(run) = times.run_time() {
            self.run_time.lock().saturating_record(as_nanos(run));
        }
    }

    pub fn record_task_failure(&self) {
        self.tasks_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_task_panic(&self) {
        self.tasks_panicked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let wait = self.queue_wait.lock();
        let run = self.run_time.lock();

        MetricsSnapshot {
            uptime: self.start_time.lock().elapsed(),
            tasks_submitted: self.tasks_submitted.load(Ordering::Relaxed),
            tasks_executed: self.tasks_executed.load(Ordering::Relaxed),
            tasks_failed: self.tasks_failed.load(Ordering::Relaxed),
            tasks_panicked: self.tasks_panicked.load(Ordering::Relaxed),
            avg_queue_wait_ns: mean(&wait),
            p99_queue_wait_ns: wait.value_at_quantile(0.99),
            avg_latency_ns: mean(&run),
            p50_latency_ns: run.value_at_quantile(0.50),
            p95_latency_ns: run.value_at_quantile(0.95),
            p99_latency_ns: run.value_at_quantile(0.99),
            max_latency_ns: run.max(),
        }
    }

    pub fn reset(&self) {
        self.tasks_submitted.store(0, Ordering::Relaxed);
        self.tasks_executed.store(0, Ordering::Relaxed);
        self.tasks_failed.store(0, Ordering::Relaxed);
        self.tasks_panicked.store(0, Ordering::Relaxed);
        self.queue_wait.lock().reset();
        self.run_time.lock().reset();
        *self.start_time.lock() = Instant::now();
    }
}

fn mean(hist: &Histogram<u64>) -> u64 {
    if hist.len() == 0 {
        0
    } else {
        hist.mean() as u64
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Metrics at a point in time. Latencies are in nanoseconds; "latency" is the
/// executor's run time, "queue wait" the time between submission and pickup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub uptime: Duration,
    pub tasks_submitted: u64,
    pub tasks_executed: u64,
    pub tasks_failed: u64,
    pub tasks_panicked: u64,
    pub avg_queue_wait_ns: u64,
    pub p99_queue_wait_ns: u64,
    pub avg_latency_ns: u64,
    pub p50_latency_ns: u64,
    pub p95_latency_ns: u64,
    pub p99_latency_ns: u64,
    pub max_latency_ns: u64,
}

impl MetricsSnapshot {
    pub fn tasks_per_second(&self) -> f64 {
        let seconds = self.uptime.as_secs_f64();
        if seconds == 0.0 {
            return 0.0;
        }
        self.tasks_executed as f64 / seconds
    }

    /// Share of executed tasks that failed or panicked (0.0 to 1.0).
    pub fn failure_rate(&self) -> f64 {
        if self.tasks_executed == 0 {
            return 0.0;
        }
        (self.tasks_failed + self.tasks_panicked) as f64 / self.tasks_executed as f64
    }

    /// Tasks submitted but not yet run.
    pub fn backlog(&self) -> u64 {
        self.tasks_submitted.saturating_sub(self.tasks_executed)
    }
}
