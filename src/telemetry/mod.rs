//! Reactor telemetry.
//!
//! With the `telemetry` feature (on by default) every reactor counts
//! submitted, executed, failed and panicked tasks and keeps queue-wait and
//! run-time histograms. Without it, [`Metrics`] is a no-op with the same API.

#[cfg(feature = "telemetry")]
pub mod metrics;

#[cfg(feature = "telemetry")]
pub mod export;

#[cfg(feature = "telemetry")]
pub use metrics::{Metrics, MetricsSnapshot};

#[cfg(feature = "telemetry")]
pub use export::{to_json, JsonExporter, MetricsExporter};

// Stub implementations when telemetry is disabled
#[cfg(not(feature = "telemetry"))]
pub mod metrics {
    use crate::executor::Timestamps;
    use std::time::Duration;

    #[derive(Debug, Clone, Default)]
    pub struct Metrics;

    impl Metrics {
        pub fn new() -> Self {
            Self
        }
        pub fn record_task_submitted(&self) {}
        pub fn record_task_execution(&self, _: &Timestamps) {}
        pub fn record_task_failure(&self) {}
        pub fn record_task_panic(&self) {}
        pub fn snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot::default()
        }
        pub fn reset(&self) {}
    }

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
            0.0
        }
        pub fn failure_rate(&self) -> f64 {
            0.0
        }
        pub fn backlog(&self) -> u64 {
            0
        }
    }
}

#[cfg(not(feature = "telemetry"))]
pub use metrics::{Metrics, MetricsSnapshot};
