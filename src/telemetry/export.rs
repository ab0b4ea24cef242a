//! Metrics export.

use super::metrics::MetricsSnapshot;
use crate::error::{Error, Result};
use serde::Serialize;
use std::path::PathBuf;

pub trait MetricsExporter: Send + Sync {
    fn export(&self, snapshot: &MetricsSnapshot) -> Result<()>;
}

/// Writes each snapshot as a pretty-printed JSON document, replacing the file.
#[derive(Debug, Clone)]
pub struct JsonExporter {
    output_path: PathBuf,
}

impl JsonExporter {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }
}

impl MetricsExporter for JsonExporter {
    fn export(&self, snapshot: &MetricsSnapshot) -> Result<()> {
        let json = to_json(snapshot)?;
        std::fs::write(&self.output_path, json)
            .map_err(|e| Error::telemetry(format!("failed to write {}: {}", self.output_path.display(), e)))
    }
}

/// Renders a snapshot the way [`JsonExporter`] writes it.
pub fn to_json(snapshot: &MetricsSnapshot) -> Result<String> {
    serde_json::to_string_pretty(&SerializableSnapshot::from(snapshot))
        .map_err(|e| Error::telemetry(format!("JSON serialization failed: {}", e)))
}

#[derive(Debug, Clone, Serialize)]
struct SerializableSnapshot {
    uptime_secs: f64,
    tasks_submitted: u64,
    tasks_executed: u64,
    tasks_failed: u64,
    tasks_panicked: u64,
    avg_queue_wait_us: f64,
    p99_queue_wait_us: f64,
    avg_latency_us: f64,
    p50_latency_us: f64,
    p95_latency_us: f64,
    p99_latency_us: f64,
    max_latency_us: f64,
    tasks_per_second: f64,
    failure_rate: f64,
}

fn micros(ns: u64) -> f64 {
    ns as f64 / 1_000.0
}

impl From<&MetricsSnapshot> for SerializableSnapshot {
    fn from(snapshot: &MetricsSnapshot) -> Self {
        Self {
            uptime_secs: snapshot.uptime.as_secs_f64(),
            tasks_submitted: snapshot.tasks_submitted,
            tasks_executed: snapshot.tasks_executed,
            tasks_failed: snapshot.tasks_failed,
            tasks_panicked: snapshot.tasks_panicked,
            avg_queue_wait_us: micros(snapshot.avg_queue_wait_ns),
            p99_queue_wait_us: micros(snapshot.p99_queue_wait_ns),
            avg_latency_us: micros(snapshot.avg_latency_ns),
            p50_latency_us: micros(snapshot.p50_latency_ns),
            p95_latency_us: micros(snapshot.p95_latency_ns),
            p99_latency_us: micros(snapshot.p99_latency_ns),
            max_latency_us: micros(snapshot.max_latency_ns),
            tasks_per_second: snapshot.tasks_per_second(),
            failure_rate: snapshot.failure_rate(),
        }
    }
}
