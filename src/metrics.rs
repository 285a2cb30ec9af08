// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for notes-sync.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The embedding application is responsible for choosing the exporter.
//!
//! # Metric Naming Convention
//! - `notes_sync_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `kind`: create, update, delete
//! - `status`: success, error
//! - `outcome`: changed, unchanged, failed

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

use crate::queue::OpKind;

/// Record one delivery attempt from the queue
pub fn record_delivery(kind: OpKind, status: &'static str) {
    counter!(
        "notes_sync_deliveries_total",
        "kind" => kind.as_str(),
        "status" => status
    )
    .increment(1);
}

/// Record a local mutation accepted into the cache
pub fn record_mutation(kind: OpKind) {
    counter!("notes_sync_mutations_total", "kind" => kind.as_str()).increment(1);
}

/// Record a reconciliation pull
pub fn record_pull(outcome: &'static str) {
    counter!("notes_sync_pulls_total", "outcome" => outcome).increment(1);
}

/// Record a drain pass that was skipped because another was in flight
pub fn record_drain_skipped() {
    counter!("notes_sync_drain_skipped_total").increment(1);
}

/// Set pending operation count
pub fn set_queue_depth(depth: usize) {
    gauge!("notes_sync_queue_depth").set(depth as f64);
}

/// Set cached note counts
pub fn set_cache_notes(total: usize, completed: usize) {
    gauge!("notes_sync_cache_notes").set(total as f64);
    gauge!("notes_sync_cache_completed_notes").set(completed as f64);
}

/// Record consecutive drain failures driving the backoff
pub fn set_consecutive_failures(count: u32) {
    gauge!("notes_sync_consecutive_failures").set(f64::from(count));
}

/// Record full sync latency
pub fn record_sync_latency(phase: &'static str, duration: Duration) {
    histogram!("notes_sync_phase_seconds", "phase" => phase).record(duration.as_secs_f64());
}

/// Set engine state (for monitoring state machine transitions)
pub fn set_engine_state(state: &'static str) {
    counter!("notes_sync_state_transitions_total", "state" => state).increment(1);
}

/// A timing guard that records latency on drop
pub struct LatencyTimer {
    phase: &'static str,
    start: Instant,
}

impl LatencyTimer {
    /// Start a new latency timer
    #[must_use]
    pub fn new(phase: &'static str) -> Self {
        Self {
            phase,
            start: Instant::now(),
        }
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_sync_latency(self.phase, self.start.elapsed());
    }
}
