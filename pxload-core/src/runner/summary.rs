use std::time::Duration;

use pxload_metrics::{LatencySummary, OutcomeSnapshot, StatusKey};

use super::cancel::StopReason;

/// Final report of a run, derived once from the terminal snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub workers: usize,
    /// Wall-clock time measured by the orchestrator (start to last worker joined).
    pub elapsed: Duration,

    pub total_requests: u64,
    pub success: u64,
    pub failure: u64,
    /// Failure counts per key, in ascending key order (HTTP codes first, then the sentinel).
    pub status_breakdown: Vec<(StatusKey, u64)>,

    /// Exact mean over every recorded latency; `0.0` when none were recorded.
    pub avg_latency_ms: f64,
    pub requests_per_sec: f64,
    pub latency: Option<LatencySummary>,

    /// In-flight requests abandoned at the deadline. Not part of any count above.
    pub discarded: u64,
    pub panicked_workers: usize,
    pub stop_reason: Option<StopReason>,
}

impl RunSummary {
    pub fn from_snapshot(snapshot: &OutcomeSnapshot, workers: usize, elapsed: Duration) -> Self {
        let total_requests = snapshot.total();

        let avg_latency_ms = if snapshot.latencies.is_empty() {
            0.0
        } else {
            let sum_ms: f64 = snapshot
                .latencies
                .iter()
                .map(|d| d.as_secs_f64() * 1_000.0)
                .sum();
            sum_ms / snapshot.latencies.len() as f64
        };

        let secs = elapsed.as_secs_f64();
        let requests_per_sec = if secs > 0.0 {
            total_requests as f64 / secs
        } else {
            0.0
        };

        Self {
            workers,
            elapsed,
            total_requests,
            success: snapshot.success,
            failure: snapshot.failure,
            status_breakdown: snapshot
                .status_tally
                .iter()
                .map(|(k, v)| (*k, *v))
                .collect(),
            avg_latency_ms,
            requests_per_sec,
            latency: LatencySummary::from_latencies(&snapshot.latencies),
            discarded: 0,
            panicked_workers: 0,
            stop_reason: None,
        }
    }

    /// Share of requests that succeeded, in `0.0..=1.0`; `0.0` for an empty run.
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.success as f64 / self.total_requests as f64
    }

    pub fn transport_errors(&self) -> u64 {
        self.status_breakdown
            .iter()
            .filter(|(k, _)| k.is_transport_error())
            .map(|(_, v)| *v)
            .sum()
    }
}
