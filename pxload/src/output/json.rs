use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write as _;
use std::sync::Arc;

use super::OutputFormatter;

pub(crate) struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn print_header(&self, _cfg: &pxload_core::RunConfig) {}

    fn progress(&self) -> Option<pxload_core::ProgressFn> {
        Some(Arc::new(move |u| {
            let line = build_progress_line(&u);
            emit_json_line(&line);
        }))
    }

    fn print_summary(&self, summary: &pxload_core::RunSummary) -> anyhow::Result<()> {
        let line = build_summary_line(summary);
        emit_json_line(&line);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonProgressLine {
    pub kind: &'static str,
    pub tick: u64,
    pub elapsed_secs: f64,
    pub remaining_secs: f64,
    pub workers: usize,
    pub success: u64,
    pub failure: u64,
    pub total_requests: u64,
    pub requests_per_sec: f64,
}

fn build_progress_line(u: &pxload_core::ProgressUpdate) -> JsonProgressLine {
    JsonProgressLine {
        kind: "progress",
        tick: u.tick,
        elapsed_secs: u.elapsed.as_secs_f64(),
        remaining_secs: u.remaining.as_secs_f64(),
        workers: u.workers,
        success: u.success,
        failure: u.failure,
        total_requests: u.total(),
        requests_per_sec: u.rps_now,
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonSummaryLine {
    pub kind: &'static str,
    pub workers: usize,
    pub elapsed_secs: f64,
    pub total_requests: u64,
    pub success: u64,
    pub failure: u64,
    /// Keyed by status code, or `request-timeout/error` for transport failures.
    pub status_breakdown: BTreeMap<String, u64>,
    pub avg_latency_ms: f64,
    pub requests_per_sec: f64,
    pub latency: Option<JsonLatencySummary>,
    pub discarded: u64,
    pub panicked_workers: usize,
    pub stop_reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonLatencySummary {
    pub count: u64,
    pub min_ms: f64,
    pub mean_ms: f64,
    pub p50_ms: f64,
    pub p90_ms: f64,
    pub p99_ms: f64,
    pub max_ms: f64,
    pub stdev_ms: f64,
}

fn build_summary_line(summary: &pxload_core::RunSummary) -> JsonSummaryLine {
    let status_breakdown = summary
        .status_breakdown
        .iter()
        .map(|(k, v)| (k.to_string(), *v))
        .collect();

    let latency = summary.latency.as_ref().map(|l| JsonLatencySummary {
        count: l.count,
        min_ms: l.min_ms,
        mean_ms: l.mean_ms,
        p50_ms: l.p50_ms,
        p90_ms: l.p90_ms,
        p99_ms: l.p99_ms,
        max_ms: l.max_ms,
        stdev_ms: l.stdev_ms,
    });

    JsonSummaryLine {
        kind: "summary",
        workers: summary.workers,
        elapsed_secs: summary.elapsed.as_secs_f64(),
        total_requests: summary.total_requests,
        success: summary.success,
        failure: summary.failure,
        status_breakdown,
        avg_latency_ms: summary.avg_latency_ms,
        requests_per_sec: summary.requests_per_sec,
        latency,
        discarded: summary.discarded,
        panicked_workers: summary.panicked_workers,
        stop_reason: summary.stop_reason.map(|r| r.to_string()),
    }
}

fn emit_json_line<T: Serialize>(line: &T) {
    let mut out = std::io::stdout().lock();
    if serde_json::to_writer(&mut out, line).is_ok() {
        let _ = writeln!(out);
    }
}
