use std::fmt::Write as _;

use pxload_core::RunSummary;

use super::duration::format_duration_single;
use super::format::{format_ms, format_percent, format_rate};

pub(crate) fn render(summary: &RunSummary) -> String {
    let mut out = String::new();

    out.push_str("\ntest completed\n\n");

    writeln!(out, "workers: {}", summary.workers).ok();
    writeln!(out, "elapsed: {}", format_duration_single(summary.elapsed)).ok();
    if let Some(reason) = summary.stop_reason {
        writeln!(out, "stopped by: {reason}").ok();
    }
    out.push('\n');

    writeln!(out, "total requests: {}", summary.total_requests).ok();
    writeln!(
        out,
        "successful requests (2xx): {} ({})",
        summary.success,
        format_percent(summary.success_rate())
    )
    .ok();
    writeln!(out, "failed requests: {}", summary.failure).ok();
    for (key, count) in &summary.status_breakdown {
        writeln!(out, "  - {key}: {count}").ok();
    }
    if summary.discarded > 0 {
        writeln!(
            out,
            "discarded in-flight at stop: {} (not counted)",
            summary.discarded
        )
        .ok();
    }
    if summary.panicked_workers > 0 {
        writeln!(out, "workers panicked: {}", summary.panicked_workers).ok();
    }
    out.push('\n');

    writeln!(
        out,
        "average request duration: {}",
        format_ms(summary.avg_latency_ms)
    )
    .ok();
    writeln!(
        out,
        "requests per second: {}",
        format_rate(summary.requests_per_sec)
    )
    .ok();

    match &summary.latency {
        Some(l) => {
            writeln!(
                out,
                "latency = min={} p50={} p90={} p99={} max={} stdev={} (n={})",
                format_ms(l.min_ms),
                format_ms(l.p50_ms),
                format_ms(l.p90_ms),
                format_ms(l.p99_ms),
                format_ms(l.max_ms),
                format_ms(l.stdev_ms),
                l.count
            )
            .ok();
        }
        None => out.push_str("latency: n/a\n"),
    }

    out
}
