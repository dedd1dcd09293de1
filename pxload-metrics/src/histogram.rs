use std::time::Duration;

use hdrhistogram::Histogram;

/// Latency distribution of a run, in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencySummary {
    pub count: u64,
    pub min_ms: f64,
    pub mean_ms: f64,
    pub p50_ms: f64,
    pub p90_ms: f64,
    pub p99_ms: f64,
    pub max_ms: f64,
    pub stdev_ms: f64,
}

impl LatencySummary {
    /// `None` when there are no samples.
    #[must_use]
    pub fn from_latencies(latencies: &[Duration]) -> Option<Self> {
        if latencies.is_empty() {
            return None;
        }

        let mut h = new_latency_histogram()?;
        for l in latencies {
            let us = u64::try_from(l.as_micros()).unwrap_or(u64::MAX);
            h.saturating_record(us);
        }

        let to_ms = |us: u64| us as f64 / 1_000.0;
        Some(Self {
            count: h.len(),
            min_ms: to_ms(h.min()),
            mean_ms: h.mean() / 1_000.0,
            p50_ms: to_ms(h.value_at_quantile(0.50)),
            p90_ms: to_ms(h.value_at_quantile(0.90)),
            p99_ms: to_ms(h.value_at_quantile(0.99)),
            max_ms: to_ms(h.max()),
            stdev_ms: h.stdev() / 1_000.0,
        })
    }
}

fn new_latency_histogram() -> Option<Histogram<u64>> {
    // Microseconds, up to one hour.
    Histogram::<u64>::new_with_bounds(1, 3_600_000_000, 3).ok()
}
