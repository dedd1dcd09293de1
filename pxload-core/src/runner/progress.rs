use std::sync::Arc;
use std::time::{Duration, Instant};

use pxload_metrics::OutcomeAggregator;
use tokio::time::MissedTickBehavior;

use super::cancel::CancellationController;

/// Point-in-time view of a running test, emitted once per reporting interval.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// 1-based tick counter.
    pub tick: u64,
    pub elapsed: Duration,
    pub remaining: Duration,
    pub workers: usize,
    pub success: u64,
    pub failure: u64,
    /// Requests/sec observed during the last interval.
    pub rps_now: f64,
}

impl ProgressUpdate {
    pub fn total(&self) -> u64 {
        self.success + self.failure
    }
}

pub type ProgressFn = Arc<dyn Fn(ProgressUpdate) + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy)]
pub struct ProgressReporter {
    interval: Duration,
    workers: usize,
}

impl ProgressReporter {
    pub fn new(interval: Duration, workers: usize) -> Self {
        Self { interval, workers }
    }

    /// Emits an update every interval until the controller expires. Returns the number of
    /// updates emitted. Nothing is emitted after expiry is observed.
    pub async fn run(
        self,
        aggregator: Arc<OutcomeAggregator>,
        controller: Arc<CancellationController>,
        progress: ProgressFn,
    ) -> u64 {
        let signal = controller.signal();

        let mut interval = tokio::time::interval_at(
            tokio::time::Instant::now() + self.interval,
            self.interval,
        );
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut tick: u64 = 0;
        let mut last_at = Instant::now();
        let mut last_total: u64 = 0;

        loop {
            tokio::select! {
                biased;

                () = signal.cancelled() => break,
                _ = interval.tick() => {}
            }

            if signal.is_set() {
                break;
            }

            let (success, failure) = aggregator.counts();
            let total = success + failure;

            let now = Instant::now();
            let dt = now.duration_since(last_at);
            last_at = now;
            let delta = total.saturating_sub(last_total);
            last_total = total;

            tick = tick.saturating_add(1);
            progress(ProgressUpdate {
                tick,
                elapsed: controller.elapsed(),
                remaining: controller.remaining(),
                workers: self.workers,
                success,
                failure,
                rps_now: (delta as f64) / dt.as_secs_f64().max(1e-9),
            });
        }

        tick
    }
}
