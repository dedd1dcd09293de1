use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::status::StatusKey;

const LATENCY_SHARDS: usize = 32;

/// Shared outcome counters for a run.
///
/// Writers only ever perform atomic increments or append to one of several latency
/// shards, so concurrent workers do not serialize on a single lock. Readers that only
/// need the counters (the live reporter) use [`OutcomeAggregator::counts`], which never
/// takes a lock.
#[derive(Debug)]
pub struct OutcomeAggregator {
    success: AtomicU64,
    failure: AtomicU64,
    status_tally: DashMap<StatusKey, AtomicU64, ahash::RandomState>,
    latencies_us: Box<[Mutex<Vec<u64>>]>,
    next_shard: AtomicUsize,
}

impl Default for OutcomeAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl OutcomeAggregator {
    #[must_use]
    pub fn new() -> Self {
        let latencies_us = (0..LATENCY_SHARDS)
            .map(|_| Mutex::new(Vec::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            success: AtomicU64::new(0),
            failure: AtomicU64::new(0),
            status_tally: DashMap::with_hasher(ahash::RandomState::new()),
            latencies_us,
            next_shard: AtomicUsize::new(0),
        }
    }

    pub fn record_success(&self, latency: Duration) {
        // Counter before latency: a snapshot reads latencies first, so it can never see
        // more latencies than attempts.
        self.success.fetch_add(1, Ordering::Relaxed);
        self.push_latency(latency);
    }

    pub fn record_failure(&self, key: StatusKey, latency: Option<Duration>) {
        self.increment_status(key);
        self.failure.fetch_add(1, Ordering::Relaxed);
        if let Some(latency) = latency {
            self.push_latency(latency);
        }
    }

    /// Lock-free `(success, failure)` read.
    #[must_use]
    pub fn counts(&self) -> (u64, u64) {
        (
            self.success.load(Ordering::Relaxed),
            self.failure.load(Ordering::Relaxed),
        )
    }

    #[must_use]
    pub fn snapshot(&self) -> OutcomeSnapshot {
        let mut latencies = Vec::new();
        for shard in self.latencies_us.iter() {
            latencies.extend(shard.lock().iter().copied().map(Duration::from_micros));
        }

        let status_tally: BTreeMap<StatusKey, u64> = self
            .status_tally
            .iter()
            .map(|entry| (*entry.key(), entry.value().load(Ordering::Relaxed)))
            .collect();

        let (success, failure) = self.counts();

        OutcomeSnapshot {
            success,
            failure,
            status_tally,
            latencies,
        }
    }

    fn increment_status(&self, key: StatusKey) {
        if let Some(counter) = self.status_tally.get(&key) {
            counter.fetch_add(1, Ordering::Relaxed);
            return;
        }

        self.status_tally
            .entry(key)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    fn push_latency(&self, latency: Duration) {
        let idx = self.next_shard.fetch_add(1, Ordering::Relaxed) % self.latencies_us.len();
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.latencies_us[idx].lock().push(micros);
    }
}

/// Point-in-time copy of the aggregator.
///
/// Each field holds a value some worker actually wrote; fields are not captured at a
/// single instant relative to each other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutcomeSnapshot {
    pub success: u64,
    pub failure: u64,
    pub status_tally: BTreeMap<StatusKey, u64>,
    pub latencies: Vec<Duration>,
}

impl OutcomeSnapshot {
    #[must_use]
    pub fn total(&self) -> u64 {
        self.success.saturating_add(self.failure)
    }

    #[must_use]
    pub fn tally_total(&self) -> u64 {
        self.status_tally.values().sum()
    }
}
