use std::sync::Arc;
use std::time::Duration;

use pxload_metrics::{OutcomeAggregator, StatusKey};
use tokio::task::JoinHandle;

use super::cancel::CancellationSignal;
use super::worker::{RequestWorker, WorkerStats};
use crate::{Result, Transport};

/// What the pool observed while joining its workers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PoolReport {
    pub workers: usize,
    pub issued: u64,
    pub discarded: u64,
    pub panicked: usize,
}

pub struct WorkerPool<T> {
    workers: Vec<RequestWorker<T>>,
    aggregator: Arc<OutcomeAggregator>,
}

impl<T: Transport> WorkerPool<T> {
    /// Builds `count` workers; `make_transport` is called once per worker id.
    pub fn new(
        count: usize,
        mut make_transport: impl FnMut(usize) -> T,
        aggregator: Arc<OutcomeAggregator>,
        signal: Arc<CancellationSignal>,
        request_timeout: Duration,
    ) -> Self {
        let workers = (0..count)
            .map(|id| {
                RequestWorker::new(
                    id,
                    make_transport(id),
                    aggregator.clone(),
                    signal.clone(),
                    request_timeout,
                )
            })
            .collect();

        Self {
            workers,
            aggregator,
        }
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Spawns every worker and waits for all of them to return.
    ///
    /// A panicking worker only ends its own loop: it is counted as one transport failure
    /// (no latency) and the remaining workers keep running.
    pub async fn run_and_join(self) -> Result<PoolReport> {
        let mut report = PoolReport {
            workers: self.workers.len(),
            ..PoolReport::default()
        };

        let handles: Vec<(usize, JoinHandle<WorkerStats>)> = self
            .workers
            .into_iter()
            .map(|w| (w.id(), tokio::spawn(w.run())))
            .collect();

        for (id, handle) in handles {
            match handle.await {
                Ok(stats) => {
                    report.issued += stats.issued;
                    report.discarded += stats.discarded;
                }
                Err(err) if err.is_panic() => {
                    tracing::warn!(worker = id, "worker panicked; recording a failed request");
                    report.panicked += 1;
                    self.aggregator
                        .record_failure(StatusKey::TransportError, None);
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok(report)
    }
}
