use std::sync::Arc;
use std::time::{Duration, Instant};

use pxload_metrics::{OutcomeAggregator, StatusKey};

use super::cancel::CancellationSignal;
use crate::Transport;

/// Per-worker bookkeeping returned when the loop exits.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    /// Requests started.
    pub issued: u64,
    /// Requests aborted by the run's own stop signal (not recorded anywhere else).
    pub discarded: u64,
}

enum Attempt<E> {
    Status(u16),
    Failed(E),
    TimedOut,
}

pub struct RequestWorker<T> {
    id: usize,
    transport: T,
    aggregator: Arc<OutcomeAggregator>,
    signal: Arc<CancellationSignal>,
    request_timeout: Duration,
}

impl<T: Transport> RequestWorker<T> {
    pub fn new(
        id: usize,
        transport: T,
        aggregator: Arc<OutcomeAggregator>,
        signal: Arc<CancellationSignal>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            id,
            transport,
            aggregator,
            signal,
            request_timeout,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Request loop. Returns once the signal is observed; never starts a request after it.
    pub async fn run(mut self) -> WorkerStats {
        let mut stats = WorkerStats::default();

        while !self.signal.is_set() {
            stats.issued += 1;
            let started = Instant::now();

            let attempt = tokio::select! {
                biased;

                () = self.signal.cancelled() => None,
                res = tokio::time::timeout(self.request_timeout, self.transport.send()) => {
                    Some(match res {
                        Ok(Ok(status)) => Attempt::Status(status),
                        Ok(Err(err)) => Attempt::Failed(err),
                        Err(_) => Attempt::TimedOut,
                    })
                }
            };
            let latency = started.elapsed();

            let Some(attempt) = attempt else {
                stats.discarded += 1;
                break;
            };

            match attempt {
                Attempt::Status(status) if (200..300).contains(&status) => {
                    self.aggregator.record_success(latency);
                }
                Attempt::Status(status) => {
                    self.aggregator
                        .record_failure(StatusKey::Http(status), Some(latency));
                }
                Attempt::Failed(err) => {
                    tracing::debug!(
                        worker = self.id,
                        kind = %T::error_kind(&err),
                        error = %err,
                        "request failed"
                    );
                    self.aggregator
                        .record_failure(StatusKey::TransportError, Some(latency));
                }
                Attempt::TimedOut => {
                    tracing::debug!(
                        worker = self.id,
                        timeout = ?self.request_timeout,
                        "request timed out"
                    );
                    self.aggregator
                        .record_failure(StatusKey::TransportError, Some(latency));
                }
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Replays a fixed script of responses, then keeps repeating the last one.
    struct Scripted {
        responses: Vec<Result<u16, &'static str>>,
        delay: Duration,
        calls: Arc<AtomicU64>,
    }

    impl Transport for Scripted {
        type Error = &'static str;

        async fn send(&mut self) -> Result<u16, Self::Error> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            tokio::time::sleep(self.delay).await;
            let idx = n.min(self.responses.len().saturating_sub(1));
            self.responses.get(idx).copied().unwrap_or(Err("empty script"))
        }
    }

    fn worker(
        transport: Scripted,
        signal: Arc<CancellationSignal>,
        timeout: Duration,
    ) -> (RequestWorker<Scripted>, Arc<OutcomeAggregator>) {
        let agg = Arc::new(OutcomeAggregator::new());
        (RequestWorker::new(0, transport, agg.clone(), signal, timeout), agg)
    }

    async fn stop_after(signal: Arc<CancellationSignal>, after: Duration) {
        tokio::time::sleep(after).await;
        signal.request_stop();
    }

    #[tokio::test]
    async fn classifies_success_status_and_transport_errors() {
        let signal = Arc::new(CancellationSignal::new());
        let calls = Arc::new(AtomicU64::new(0));
        let (w, agg) = worker(
            Scripted {
                responses: vec![Ok(200), Ok(204), Ok(503), Err("refused")],
                delay: Duration::from_millis(1),
                calls: calls.clone(),
            },
            signal.clone(),
            Duration::from_secs(1),
        );

        tokio::spawn(stop_after(signal, Duration::from_millis(100)));
        let stats = w.run().await;

        let snap = agg.snapshot();
        assert_eq!(snap.success, 2);
        assert_eq!(snap.status_tally.get(&StatusKey::Http(503)), Some(&1));
        assert!(snap.status_tally.get(&StatusKey::TransportError).copied() >= Some(1));
        assert_eq!(snap.tally_total(), snap.failure);
        assert_eq!(stats.issued, snap.total() + stats.discarded);
        assert_eq!(snap.latencies.len() as u64, snap.total());
    }

    #[tokio::test]
    async fn in_flight_request_aborted_by_stop_is_discarded() {
        let signal = Arc::new(CancellationSignal::new());
        let (w, agg) = worker(
            Scripted {
                responses: vec![Ok(200)],
                delay: Duration::from_secs(5),
                calls: Arc::new(AtomicU64::new(0)),
            },
            signal.clone(),
            Duration::from_secs(10),
        );

        tokio::spawn(stop_after(signal, Duration::from_millis(50)));
        let stats = tokio::time::timeout(Duration::from_secs(2), w.run()).await;

        assert_eq!(
            stats.ok(),
            Some(WorkerStats {
                issued: 1,
                discarded: 1
            })
        );
        assert_eq!(agg.snapshot(), pxload_metrics::OutcomeSnapshot::default());
    }

    #[tokio::test]
    async fn per_request_timeout_is_a_transport_failure() {
        let signal = Arc::new(CancellationSignal::new());
        let (w, agg) = worker(
            Scripted {
                responses: vec![Ok(200)],
                delay: Duration::from_secs(5),
                calls: Arc::new(AtomicU64::new(0)),
            },
            signal.clone(),
            Duration::from_millis(20),
        );

        tokio::spawn(stop_after(signal, Duration::from_millis(150)));
        w.run().await;

        let snap = agg.snapshot();
        assert_eq!(snap.success, 0);
        assert!(snap.failure >= 2, "failure={}", snap.failure);
        assert_eq!(
            snap.status_tally.get(&StatusKey::TransportError).copied(),
            Some(snap.failure)
        );
    }

    #[tokio::test]
    async fn no_request_is_started_once_the_signal_is_set() {
        let signal = Arc::new(CancellationSignal::new());
        signal.request_stop();

        let calls = Arc::new(AtomicU64::new(0));
        let (w, agg) = worker(
            Scripted {
                responses: vec![Ok(200)],
                delay: Duration::ZERO,
                calls: calls.clone(),
            },
            signal,
            Duration::from_secs(1),
        );

        let stats = w.run().await;
        assert_eq!(stats, WorkerStats::default());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(agg.counts(), (0, 0));
    }
}
