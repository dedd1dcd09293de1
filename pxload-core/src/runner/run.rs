use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use pxload_http::HttpClient;
use pxload_metrics::OutcomeAggregator;

use super::cancel::CancellationController;
use super::pool::WorkerPool;
use super::progress::{ProgressFn, ProgressReporter};
use super::summary::RunSummary;
use crate::{Result, RunConfig, Transport};

/// Runs a load test with caller-provided transports.
///
/// `stop` is an external trigger (e.g. Ctrl-C); when it resolves the run ends early exactly
/// as if the deadline had fired. The returned summary reflects every request that completed
/// before the workers were joined.
pub async fn run<T, F, S>(
    cfg: &RunConfig,
    make_transport: F,
    progress: Option<ProgressFn>,
    stop: S,
) -> Result<RunSummary>
where
    T: Transport,
    F: FnMut(usize) -> T,
    S: Future<Output = ()> + Send + 'static,
{
    let aggregator = Arc::new(OutcomeAggregator::new());

    let started = Instant::now();
    let controller = CancellationController::arm(cfg.duration);
    let signal = controller.signal();

    let stop_handle = {
        let controller = controller.clone();
        let signal = signal.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = stop => {
                    controller.stop();
                }
                () = signal.cancelled() => {}
            }
        })
    };

    let progress_handle = progress.map(|progress| {
        let reporter = ProgressReporter::new(cfg.progress_interval, cfg.workers);
        tokio::spawn(reporter.run(aggregator.clone(), controller.clone(), progress))
    });

    let pool = WorkerPool::new(
        cfg.workers,
        make_transport,
        aggregator.clone(),
        signal.clone(),
        cfg.request_timeout,
    );
    let pool_result = pool.run_and_join().await;
    let elapsed = started.elapsed();

    // Workers may all have ended early (panics); release the reporter and the stop task.
    controller.workers_exited();
    stop_handle.abort();
    if let Some(h) = progress_handle {
        h.await?;
    }
    let report = pool_result?;

    let snapshot = aggregator.snapshot();
    let mut summary = RunSummary::from_snapshot(&snapshot, report.workers, elapsed);
    summary.discarded = report.discarded;
    summary.panicked_workers = report.panicked;
    summary.stop_reason = controller.stop_reason();

    tracing::info!(
        total = summary.total_requests,
        success = summary.success,
        failure = summary.failure,
        discarded = summary.discarded,
        elapsed = ?summary.elapsed,
        "run finished"
    );

    Ok(summary)
}

/// Runs a load test against `cfg.target`, optionally through `cfg.proxy`.
pub async fn run_http<S>(
    cfg: &RunConfig,
    progress: Option<ProgressFn>,
    stop: S,
) -> Result<RunSummary>
where
    S: Future<Output = ()> + Send + 'static,
{
    let client = HttpClient::new(cfg.target.clone(), cfg.proxy.clone(), cfg.connect_timeout)?;

    tracing::info!(
        target = %cfg.target.url(),
        proxy = ?cfg.proxy,
        workers = cfg.workers,
        duration = ?cfg.duration,
        "starting run"
    );

    run(cfg, |_| client.session(), progress, stop).await
}
