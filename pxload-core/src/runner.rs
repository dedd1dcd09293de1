mod cancel;
mod pool;
mod progress;
mod run;
mod summary;
mod worker;

pub use cancel::{CancellationController, CancellationSignal, ControllerState, StopReason};
pub use pool::{PoolReport, WorkerPool};
pub use progress::{ProgressFn, ProgressReporter, ProgressUpdate};
pub use run::{run, run_http};
pub use summary::RunSummary;
pub use worker::{RequestWorker, WorkerStats};
