use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use tokio::sync::Notify;

/// One-shot, monotonic stop flag shared by the workers and the reporter.
#[derive(Debug, Default)]
pub struct CancellationSignal {
    set: AtomicBool,
    notify: Notify,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.set.load(Ordering::Acquire)
    }

    /// Sets the flag. Returns `true` only for the call that performed the transition.
    pub fn request_stop(&self) -> bool {
        let first = !self.set.swap(true, Ordering::AcqRel);
        if first {
            self.notify.notify_waiters();
        }
        first
    }

    /// Resolves once the flag is set (immediately if it already is).
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so a concurrent `request_stop` cannot be
            // missed between the check and the await.
            let notified = self.notify.notified();
            if self.is_set() {
                return;
            }
            notified.await;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ControllerState {
    Armed,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum StopReason {
    Deadline,
    External,
    /// Every worker returned before the deadline, e.g. because all of them panicked.
    WorkersExited,
}

/// Owns the run's deadline and the signal derived from it.
#[derive(Debug)]
pub struct CancellationController {
    signal: Arc<CancellationSignal>,
    started: Instant,
    duration: Duration,
    reason: OnceLock<StopReason>,
}

impl CancellationController {
    pub fn new(duration: Duration) -> Self {
        Self {
            signal: Arc::new(CancellationSignal::new()),
            started: Instant::now(),
            duration,
            reason: OnceLock::new(),
        }
    }

    /// Creates a controller and spawns the timer that expires it after `duration`.
    pub fn arm(duration: Duration) -> Arc<Self> {
        let controller = Arc::new(Self::new(duration));

        let timer = controller.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(duration) => {
                    timer.expire(StopReason::Deadline);
                }
                () = timer.signal.cancelled() => {}
            }
        });

        controller
    }

    /// External stop request. Idempotent; returns `true` if this call expired the run.
    pub fn stop(&self) -> bool {
        self.expire(StopReason::External)
    }

    /// Called once the pool has joined. A no-op when the run already expired.
    pub fn workers_exited(&self) -> bool {
        self.expire(StopReason::WorkersExited)
    }

    fn expire(&self, reason: StopReason) -> bool {
        if !self.signal.request_stop() {
            return false;
        }
        let _ = self.reason.set(reason);
        tracing::info!(%reason, elapsed = ?self.started.elapsed(), "run expired");
        true
    }

    pub fn state(&self) -> ControllerState {
        if self.signal.is_set() {
            ControllerState::Expired
        } else {
            ControllerState::Armed
        }
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.reason.get().copied()
    }

    pub fn signal(&self) -> Arc<CancellationSignal> {
        self.signal.clone()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Advisory time left until the deadline, clamped to zero.
    pub fn remaining(&self) -> Duration {
        if self.signal.is_set() {
            return Duration::ZERO;
        }
        self.duration.saturating_sub(self.started.elapsed())
    }
}
