mod config;
mod error;
mod transport;

pub mod runner;

pub use config::{
    ConfigError, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PROGRESS_INTERVAL, DEFAULT_REQUEST_TIMEOUT,
    RunConfig, RunConfigInput, parse_duration,
};
pub use error::{Error, Result};
pub use runner::{ProgressFn, ProgressUpdate, RunSummary, StopReason, run, run_http};
pub use transport::Transport;

pub use pxload_http::{HttpClient, HttpSession, ProxyConfig, Target};
pub use pxload_metrics::{
    LatencySummary, OutcomeAggregator, OutcomeSnapshot, StatusKey, TRANSPORT_ERROR_LABEL,
};
