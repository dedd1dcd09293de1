use std::fmt::Display;
use std::future::Future;

/// Issues one request against the run's target and reports the HTTP status.
///
/// Each worker owns its own transport, so implementations may keep per-connection
/// state. Dropping the returned future must leave the transport usable.
pub trait Transport: Send + 'static {
    type Error: Display + Send;

    fn send(&mut self) -> impl Future<Output = Result<u16, Self::Error>> + Send;

    /// Short, stable label for log lines (e.g. `connect`, `proxy_rejected`).
    fn error_kind(err: &Self::Error) -> String {
        let _ = err;
        "error".to_string()
    }
}

impl Transport for pxload_http::HttpSession {
    type Error = pxload_http::Error;

    async fn send(&mut self) -> Result<u16, Self::Error> {
        self.get().await.map(|res| res.status)
    }

    fn error_kind(err: &Self::Error) -> String {
        err.transport_error_kind().to_string()
    }
}
