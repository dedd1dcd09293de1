use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::{Duration, sleep};

pub const PATH_OK: &str = "/ok";
pub const PATH_ERROR: &str = "/error";
pub const PATH_SLOW: &str = "/slow";
pub const PATH_HANG: &str = "/hang";
pub const PATH_STATUS: &str = "/status/{code}";

#[derive(Debug, Clone, Default)]
pub struct TestServerStats {
    requests_total: Arc<AtomicU64>,
    absolute_form_total: Arc<AtomicU64>,
    proxy_auth_ok: Arc<AtomicU64>,
    proxy_auth_rejected: Arc<AtomicU64>,
}

impl TestServerStats {
    /// Requests that reached a route handler.
    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    /// Requests whose target was in absolute form (`GET http://host/path`), i.e. proxied.
    pub fn absolute_form_total(&self) -> u64 {
        self.absolute_form_total.load(Ordering::Relaxed)
    }

    pub fn proxy_auth_ok(&self) -> u64 {
        self.proxy_auth_ok.load(Ordering::Relaxed)
    }

    pub fn proxy_auth_rejected(&self) -> u64 {
        self.proxy_auth_rejected.load(Ordering::Relaxed)
    }
}

/// Forward-proxy emulation: the server accepts absolute-form requests and, when
/// `expected_authorization` is set, answers `407` unless the request carries it.
#[derive(Debug, Clone, Default)]
pub struct ProxyMode {
    pub expected_authorization: Option<String>,
}

impl ProxyMode {
    pub fn open() -> Self {
        Self::default()
    }

    pub fn basic(username: &str, password: &str) -> Self {
        let token = STANDARD.encode(format!("{username}:{password}"));
        Self {
            expected_authorization: Some(format!("Basic {token}")),
        }
    }
}

#[derive(Debug, Clone)]
struct AppState {
    stats: TestServerStats,
    proxy: Option<ProxyMode>,
}

impl AppState {
    /// Counts the request and applies the proxy gate. `Some` short-circuits the handler.
    fn admit(&self, headers: &HeaderMap, uri: &Uri) -> Option<Response> {
        if uri.scheme().is_some() {
            self.stats.absolute_form_total.fetch_add(1, Ordering::Relaxed);
        }

        if let Some(expected) = self
            .proxy
            .as_ref()
            .and_then(|p| p.expected_authorization.as_deref())
        {
            let got = headers
                .get(header::PROXY_AUTHORIZATION)
                .and_then(|v| v.to_str().ok());
            if got != Some(expected) {
                self.stats.proxy_auth_rejected.fetch_add(1, Ordering::Relaxed);
                return Some(
                    (
                        StatusCode::PROXY_AUTHENTICATION_REQUIRED,
                        [(header::PROXY_AUTHENTICATE, "Basic realm=\"pxload\"")],
                    )
                        .into_response(),
                );
            }
            self.stats.proxy_auth_ok.fetch_add(1, Ordering::Relaxed);
        }

        self.stats.requests_total.fetch_add(1, Ordering::Relaxed);
        None
    }
}

#[derive(Debug, Clone)]
pub struct TestServerUrls {
    pub base_url: String,
    pub ok: String,
    pub error: String,
    pub slow: String,
    pub hang: String,
}

impl TestServerUrls {
    pub fn new(base_url: String) -> Self {
        Self {
            ok: format!("{base_url}{PATH_OK}"),
            error: format!("{base_url}{PATH_ERROR}"),
            slow: format!("{base_url}{PATH_SLOW}"),
            hang: format!("{base_url}{PATH_HANG}"),
            base_url,
        }
    }

    pub fn status(&self, code: u16) -> String {
        format!("{}/status/{code}", self.base_url)
    }
}

async fn handle_ok(State(state): State<AppState>, headers: HeaderMap, uri: Uri) -> Response {
    if let Some(res) = state.admit(&headers, &uri) {
        return res;
    }
    "ok".into_response()
}

async fn handle_error(State(state): State<AppState>, headers: HeaderMap, uri: Uri) -> Response {
    if let Some(res) = state.admit(&headers, &uri) {
        return res;
    }
    (StatusCode::INTERNAL_SERVER_ERROR, "error").into_response()
}

async fn handle_slow(State(state): State<AppState>, headers: HeaderMap, uri: Uri) -> Response {
    if let Some(res) = state.admit(&headers, &uri) {
        return res;
    }
    sleep(Duration::from_millis(50)).await;
    "slow".into_response()
}

async fn handle_hang(State(state): State<AppState>, headers: HeaderMap, uri: Uri) -> Response {
    if let Some(res) = state.admit(&headers, &uri) {
        return res;
    }
    sleep(Duration::from_secs(60)).await;
    "late".into_response()
}

async fn handle_status(
    State(state): State<AppState>,
    Path(code): Path<u16>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    if let Some(res) = state.admit(&headers, &uri) {
        return res;
    }
    match StatusCode::from_u16(code) {
        Ok(status) => status.into_response(),
        Err(_) => StatusCode::BAD_REQUEST.into_response(),
    }
}

fn app(state: AppState) -> Router {
    Router::new()
        .route(PATH_OK, get(handle_ok))
        .route(PATH_ERROR, get(handle_error))
        .route(PATH_SLOW, get(handle_slow))
        .route(PATH_HANG, get(handle_hang))
        .route(PATH_STATUS, get(handle_status))
        .with_state(state)
}

pub fn router(stats: TestServerStats, proxy: Option<ProxyMode>) -> Router {
    app(AppState { stats, proxy })
}

pub struct TestServer {
    addr: SocketAddr,
    base_url: String,
    urls: TestServerUrls,
    stats: TestServerStats,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Plain origin server.
    pub async fn start() -> std::io::Result<Self> {
        Self::start_with(None).await
    }

    /// Server that also behaves as a forward proxy for its own routes.
    pub async fn start_proxy(mode: ProxyMode) -> std::io::Result<Self> {
        Self::start_with(Some(mode)).await
    }

    async fn start_with(proxy: Option<ProxyMode>) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let stats = TestServerStats::default();
        let app = router(stats.clone(), proxy);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = serve.await;
        });

        let base_url = format!("http://{addr}");
        let urls = TestServerUrls::new(base_url.clone());

        Ok(Self {
            addr,
            base_url,
            urls,
            stats,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// `host:port`, suitable as a proxy address.
    pub fn authority(&self) -> String {
        self.addr.to_string()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn urls(&self) -> &TestServerUrls {
        &self.urls
    }

    pub fn stats(&self) -> &TestServerStats {
        &self.stats
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if self.shutdown_tx.is_some()
            && let Some(task) = self.task.take()
        {
            task.abort();
        }
    }
}
