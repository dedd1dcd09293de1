use std::sync::Arc;
use std::time::Duration;

use tokio_rustls::TlsConnector;

use super::proxy::ProxyConfig;
use super::session::HttpSession;
use super::target::{Scheme, Target};
use super::{Result, tls};

/// Immutable transport configuration shared by every worker.
///
/// Cheap to clone. Each worker opens its own [`HttpSession`], which owns one keep-alive
/// connection to the proxy (or the target, when no proxy is configured).
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) target: Target,
    pub(crate) proxy: Option<ProxyConfig>,
    pub(crate) connect_timeout: Duration,
    pub(crate) tls: Option<TlsConnector>,
    pub(crate) user_agent: String,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("target", &self.inner.target)
            .field("proxy", &self.inner.proxy)
            .field("connect_timeout", &self.inner.connect_timeout)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    pub fn new(
        target: Target,
        proxy: Option<ProxyConfig>,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let tls = match target.scheme() {
            Scheme::Https => Some(tls::connector()?),
            Scheme::Http => None,
        };

        Ok(Self {
            inner: Arc::new(ClientInner {
                target,
                proxy,
                connect_timeout,
                tls,
                user_agent: format!("pxload/{}", env!("CARGO_PKG_VERSION")),
            }),
        })
    }

    #[must_use]
    pub fn session(&self) -> HttpSession {
        HttpSession::new(self.inner.clone())
    }
}
