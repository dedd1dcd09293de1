use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum HttpTransportErrorKind {
    InvalidUrl,
    UnsupportedScheme,
    InvalidProxy,
    Connect,
    ConnectTimeout,
    Tls,
    ProxyRejected,
    Tunnel,
    Handshake,
    RequestBuild,
    Request,
    BodyRead,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("only http:// and https:// URLs are supported: {0}")]
    UnsupportedScheme(String),

    #[error("invalid proxy address `{0}` (expected host:port)")]
    InvalidProxy(String),

    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),

    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("tls setup failed: {0}")]
    TlsConfig(#[from] tokio_rustls::rustls::Error),

    #[error("invalid tls server name: {0}")]
    InvalidServerName(String),

    #[error("tls handshake failed: {0}")]
    Tls(#[source] std::io::Error),

    #[error("proxy rejected the request with status {0}")]
    ProxyRejected(u16),

    #[error("proxy closed the tunnel before responding")]
    TunnelClosed,

    #[error("malformed proxy tunnel response")]
    TunnelMalformed,

    #[error("http handshake failed: {0}")]
    Handshake(#[source] hyper::Error),

    #[error("http request build failed: {0}")]
    RequestBuild(#[from] http::Error),

    #[error("invalid proxy credentials header: {0}")]
    HeaderValue(#[from] http::header::InvalidHeaderValue),

    #[error("http request failed: {0}")]
    Request(#[source] hyper::Error),

    #[error("failed to read response body: {0}")]
    BodyRead(#[source] hyper::Error),
}

impl Error {
    #[must_use]
    pub fn transport_error_kind(&self) -> HttpTransportErrorKind {
        match self {
            Self::InvalidUrl(_) => HttpTransportErrorKind::InvalidUrl,
            Self::UnsupportedScheme(_) => HttpTransportErrorKind::UnsupportedScheme,
            Self::InvalidProxy(_) | Self::HeaderValue(_) => HttpTransportErrorKind::InvalidProxy,
            Self::Connect(_) => HttpTransportErrorKind::Connect,
            Self::ConnectTimeout(_) => HttpTransportErrorKind::ConnectTimeout,
            Self::TlsConfig(_) | Self::InvalidServerName(_) | Self::Tls(_) => {
                HttpTransportErrorKind::Tls
            }
            Self::ProxyRejected(_) => HttpTransportErrorKind::ProxyRejected,
            Self::TunnelClosed | Self::TunnelMalformed => HttpTransportErrorKind::Tunnel,
            Self::Handshake(_) => HttpTransportErrorKind::Handshake,
            Self::RequestBuild(_) => HttpTransportErrorKind::RequestBuild,
            Self::Request(_) => HttpTransportErrorKind::Request,
            Self::BodyRead(_) => HttpTransportErrorKind::BodyRead,
        }
    }
}
