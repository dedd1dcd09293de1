use std::sync::Arc;

use bytes::Bytes;
use http::header::{HOST, PROXY_AUTHORIZATION, USER_AGENT};
use http_body_util::{BodyExt as _, Empty};
use hyper::Request;
use hyper::client::conn::http1::{self, SendRequest};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::rustls::pki_types::ServerName;

use super::client::ClientInner;
use super::target::Scheme;
use super::{Error, Result, tunnel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body_bytes: u64,
}

impl HttpResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One worker's connection state.
///
/// The connection is opened lazily and reused across requests. It is dropped after any
/// error, and also when a request future is dropped mid-flight, so the next request
/// always starts on a clean connection.
pub struct HttpSession {
    client: Arc<ClientInner>,
    sender: Option<SendRequest<Empty<Bytes>>>,
}

impl HttpSession {
    pub(crate) fn new(client: Arc<ClientInner>) -> Self {
        Self {
            client,
            sender: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.sender.as_ref().is_some_and(|s| !s.is_closed())
    }

    /// Issues one GET to the configured target and drains the response body.
    pub async fn get(&mut self) -> Result<HttpResponse> {
        let mut sender = match self.sender.take() {
            Some(s) if !s.is_closed() => s,
            _ => self.connect().await?,
        };

        if sender.ready().await.is_err() {
            // The server closed the idle keep-alive connection between requests.
            sender = self.connect().await?;
            sender.ready().await.map_err(Error::Request)?;
        }

        let req = self.build_request()?;
        let res = sender.send_request(req).await.map_err(Error::Request)?;
        let status = res.status().as_u16();
        let body = res
            .into_body()
            .collect()
            .await
            .map_err(Error::BodyRead)?
            .to_bytes();

        if self.forwarding()
            && status == http::StatusCode::PROXY_AUTHENTICATION_REQUIRED.as_u16()
        {
            return Err(Error::ProxyRejected(status));
        }

        self.sender = Some(sender);

        Ok(HttpResponse {
            status,
            body_bytes: body.len() as u64,
        })
    }

    /// Plain-HTTP target behind a proxy: requests go to the proxy in absolute form.
    fn forwarding(&self) -> bool {
        self.client.proxy.is_some() && self.client.target.scheme() == Scheme::Http
    }

    fn build_request(&self) -> Result<Request<Empty<Bytes>>> {
        let target = &self.client.target;
        let uri = if self.forwarding() {
            target.absolute_form()
        } else {
            target.origin_form()
        };

        let mut builder = Request::get(uri)
            .header(HOST, target.host_header())
            .header(USER_AGENT, self.client.user_agent.as_str());

        if self.forwarding()
            && let Some(auth) = self.client.proxy.as_ref().and_then(|p| p.authorization())
        {
            builder = builder.header(PROXY_AUTHORIZATION, http::HeaderValue::from_str(&auth)?);
        }

        Ok(builder.body(Empty::new())?)
    }

    async fn connect(&self) -> Result<SendRequest<Empty<Bytes>>> {
        let timeout = self.client.connect_timeout;
        match tokio::time::timeout(timeout, self.open()).await {
            Ok(res) => res,
            Err(_) => Err(Error::ConnectTimeout(timeout)),
        }
    }

    async fn open(&self) -> Result<SendRequest<Empty<Bytes>>> {
        let c = &self.client;
        let (host, port) = match &c.proxy {
            Some(p) => (p.host(), p.port()),
            None => (c.target.host(), c.target.port()),
        };

        let stream = TcpStream::connect((host, port))
            .await
            .map_err(Error::Connect)?;
        let _ = stream.set_nodelay(true);

        let Some(tls) = c.tls.as_ref() else {
            return handshake(stream).await;
        };

        let stream = match &c.proxy {
            Some(proxy) => tunnel::connect_tunnel(stream, &c.target, proxy).await?,
            None => stream,
        };

        let server_name = ServerName::try_from(c.target.host().to_string())
            .map_err(|_| Error::InvalidServerName(c.target.host().to_string()))?;
        let stream = tls
            .connect(server_name, stream)
            .await
            .map_err(Error::Tls)?;

        handshake(stream).await
    }
}

async fn handshake<S>(io: S) -> Result<SendRequest<Empty<Bytes>>>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (sender, conn) = http1::handshake(TokioIo::new(io))
        .await
        .map_err(Error::Handshake)?;

    tokio::spawn(async move {
        if let Err(err) = conn.await {
            tracing::trace!(error = %err, "connection closed with error");
        }
    });

    Ok(sender)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HttpClient, ProxyConfig, Target};
    use std::time::{Duration, Instant};
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
    use tokio::net::TcpListener;

    fn target(url: &str) -> Target {
        match Target::parse(url) {
            Ok(t) => t,
            Err(err) => panic!("bad target {url}: {err}"),
        }
    }

    fn client(target: Target, proxy: Option<ProxyConfig>) -> HttpClient {
        match HttpClient::new(target, proxy, Duration::from_millis(500)) {
            Ok(c) => c,
            Err(err) => panic!("client: {err}"),
        }
    }

    /// Accepts one connection, captures the request head, answers with `response`.
    async fn one_shot_server(response: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = match TcpListener::bind("127.0.0.1:0").await {
            Ok(l) => l,
            Err(err) => panic!("bind: {err}"),
        };
        let addr = match listener.local_addr() {
            Ok(a) => a,
            Err(err) => panic!("local_addr: {err}"),
        };

        let task = tokio::spawn(async move {
            let Ok((mut sock, _)) = listener.accept().await else {
                return String::new();
            };
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                match sock.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => buf.extend_from_slice(&chunk[..n]),
                }
            }
            let _ = sock.write_all(response.as_bytes()).await;
            let _ = sock.shutdown().await;
            String::from_utf8_lossy(&buf).to_string()
        });

        (addr.to_string(), task)
    }

    /// Optionally accepts a `CONNECT` with `connect_reply`, then waits for the client's
    /// first TLS bytes and answers them with plain text.
    async fn non_tls_server(
        connect_reply: Option<&'static str>,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = match TcpListener::bind("127.0.0.1:0").await {
            Ok(l) => l,
            Err(err) => panic!("bind: {err}"),
        };
        let addr = match listener.local_addr() {
            Ok(a) => a,
            Err(err) => panic!("local_addr: {err}"),
        };

        let task = tokio::spawn(async move {
            let Ok((mut sock, _)) = listener.accept().await else {
                return String::new();
            };
            let mut chunk = [0u8; 4096];
            let mut head = Vec::new();
            if let Some(reply) = connect_reply {
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match sock.read(&mut chunk).await {
                        Ok(0) | Err(_) => return String::new(),
                        Ok(n) => head.extend_from_slice(&chunk[..n]),
                    }
                }
                if sock.write_all(reply.as_bytes()).await.is_err() {
                    return String::new();
                }
            }
            let _ = sock.read(&mut chunk).await;
            let _ = sock
                .write_all(b"HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\n\r\n")
                .await;
            let _ = sock.shutdown().await;
            String::from_utf8_lossy(&head).to_string()
        });

        (addr.to_string(), task)
    }

    #[tokio::test]
    async fn https_through_established_tunnel_reaches_tls_handshake() {
        let (proxy_addr, seen) =
            non_tls_server(Some("HTTP/1.1 200 Connection established\r\n\r\n")).await;
        let proxy = match ProxyConfig::parse(&proxy_addr, None, None) {
            Ok(p) => p,
            Err(err) => panic!("proxy: {err}"),
        };

        let mut session = client(target("https://origin.invalid/"), Some(proxy)).session();
        let err = match session.get().await {
            Ok(r) => panic!("expected tls failure, got {r:?}"),
            Err(err) => err,
        };
        assert!(matches!(err, Error::Tls(_)), "{err}");
        assert!(!session.is_connected());

        let head = seen.await.unwrap_or_default();
        assert!(
            head.starts_with("CONNECT origin.invalid:443 HTTP/1.1\r\n"),
            "{head}"
        );
    }

    #[tokio::test]
    async fn direct_https_runs_tls_on_the_target_connection() {
        let (addr, _seen) = non_tls_server(None).await;

        let mut session = client(target(&format!("https://{addr}/")), None).session();
        let err = match session.get().await {
            Ok(r) => panic!("expected tls failure, got {r:?}"),
            Err(err) => err,
        };
        assert!(matches!(err, Error::Tls(_)), "{err}");
    }

    #[tokio::test]
    async fn forward_proxy_receives_absolute_form_and_credentials() {
        let (proxy_addr, seen) =
            one_shot_server("HTTP/1.1 204 No Content\r\nContent-Length: 0\r\n\r\n").await;
        let proxy = match ProxyConfig::parse(&proxy_addr, Some("alice"), Some("s3cret")) {
            Ok(p) => p,
            Err(err) => panic!("proxy: {err}"),
        };

        let mut session = client(target("http://origin.invalid/x?y=1"), Some(proxy)).session();
        let res = match session.get().await {
            Ok(r) => r,
            Err(err) => panic!("request failed: {err}"),
        };
        assert_eq!(res.status, 204);
        assert!(res.is_success());

        let head = seen.await.unwrap_or_default();
        assert!(
            head.starts_with("GET http://origin.invalid/x?y=1 HTTP/1.1\r\n"),
            "{head}"
        );
        assert!(
            head.to_ascii_lowercase()
                .contains("proxy-authorization: basic ywxpy2u6cznjcmv0"),
            "{head}"
        );
    }

    #[tokio::test]
    async fn forward_proxy_407_is_a_proxy_rejection() {
        let (proxy_addr, _seen) = one_shot_server(
            "HTTP/1.1 407 Proxy Authentication Required\r\nContent-Length: 0\r\n\r\n",
        )
        .await;
        let proxy = match ProxyConfig::parse(&proxy_addr, None, None) {
            Ok(p) => p,
            Err(err) => panic!("proxy: {err}"),
        };

        let mut session = client(target("http://origin.invalid/"), Some(proxy)).session();
        let err = match session.get().await {
            Ok(r) => panic!("expected rejection, got {r:?}"),
            Err(err) => err,
        };
        assert!(matches!(err, Error::ProxyRejected(407)), "{err}");
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn direct_request_uses_origin_form() {
        let (addr, seen) =
            one_shot_server("HTTP/1.1 500 Internal Server Error\r\nContent-Length: 2\r\n\r\nno")
                .await;

        let mut session = client(target(&format!("http://{addr}/health")), None).session();
        let res = match session.get().await {
            Ok(r) => r,
            Err(err) => panic!("request failed: {err}"),
        };
        assert_eq!(res.status, 500);
        assert_eq!(res.body_bytes, 2);
        assert!(!res.is_success());

        let head = seen.await.unwrap_or_default();
        assert!(head.starts_with("GET /health HTTP/1.1\r\n"), "{head}");
    }

    #[tokio::test]
    async fn https_through_proxy_fails_when_connect_is_rejected() {
        let (proxy_addr, seen) =
            one_shot_server("HTTP/1.1 403 Forbidden\r\nContent-Length: 0\r\n\r\n").await;
        let proxy = match ProxyConfig::parse(&proxy_addr, None, None) {
            Ok(p) => p,
            Err(err) => panic!("proxy: {err}"),
        };

        let mut session = client(target("https://origin.invalid/"), Some(proxy)).session();
        let err = match session.get().await {
            Ok(r) => panic!("expected rejection, got {r:?}"),
            Err(err) => err,
        };
        assert!(matches!(err, Error::ProxyRejected(403)), "{err}");

        let head = seen.await.unwrap_or_default();
        assert!(
            head.starts_with("CONNECT origin.invalid:443 HTTP/1.1\r\n"),
            "{head}"
        );
    }

    #[tokio::test]
    async fn refused_connection_fails_fast() {
        // Bind then drop to get a port nothing listens on.
        let addr = match TcpListener::bind("127.0.0.1:0").await {
            Ok(l) => match l.local_addr() {
                Ok(a) => a,
                Err(err) => panic!("local_addr: {err}"),
            },
            Err(err) => panic!("bind: {err}"),
        };

        let mut session = client(target(&format!("http://{addr}/")), None).session();
        let started = Instant::now();
        let err = match session.get().await {
            Ok(r) => panic!("expected failure, got {r:?}"),
            Err(err) => err,
        };
        assert!(
            matches!(err, Error::Connect(_) | Error::ConnectTimeout(_)),
            "{err}"
        );
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
