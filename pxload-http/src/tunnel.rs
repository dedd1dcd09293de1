use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
use tokio::net::TcpStream;

use super::proxy::ProxyConfig;
use super::target::Target;
use super::{Error, Result};

const MAX_RESPONSE_HEAD: usize = 8 * 1024;

/// Asks the proxy for a `CONNECT` tunnel to `target` and returns the raw stream once the
/// proxy answers 2xx.
pub(super) async fn connect_tunnel(
    mut stream: TcpStream,
    target: &Target,
    proxy: &ProxyConfig,
) -> Result<TcpStream> {
    let authority = target.authority();
    let mut head = format!("CONNECT {authority} HTTP/1.1\r\nHost: {authority}\r\n");
    if let Some(auth) = proxy.authorization() {
        head.push_str("Proxy-Authorization: ");
        head.push_str(&auth);
        head.push_str("\r\n");
    }
    head.push_str("\r\n");

    stream
        .write_all(head.as_bytes())
        .await
        .map_err(Error::Connect)?;

    let mut buf = Vec::with_capacity(256);
    let mut chunk = [0u8; 512];
    loop {
        let n = stream.read(&mut chunk).await.map_err(Error::Connect)?;
        if n == 0 {
            return Err(Error::TunnelClosed);
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
        if buf.len() > MAX_RESPONSE_HEAD {
            return Err(Error::TunnelMalformed);
        }
    }

    let status = parse_status_line(&buf)?;
    if !(200..300).contains(&status) {
        return Err(Error::ProxyRejected(status));
    }

    Ok(stream)
}

fn parse_status_line(head: &[u8]) -> Result<u16> {
    let line_end = head
        .windows(2)
        .position(|w| w == b"\r\n")
        .ok_or(Error::TunnelMalformed)?;
    let line = std::str::from_utf8(&head[..line_end]).map_err(|_| Error::TunnelMalformed)?;

    let mut parts = line.split_whitespace();
    match parts.next() {
        Some(v) if v.starts_with("HTTP/1.") => {}
        _ => return Err(Error::TunnelMalformed),
    }

    parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or(Error::TunnelMalformed)
}
