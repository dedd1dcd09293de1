use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use super::{Error, Result};

#[derive(Clone, PartialEq, Eq)]
pub struct ProxyCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for ProxyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// HTTP proxy all requests are routed through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    host: String,
    port: u16,
    credentials: Option<ProxyCredentials>,
}

impl ProxyConfig {
    /// Parses `host:port` (an `http://` prefix is tolerated). An empty username means
    /// the proxy is used without credentials.
    pub fn parse(address: &str, username: Option<&str>, password: Option<&str>) -> Result<Self> {
        let raw = address.trim();
        let stripped = raw
            .strip_prefix("http://")
            .unwrap_or(raw)
            .trim_end_matches('/');

        let (host, port) = stripped
            .rsplit_once(':')
            .ok_or_else(|| Error::InvalidProxy(raw.to_string()))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(Error::InvalidProxy(raw.to_string()));
        }
        let port: u16 = port
            .parse()
            .map_err(|_| Error::InvalidProxy(raw.to_string()))?;
        if port == 0 {
            return Err(Error::InvalidProxy(raw.to_string()));
        }

        let credentials = match username.map(str::trim) {
            Some(u) if !u.is_empty() => Some(ProxyCredentials {
                username: u.to_string(),
                password: password.unwrap_or_default().to_string(),
            }),
            _ => None,
        };

        Ok(Self {
            host: host.to_string(),
            port,
            credentials,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn credentials(&self) -> Option<&ProxyCredentials> {
        self.credentials.as_ref()
    }

    /// `Proxy-Authorization` header value, if credentials are configured.
    pub fn authorization(&self) -> Option<String> {
        self.credentials.as_ref().map(|c| {
            let token = BASE64.encode(format!("{}:{}", c.username, c.password));
            format!("Basic {token}")
        })
    }
}

impl std::fmt::Display for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_host_port_and_credentials() {
        let p = match ProxyConfig::parse("proxy.local:3128", Some("alice"), Some("s3cret")) {
            Ok(p) => p,
            Err(err) => panic!("parse failed: {err}"),
        };
        assert_eq!(p.host(), "proxy.local");
        assert_eq!(p.port(), 3128);
        // base64("alice:s3cret")
        assert_eq!(p.authorization().as_deref(), Some("Basic YWxpY2U6czNjcmV0"));
        assert_eq!(p.to_string(), "proxy.local:3128");
    }

    #[test]
    fn empty_username_disables_auth() {
        let p = match ProxyConfig::parse("http://10.0.0.1:8080/", Some(""), Some("ignored")) {
            Ok(p) => p,
            Err(err) => panic!("parse failed: {err}"),
        };
        assert_eq!(p.host(), "10.0.0.1");
        assert!(p.credentials().is_none());
        assert!(p.authorization().is_none());
    }

    #[test]
    fn bracketed_ipv6_is_unwrapped() {
        let p = match ProxyConfig::parse("[::1]:8080", None, None) {
            Ok(p) => p,
            Err(err) => panic!("parse failed: {err}"),
        };
        assert_eq!(p.host(), "::1");
        assert_eq!(p.to_string(), "[::1]:8080");
    }

    #[test]
    fn rejects_missing_or_bad_port() {
        for bad in ["proxy.local", ":8080", "proxy.local:abc", "proxy.local:0", ""] {
            assert!(
                matches!(ProxyConfig::parse(bad, None, None), Err(Error::InvalidProxy(_))),
                "expected `{bad}` to be rejected"
            );
        }
    }

    #[test]
    fn debug_output_redacts_password() {
        let p = match ProxyConfig::parse("proxy:1", Some("u"), Some("hunter2")) {
            Ok(p) => p,
            Err(err) => panic!("parse failed: {err}"),
        };
        let dbg = format!("{p:?}");
        assert!(!dbg.contains("hunter2"), "{dbg}");
    }
}
