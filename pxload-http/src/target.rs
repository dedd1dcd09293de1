use super::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

/// Parsed request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    url: String,
    scheme: Scheme,
    host: String,
    port: u16,
    origin_form: String,
}

impl Target {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let parsed = url::Url::parse(raw).map_err(|_| Error::InvalidUrl(raw.to_string()))?;

        let scheme = match parsed.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            _ => return Err(Error::UnsupportedScheme(raw.to_string())),
        };

        let host = match parsed.host() {
            Some(url::Host::Domain(d)) => d.to_string(),
            Some(url::Host::Ipv4(ip)) => ip.to_string(),
            Some(url::Host::Ipv6(ip)) => ip.to_string(),
            None => return Err(Error::InvalidUrl(raw.to_string())),
        };

        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| Error::InvalidUrl(raw.to_string()))?;

        let mut origin_form = parsed.path().to_string();
        if origin_form.is_empty() {
            origin_form.push('/');
        }
        if let Some(q) = parsed.query() {
            origin_form.push('?');
            origin_form.push_str(q);
        }

        Ok(Self {
            url: parsed.to_string(),
            scheme,
            host,
            port,
            origin_form,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `/path?query`, as sent on a direct or tunneled connection.
    pub fn origin_form(&self) -> &str {
        &self.origin_form
    }

    /// Full URL, as sent to a forward proxy.
    pub fn absolute_form(&self) -> &str {
        &self.url
    }

    /// `host:port`, as used by `CONNECT`.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.bracketed_host(), self.port)
    }

    /// Value of the `Host` header (port omitted when it is the scheme default).
    pub fn host_header(&self) -> String {
        let default_port = match self.scheme {
            Scheme::Http => 80,
            Scheme::Https => 443,
        };
        if self.port == default_port {
            self.bracketed_host()
        } else {
            self.authority()
        }
    }

    fn bracketed_host(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        }
    }
}
