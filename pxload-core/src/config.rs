use std::time::Duration;

use pxload_http::{ProxyConfig, Target};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing {0}")]
    Missing(&'static str),

    #[error("invalid number of simultaneous requests `{0}` (expected a positive integer)")]
    InvalidConcurrency(String),

    #[error("invalid test duration `{0}` (expected a positive duration, e.g. 30, 10s, 1m)")]
    InvalidDuration(String),

    #[error("invalid website URL `{0}`: {1}")]
    InvalidUrl(String, String),

    #[error("invalid proxy: {0}")]
    InvalidProxy(String),

    #[error("`{0}` must be a positive duration")]
    ZeroTimeout(&'static str),
}

/// Raw, unvalidated run settings as collected from flags, env or prompts.
#[derive(Debug, Clone)]
pub struct RunConfigInput {
    pub proxy: Option<String>,
    pub proxy_username: Option<String>,
    pub proxy_password: Option<String>,
    pub concurrency: Option<String>,
    pub duration: Option<String>,
    pub url: Option<String>,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub progress_interval: Duration,
}

impl Default for RunConfigInput {
    fn default() -> Self {
        Self {
            proxy: None,
            proxy_username: None,
            proxy_password: None,
            concurrency: None,
            duration: None,
            url: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl RunConfigInput {
    pub fn validate(self) -> Result<RunConfig, ConfigError> {
        let workers = parse_concurrency(non_empty(self.concurrency.as_deref(), "concurrency")?)?;

        let raw_duration = non_empty(self.duration.as_deref(), "duration")?;
        let duration = parse_duration(raw_duration)
            .ok()
            .filter(|d| !d.is_zero())
            .ok_or_else(|| ConfigError::InvalidDuration(raw_duration.to_string()))?;

        let raw_url = non_empty(self.url.as_deref(), "website URL")?;
        let target = Target::parse(raw_url)
            .map_err(|err| ConfigError::InvalidUrl(raw_url.to_string(), err.to_string()))?;

        let proxy = match self.proxy.as_deref().map(str::trim) {
            Some(addr) if !addr.is_empty() => Some(
                ProxyConfig::parse(
                    addr,
                    self.proxy_username.as_deref(),
                    self.proxy_password.as_deref(),
                )
                .map_err(|err| ConfigError::InvalidProxy(err.to_string()))?,
            ),
            _ => None,
        };

        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("timeout"));
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("connect-timeout"));
        }
        if self.progress_interval.is_zero() {
            return Err(ConfigError::ZeroTimeout("progress interval"));
        }

        Ok(RunConfig {
            proxy,
            workers,
            duration,
            target,
            request_timeout: self.request_timeout,
            connect_timeout: self.connect_timeout,
            progress_interval: self.progress_interval,
        })
    }
}

/// Validated, immutable run configuration.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub proxy: Option<ProxyConfig>,
    pub workers: usize,
    pub duration: Duration,
    pub target: Target,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub progress_interval: Duration,
}

fn non_empty<'a>(value: Option<&'a str>, what: &'static str) -> Result<&'a str, ConfigError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(what)),
    }
}

fn parse_concurrency(raw: &str) -> Result<usize, ConfigError> {
    let n: i64 = raw
        .parse()
        .map_err(|_| ConfigError::InvalidConcurrency(raw.to_string()))?;
    if n <= 0 {
        return Err(ConfigError::InvalidConcurrency(raw.to_string()));
    }
    usize::try_from(n).map_err(|_| ConfigError::InvalidConcurrency(raw.to_string()))
}

/// Parses `30`, `30s`, `250ms`, `1m`, `2h`. A bare number is seconds.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("duration cannot be empty (expected e.g. 30, 10s, 1m)".to_string());
    }

    let number_end = s
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map_or(s.len(), |(idx, _)| idx);

    if number_end == 0 {
        return Err(format!("invalid duration '{s}' (expected e.g. 30, 10s, 1m)"));
    }

    let (number_str, unit_str) = s.split_at(number_end);
    let value: u64 = number_str
        .parse()
        .map_err(|_| format!("invalid duration '{s}' (expected e.g. 30, 10s, 1m)"))?;

    match unit_str.trim() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => Ok(Duration::from_secs(value)),
        "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => {
            Ok(Duration::from_millis(value))
        }
        "m" | "min" | "mins" | "minute" | "minutes" => value
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("duration '{s}' is too large")),
        "h" | "hr" | "hrs" | "hour" | "hours" => value
            .checked_mul(60 * 60)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("duration '{s}' is too large")),
        _ => Err(format!("invalid duration '{s}' (expected e.g. 30, 10s, 1m)")),
    }
}
