use clap::Parser;
use std::time::Duration;

use pxload_core::parse_duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Progress bar on stderr and a human-readable summary.
    HumanReadable,
    /// Emit JSON progress lines (NDJSON) and a JSON summary line to stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "pxload",
    author,
    version,
    about = "HTTP load generator that can route traffic through a forward proxy",
    long_about = "pxload keeps N concurrent GET requests in flight against one URL for a fixed duration, optionally through an HTTP proxy, and reports success/failure counts, a per-status failure breakdown, latency and throughput.\n\nMissing values are prompted for on stdin when it is a terminal, unless --no-prompt is set.",
    after_help = "Examples:\n  pxload -c 50 -d 30s https://example.com/\n  pxload -x 127.0.0.1:3128 -U bob -P secret -c 10 -d 1m http://example.com/\n  PXLOAD_PROXY=proxy:8080 pxload -c 5 -d 10 --output json http://example.com/"
)]
pub struct Cli {
    /// Website URL to request (http:// or https://)
    pub url: Option<String>,

    /// Proxy address, host:port (empty for a direct connection)
    #[arg(short = 'x', long, env = "PXLOAD_PROXY", value_name = "HOST:PORT")]
    pub proxy: Option<String>,

    /// Proxy username (Basic auth)
    #[arg(short = 'U', long = "proxy-user", env = "PXLOAD_PROXY_USER", value_name = "USER")]
    pub proxy_user: Option<String>,

    /// Proxy password (Basic auth)
    #[arg(
        short = 'P',
        long = "proxy-password",
        env = "PXLOAD_PROXY_PASSWORD",
        value_name = "PASS",
        hide_env_values = true
    )]
    pub proxy_password: Option<String>,

    /// Number of simultaneous requests
    #[arg(short = 'c', long, value_name = "N", allow_hyphen_values = true)]
    pub concurrency: Option<String>,

    /// Test duration; a bare number is seconds (e.g. 30, 30s, 1m)
    #[arg(short = 'd', long, value_name = "DURATION", allow_hyphen_values = true)]
    pub duration: Option<String>,

    /// Per-request timeout
    #[arg(long, value_parser = parse_duration, default_value = "10s")]
    pub timeout: Duration,

    /// TCP/TLS/tunnel setup timeout
    #[arg(long = "connect-timeout", value_parser = parse_duration, default_value = "5s")]
    pub connect_timeout: Duration,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,

    /// Never prompt; missing values are configuration errors
    #[arg(long)]
    pub no_prompt: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pxload_core::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};

    fn parse(args: &[&str]) -> Cli {
        match Cli::try_parse_from(std::iter::once("pxload").chain(args.iter().copied())) {
            Ok(cli) => cli,
            Err(err) => panic!("parse failed: {err}"),
        }
    }

    #[test]
    fn short_flags_and_positional_url() {
        let cli = parse(&[
            "-x",
            "127.0.0.1:3128",
            "-U",
            "bob",
            "-P",
            "secret",
            "-c",
            "10",
            "-d",
            "1m",
            "http://example.com/",
        ]);
        assert_eq!(cli.proxy.as_deref(), Some("127.0.0.1:3128"));
        assert_eq!(cli.proxy_user.as_deref(), Some("bob"));
        assert_eq!(cli.proxy_password.as_deref(), Some("secret"));
        assert_eq!(cli.concurrency.as_deref(), Some("10"));
        assert_eq!(cli.duration.as_deref(), Some("1m"));
        assert_eq!(cli.url.as_deref(), Some("http://example.com/"));
        assert_eq!(cli.output, OutputFormat::HumanReadable);
        assert!(!cli.no_prompt);
    }

    #[test]
    fn defaults_match_library_timeouts() {
        let cli = parse(&["http://example.com/"]);
        assert_eq!(cli.timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(cli.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }

    #[test]
    fn negative_values_reach_validation() {
        let cli = parse(&["-c", "-3", "-d", "-1", "--no-prompt"]);
        assert_eq!(cli.concurrency.as_deref(), Some("-3"));
        assert_eq!(cli.duration.as_deref(), Some("-1"));
        assert!(cli.no_prompt);
    }

    #[test]
    fn json_output_and_timeouts() {
        let cli = parse(&[
            "--output",
            "json",
            "--timeout",
            "250ms",
            "--connect-timeout",
            "2s",
        ]);
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.timeout, Duration::from_millis(250));
        assert_eq!(cli.connect_timeout, Duration::from_secs(2));
    }

    #[test]
    fn bad_timeout_is_a_parse_error() {
        let res = Cli::try_parse_from(["pxload", "--timeout", "soon"]);
        assert!(res.is_err());
    }
}
