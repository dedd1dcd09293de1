use std::process::{Command, Output};

use anyhow::Context as _;
use pxload_testserver::TestServer;

fn status_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

fn pxload(args: &[&str]) -> anyhow::Result<Output> {
    Command::new(env!("CARGO_BIN_EXE_pxload"))
        .args(args)
        .env_remove("PXLOAD_PROXY")
        .env_remove("PXLOAD_PROXY_USER")
        .env_remove("PXLOAD_PROXY_PASSWORD")
        .output()
        .context("run pxload binary")
}

fn ensure_exit(out: &Output, expected: i32) -> anyhow::Result<()> {
    anyhow::ensure!(
        status_code(out.status) == expected,
        "expected exit code {expected}, got {}\nstdout:\n{}\nstderr:\n{}",
        status_code(out.status),
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
    Ok(())
}

#[test]
fn invalid_flags_exit_30() -> anyhow::Result<()> {
    let out = pxload(&["--timeout", "10x", "http://127.0.0.1:9/"])?;
    ensure_exit(&out, 30)
}

#[test]
fn help_exits_0() -> anyhow::Result<()> {
    let out = pxload(&["--help"])?;
    ensure_exit(&out, 0)
}

#[test]
fn missing_values_without_prompt_exit_30() -> anyhow::Result<()> {
    let out = pxload(&["--no-prompt", "http://127.0.0.1:9/"])?;
    ensure_exit(&out, 30)?;
    anyhow::ensure!(String::from_utf8_lossy(&out.stderr).contains("concurrency"));
    Ok(())
}

#[tokio::test]
async fn zero_concurrency_or_negative_duration_exit_30_without_requests() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let url = server.urls().ok.clone();

    for args in [["-c", "0", "-d", "1"], ["-c", "1", "-d", "-1"]] {
        let url = url.clone();
        let out = tokio::task::spawn_blocking(move || {
            let mut all: Vec<&str> = args.to_vec();
            all.extend(["--no-prompt", url.as_str()]);
            pxload(&all)
        })
        .await
        .context("spawn_blocking join")??;

        ensure_exit(&out, 30)?;
    }

    anyhow::ensure!(
        server.stats().requests_total() == 0,
        "server saw {} requests",
        server.stats().requests_total()
    );

    server.shutdown().await;
    Ok(())
}

#[test]
fn invalid_proxy_exit_30() -> anyhow::Result<()> {
    let out = pxload(&[
        "--no-prompt",
        "-x",
        "proxy-without-port",
        "-c",
        "1",
        "-d",
        "1",
        "http://127.0.0.1:9/",
    ])?;
    ensure_exit(&out, 30)
}
