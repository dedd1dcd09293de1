use std::io::IsTerminal as _;

use anyhow::Context as _;
use pxload_core::RunConfigInput;

use crate::cli::Cli;
use crate::exit_codes::ExitCode;
use crate::output;
use crate::prompt;
use crate::run_error::RunError;

pub async fn run(cli: Cli) -> Result<ExitCode, RunError> {
    let out = output::formatter(cli.output);

    let mut input = RunConfigInput {
        proxy: cli.proxy,
        proxy_username: cli.proxy_user,
        proxy_password: cli.proxy_password,
        concurrency: cli.concurrency,
        duration: cli.duration,
        url: cli.url,
        request_timeout: cli.timeout,
        connect_timeout: cli.connect_timeout,
        ..RunConfigInput::default()
    };

    if !cli.no_prompt && std::io::stdin().is_terminal() {
        let stdin = std::io::stdin();
        prompt::fill_missing(&mut input, &mut stdin.lock(), &mut std::io::stderr())
            .context("failed to read interactive input")
            .map_err(RunError::InvalidInput)?;
    }

    let cfg = input
        .validate()
        .map_err(|err| RunError::InvalidInput(err.into()))?;

    out.print_header(&cfg);

    let summary = pxload_core::run_http(&cfg, out.progress(), ctrl_c()).await?;

    out.print_summary(&summary).map_err(RunError::RuntimeError)?;

    Ok(ExitCode::Success)
}

/// Resolves on the first Ctrl-C. If the handler cannot be installed it never resolves,
/// so the run still ends at its deadline.
async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
