mod duration;
mod format;
mod progress;
mod summary;

use std::sync::Arc;

use duration::format_duration_single;
use format::format_rate;
use progress::HumanProgress;
use summary::render;

use super::OutputFormatter;

pub(crate) struct HumanReadableOutput {
    progress: Arc<HumanProgress>,
}

impl HumanReadableOutput {
    pub(crate) fn new() -> Self {
        Self {
            progress: Arc::new(HumanProgress::new()),
        }
    }
}

impl OutputFormatter for HumanReadableOutput {
    fn print_header(&self, cfg: &pxload_core::RunConfig) {
        println!("target: {}", cfg.target.url());
        match &cfg.proxy {
            Some(proxy) => println!("proxy: {proxy}"),
            None => println!("proxy: none (direct)"),
        }
        println!(
            "workers={} duration={} timeout={}",
            cfg.workers,
            format_duration_single(cfg.duration),
            format_duration_single(cfg.request_timeout)
        );
        println!();
    }

    fn progress(&self) -> Option<pxload_core::ProgressFn> {
        let progress = self.progress.clone();

        Some(Arc::new(move |u| {
            let total = u.elapsed + u.remaining;
            let message = format!(
                "workers={} ok={} failed={} rps={} remaining={}s",
                u.workers,
                u.success,
                u.failure,
                format_rate(u.rps_now),
                u.remaining.as_secs()
            );
            progress.update(total, u.elapsed, message);
        }))
    }

    fn print_summary(&self, summary: &pxload_core::RunSummary) -> anyhow::Result<()> {
        self.progress.finish();
        print!("{}", render(summary));
        Ok(())
    }
}
