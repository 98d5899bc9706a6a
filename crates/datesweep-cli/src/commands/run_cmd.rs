//! `datesweep run`: walk the identifier range and download what is found.

use anyhow::{Context, Result};
use datesweep::progress::{self, ProgressEventKind, ProgressReceiver};
use datesweep::{LedgerStatus, RunSummary, SequenceDriver, SweepConfig};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast::error::RecvError;

use crate::output::{print_json, OutputMode};

pub async fn run(config: SweepConfig, mode: OutputMode) -> Result<()> {
    let ledger_path = config.ledger_path();
    let (tx, rx) = progress::channel();

    let renderer = tokio::spawn(render(rx, mode));
    let driver = SequenceDriver::over_http(config).with_progress(tx);
    let result = driver.run().await;
    // Dropping the driver closes the channel and ends the renderer.
    drop(driver);
    let _ = renderer.await;

    let report = result.context("sweep aborted")?;

    if mode.is_json() {
        print_json(&serde_json::json!({
            "summary": report.summary,
            "ledger": ledger_path.display().to_string(),
        }))?;
    } else if !mode.is_quiet() {
        print_summary(&report.summary);
        println!("  Ledger:          {}", ledger_path.display());
    }
    Ok(())
}

pub(crate) fn print_summary(summary: &RunSummary) {
    println!("Identifiers: {}", summary.total());
    println!("  Downloaded:      {}", summary.downloaded);
    println!("  Already present: {}", summary.skipped_exists);
    println!("  Not found:       {}", summary.not_found);
    println!("  Failed:          {}", summary.failed);
    if summary.probes > 0 {
        println!("  Probes:          {}", summary.probes);
    }
}

/// Draw a progress bar from driver events until the channel closes.
async fn render(mut rx: ProgressReceiver, mode: OutputMode) {
    let bar = if mode.shows_progress() {
        ProgressBar::new(0)
    } else {
        ProgressBar::hidden()
    };
    if let Ok(style) = ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {msg}") {
        bar.set_style(style);
    }

    loop {
        let ev = match rx.recv().await {
            Ok(ev) => ev,
            Err(RecvError::Lagged(n)) => {
                tracing::debug!(skipped = n, "progress renderer lagged");
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        match ev.event {
            ProgressEventKind::RunStarted { total, .. } => bar.set_length(u64::from(total)),
            ProgressEventKind::SearchStarted {
                identifier,
                expected,
                ..
            } => bar.set_message(format!("#{identifier} around {expected}")),
            ProgressEventKind::ProbeMilestone {
                identifier,
                probes,
                last_date,
            } => bar.set_message(format!("#{identifier} {probes} probes, at {last_date}")),
            ProgressEventKind::IdentifierDone {
                identifier,
                status,
                date,
                ..
            } => {
                if status != LedgerStatus::SkippedExists || date.is_some() {
                    let when = date.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
                    bar.println(format!("#{identifier:<5} {when:<10} {status}"));
                }
                bar.inc(1);
            }
            ProgressEventKind::RunComplete { .. } => bar.finish_and_clear(),
            ProgressEventKind::FetchFailed {
                identifier,
                url,
                error,
            } => bar.println(format!("#{identifier} download failed: {url}: {error}")),
        }
    }
    if !bar.is_finished() {
        bar.abandon();
    }
}
