//! `datesweep ledger`: summarize the ledger from the last run.

use anyhow::{Context, Result};
use datesweep::{Ledger, LedgerStatus, SweepConfig};

use crate::output::{print_json, OutputMode};

pub fn run(config: &SweepConfig, mode: OutputMode) -> Result<()> {
    let path = config.ledger_path();
    let ledger = Ledger::read_csv(&path)
        .with_context(|| format!("failed to read ledger {}", path.display()))?;
    let summary = ledger.summary();

    if mode.is_json() {
        return print_json(&serde_json::json!({
            "ledger": path.display().to_string(),
            "summary": summary,
            "rows": ledger.rows(),
        }));
    }

    if mode.is_quiet() {
        return Ok(());
    }
    for line in render_rows(&ledger) {
        println!("{line}");
    }
    println!();
    super::run_cmd::print_summary(&summary);
    if let Some(missing) = missing_line(&ledger) {
        println!("{missing}");
    }
    Ok(())
}

fn render_rows(ledger: &Ledger) -> Vec<String> {
    ledger
        .rows()
        .iter()
        .map(|row| {
            let date = row
                .resolved_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".into());
            format!("{:<6} {:<10} {}", row.identifier, date, row.status)
        })
        .collect()
}

/// Identifiers left without a document, if any.
fn missing_line(ledger: &Ledger) -> Option<String> {
    let gaps: Vec<String> = ledger
        .rows()
        .iter()
        .filter(|r| matches!(r.status, LedgerStatus::NotFound | LedgerStatus::Failed))
        .map(|r| r.identifier.to_string())
        .collect();
    if gaps.is_empty() {
        None
    } else {
        Some(format!("  Missing:         {}", gaps.join(", ")))
    }
}
