//! Per-run ledger of identifier outcomes, persisted as `index.csv`.
//!
//! The file is rewritten in full at the end of each run, so it always
//! reflects the latest run against the current directory state.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{Identifier, LedgerStatus, RunSummary, SweepResult};

/// Column order of `index.csv`.
pub const LEDGER_HEADER: [&str; 4] = ["identifier", "resolved_date", "url", "status"];

/// One row of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub identifier: Identifier,
    pub resolved_date: Option<NaiveDate>,
    pub url: Option<String>,
    pub status: LedgerStatus,
}

impl LedgerRecord {
    pub fn skipped(identifier: Identifier) -> Self {
        Self {
            identifier,
            resolved_date: None,
            url: None,
            status: LedgerStatus::SkippedExists,
        }
    }

    pub fn not_found(identifier: Identifier) -> Self {
        Self {
            identifier,
            resolved_date: None,
            url: None,
            status: LedgerStatus::NotFound,
        }
    }

    pub fn resolved(
        identifier: Identifier,
        date: NaiveDate,
        url: &str,
        status: LedgerStatus,
    ) -> Self {
        Self {
            identifier,
            resolved_date: Some(date),
            url: Some(url.to_string()),
            status,
        }
    }
}

/// Rows accumulated during a run, in identifier order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    rows: Vec<LedgerRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row. Identifiers must arrive in increasing order.
    pub fn push(&mut self, record: LedgerRecord) {
        debug_assert!(
            self.rows
                .last()
                .map_or(true, |last| last.identifier < record.identifier),
            "ledger rows must be strictly increasing by identifier"
        );
        self.rows.push(record);
    }

    pub fn rows(&self) -> &[LedgerRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, identifier: Identifier) -> Option<&LedgerRecord> {
        self.rows.iter().find(|r| r.identifier == identifier)
    }

    /// Status counts. `probes` is left at zero; the ledger does not track it.
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for row in &self.rows {
            summary.record(row.status);
        }
        summary
    }

    /// Replace `path` with the full ledger.
    ///
    /// Written to a temporary sibling and renamed into place, so a crash
    /// never leaves a truncated index.
    pub fn write_csv(&self, path: &Path) -> SweepResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp = path.with_extension("csv.tmp");
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_path(&tmp)?;
            writer.write_record(LEDGER_HEADER)?;
            for row in &self.rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        std::fs::rename(&tmp, path)?;

        tracing::debug!(path = %path.display(), rows = self.rows.len(), "ledger written");
        Ok(())
    }

    /// Load a ledger previously written by `write_csv`.
    pub fn read_csv(path: &Path) -> SweepResult<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut rows = Vec::new();
        for row in reader.deserialize() {
            rows.push(row?);
        }
        Ok(Self { rows })
    }
}
