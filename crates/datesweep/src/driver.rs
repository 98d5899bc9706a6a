//! Sequence driver: walks identifiers in order and owns the lower bound.
//!
//! All mutable run state (the lower bound, the ledger rows and the local
//! directory snapshot) lives here. Identifiers are processed strictly one
//! after another because each search is seeded by the previous resolution.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use crate::config::{RunBounds, SweepConfig};
use crate::fetch::{FetchOutcome, Fetcher, HttpFetcher};
use crate::http_client::HttpClient;
use crate::ledger::{Ledger, LedgerRecord};
use crate::local::list_local_resources;
use crate::probe::{HttpProber, Prober};
use crate::progress::{self, ProgressEventKind, ProgressSender};
use crate::search::{shift, SearchScheduler};
use crate::types::{Identifier, LedgerStatus, Resolution, RunSummary, SweepResult};

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub ledger: Ledger,
    pub summary: RunSummary,
}

/// Drives a full run from `start` to `end`.
pub struct SequenceDriver {
    config: SweepConfig,
    prober: Arc<dyn Prober>,
    fetcher: Arc<dyn Fetcher>,
    progress: Option<ProgressSender>,
}

impl SequenceDriver {
    pub fn new(config: SweepConfig, prober: Arc<dyn Prober>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            config,
            prober,
            fetcher,
            progress: None,
        }
    }

    /// Driver wired to the HTTP prober and fetcher.
    pub fn over_http(config: SweepConfig) -> Self {
        let client = HttpClient::new(&config.http);
        let prober = Arc::new(HttpProber::new(client.clone(), &config.http));
        let fetcher = Arc::new(HttpFetcher::new(client, &config.http));
        Self::new(config, prober, fetcher)
    }

    /// Broadcast progress events to `tx` while running.
    pub fn with_progress(mut self, tx: ProgressSender) -> Self {
        self.progress = Some(tx);
        self
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Run every identifier and rewrite the ledger.
    ///
    /// Per-identifier failures are recorded, never returned. Errors are
    /// limited to configuration (checked before any request) and local I/O
    /// on the output directory or ledger.
    pub async fn run(&self) -> SweepResult<RunReport> {
        let bounds = self.config.validate()?;
        let output_dir = &self.config.output_dir;
        std::fs::create_dir_all(output_dir)?;
        let mut local = list_local_resources(output_dir)?;

        let mut seq = 0u64;
        progress::emit(
            &self.progress,
            &mut seq,
            ProgressEventKind::RunStarted {
                start: bounds.start,
                end: bounds.end,
                total: bounds.count(),
            },
        );
        tracing::info!(
            start = bounds.start,
            end = bounds.end,
            seed = bounds.seed.identifier,
            seed_date = %bounds.seed.date,
            output = %output_dir.display(),
            "run started"
        );

        let scheduler = SearchScheduler::new(
            &self.config.naming,
            &self.config.search,
            &bounds.base_url,
            self.prober.as_ref(),
        );

        let mut last_date = initial_lower_bound(&bounds);
        let mut last_found: Option<NaiveDate> = None;
        let mut ledger = Ledger::new();
        let mut summary = RunSummary::default();

        for n in bounds.start..=bounds.end {
            let step = self
                .step(n, &bounds, &scheduler, &mut local, last_date, &mut seq)
                .await;

            if let Some(date) = step.confirmed {
                debug_assert!(
                    last_found.map_or(true, |prev| prev < date),
                    "resolved dates must strictly increase"
                );
                last_found = Some(date);
            }
            last_date = step.next_lower_bound;
            summary.record(step.record.status);
            summary.probes += step.probes;

            progress::emit(
                &self.progress,
                &mut seq,
                ProgressEventKind::IdentifierDone {
                    identifier: n,
                    status: step.record.status,
                    date: step.record.resolved_date,
                    url: step.record.url.clone(),
                    probes: step.probes,
                },
            );
            ledger.push(step.record);

            if step.touched_network && n < bounds.end && self.config.pacing.pause_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.pacing.pause_ms)).await;
            }
        }

        ledger.write_csv(&self.config.ledger_path())?;

        tracing::info!(
            downloaded = summary.downloaded,
            skipped = summary.skipped_exists,
            not_found = summary.not_found,
            failed = summary.failed,
            probes = summary.probes,
            ledger = %self.config.ledger_path().display(),
            "run complete"
        );
        progress::emit(
            &self.progress,
            &mut seq,
            ProgressEventKind::RunComplete {
                summary: summary.clone(),
            },
        );

        Ok(RunReport { ledger, summary })
    }

    async fn step(
        &self,
        n: Identifier,
        bounds: &RunBounds,
        scheduler: &SearchScheduler<'_>,
        local: &mut BTreeSet<String>,
        last_date: NaiveDate,
        seq: &mut u64,
    ) -> Step {
        let pacing = &self.config.pacing;

        if local.iter().any(|f| self.config.naming.matches_local(n, f)) {
            tracing::info!(identifier = n, "already on disk, skipping");
            return Step {
                record: LedgerRecord::skipped(n),
                next_lower_bound: advance(last_date, pacing.skip_increment_days),
                confirmed: None,
                probes: 0,
                touched_network: false,
            };
        }

        let expected = if n == bounds.seed.identifier {
            bounds.seed.date
        } else if n == bounds.start {
            first_expected(bounds, pacing.typical_interval_days)
        } else {
            advance(last_date, pacing.typical_interval_days)
        };
        tracing::info!(identifier = n, %expected, lower_bound = %last_date, "searching");
        progress::emit(
            &self.progress,
            seq,
            ProgressEventKind::SearchStarted {
                identifier: n,
                expected,
                lower_bound: last_date,
            },
        );

        let resolution = scheduler
            .search(n, expected, last_date, &self.progress, seq)
            .await;

        let (date, url, filename, probes) = match resolution {
            Resolution::Found {
                date,
                url,
                filename,
                probes,
            } => (date, url, filename, probes),
            Resolution::NotFound { probes } => {
                tracing::warn!(
                    identifier = n,
                    probes,
                    lookahead_days = self.config.search.far_lookahead_days,
                    "no document found"
                );
                return Step {
                    record: LedgerRecord::not_found(n),
                    next_lower_bound: advance(last_date, pacing.not_found_increment_days),
                    confirmed: None,
                    probes,
                    touched_network: true,
                };
            }
        };

        let dest = self.config.output_dir.join(&filename);
        let status = match self.fetcher.fetch(&url, &dest).await {
            Ok(FetchOutcome::Downloaded { bytes }) => {
                tracing::info!(identifier = n, %date, file = %filename, bytes, "downloaded");
                local.insert(filename);
                LedgerStatus::Downloaded
            }
            Ok(FetchOutcome::AlreadyPresent) => {
                tracing::info!(identifier = n, %date, file = %filename, "already present");
                local.insert(filename);
                LedgerStatus::SkippedExists
            }
            Err(e) => {
                tracing::warn!(identifier = n, %date, %url, error = %e, "found but download failed");
                progress::emit(
                    &self.progress,
                    seq,
                    ProgressEventKind::FetchFailed {
                        identifier: n,
                        url: url.clone(),
                        error: e.to_string(),
                    },
                );
                LedgerStatus::Failed
            }
        };

        Step {
            record: LedgerRecord::resolved(n, date, &url, status),
            // The date is confirmed even when the download failed.
            next_lower_bound: advance(date, 1),
            confirmed: Some(date),
            probes,
            touched_network: true,
        }
    }
}

/// Outcome of processing one identifier.
struct Step {
    record: LedgerRecord,
    next_lower_bound: NaiveDate,
    confirmed: Option<NaiveDate>,
    probes: u64,
    touched_network: bool,
}

/// Lower bound before the first identifier. When the run starts at the seed
/// itself, the bound sits one day before the seed date so offset 0 hits it.
fn initial_lower_bound(bounds: &RunBounds) -> NaiveDate {
    if bounds.seed.identifier == bounds.start {
        bounds.seed.date.pred_opt().unwrap_or(bounds.seed.date)
    } else {
        bounds.seed.date
    }
}

/// Expected date of `start` when the seed lies before it: one typical
/// interval per identifier in between.
fn first_expected(bounds: &RunBounds, interval_days: u32) -> NaiveDate {
    let gap = i64::from(bounds.start - bounds.seed.identifier);
    shift(bounds.seed.date, gap * i64::from(interval_days)).unwrap_or(NaiveDate::MAX)
}

/// `date + days`, saturating at the end of the calendar.
fn advance(date: NaiveDate, days: u32) -> NaiveDate {
    shift(date, i64::from(days)).unwrap_or(NaiveDate::MAX)
}
