//! Core data types for a discovery run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Externally assigned sequence number of a resource (e.g. a meeting number).
pub type Identifier = u32;

/// Terminal outcome recorded for one identifier in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    SkippedExists,
    Downloaded,
    NotFound,
    Failed,
}

impl LedgerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SkippedExists => "skipped_exists",
            Self::Downloaded => "downloaded",
            Self::NotFound => "not_found",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of searching for one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A candidate probed true.
    Found {
        date: NaiveDate,
        url: String,
        filename: String,
        /// Probes issued before and including the match.
        probes: u64,
    },
    /// The bounded offset space was exhausted.
    NotFound { probes: u64 },
}

impl Resolution {
    pub fn probes(&self) -> u64 {
        match self {
            Self::Found { probes, .. } | Self::NotFound { probes } => *probes,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

/// Aggregate counters for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub downloaded: u32,
    pub skipped_exists: u32,
    pub not_found: u32,
    pub failed: u32,
    /// Total probes issued across all identifiers.
    pub probes: u64,
}

impl RunSummary {
    pub fn record(&mut self, status: LedgerStatus) {
        match status {
            LedgerStatus::SkippedExists => self.skipped_exists += 1,
            LedgerStatus::Downloaded => self.downloaded += 1,
            LedgerStatus::NotFound => self.not_found += 1,
            LedgerStatus::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.downloaded + self.skipped_exists + self.not_found + self.failed
    }
}

/// Why a single probe came back negative. Never escalated past the prober.
#[derive(thiserror::Error, Debug)]
pub enum ProbeFailure {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("content type {0:?} does not match")]
    ContentType(Option<String>),
}

/// Failure to retrieve or persist a verified resource.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("content type {0:?} does not match")]
    ContentType(Option<String>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid or incomplete run configuration. Always detected before any
/// network activity.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing start identifier")]
    MissingStart,

    #[error("missing seed (known identifier and date)")]
    MissingSeed,

    #[error("{0} identifier must be positive")]
    ZeroIdentifier(&'static str),

    #[error("end identifier {end} is before start identifier {start}")]
    EndBeforeStart { start: Identifier, end: Identifier },

    #[error("seed identifier {seed} is after start identifier {start}")]
    SeedAfterStart { seed: Identifier, start: Identifier },

    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("invalid search plan: {0}")]
    InvalidPlan(String),

    #[error("invalid naming scheme: {0}")]
    InvalidNaming(String),
}

/// Fatal errors of a discovery run.
#[derive(thiserror::Error, Debug)]
pub enum SweepError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ledger error: {0}")]
    Ledger(#[from] csv::Error),
}

/// Convenience result type.
pub type SweepResult<T> = Result<T, SweepError>;
