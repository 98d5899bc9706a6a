//! Run configuration.
//!
//! Everything the engine needs is passed in explicitly through
//! `SweepConfig`; there is no implicit working directory or global state.
//! The defaults reproduce the COPOM minutes layout on bcb.gov.br.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::candidate::NamingScheme;
use crate::http_client::HttpSettings;
use crate::search::SearchPlan;
use crate::types::{ConfigError, Identifier};

/// Default remote directory holding the documents.
pub const DEFAULT_BASE_URL: &str = "https://www.bcb.gov.br/content/copom/atascopom/";

/// Default ledger file name inside the output directory.
pub const DEFAULT_LEDGER_FILE: &str = "index.csv";

/// The one identifier whose date is known up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed {
    pub identifier: Identifier,
    pub date: NaiveDate,
}

/// How the lower bound moves between identifiers, and request pacing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pacing {
    /// Usual number of days between consecutive identifiers.
    pub typical_interval_days: u32,
    /// Lower-bound advance when an identifier is already on disk.
    pub skip_increment_days: u32,
    /// Lower-bound advance when a search is exhausted.
    pub not_found_increment_days: u32,
    /// Pause between identifiers.
    pub pause_ms: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            typical_interval_days: 45,
            skip_increment_days: 1,
            not_found_increment_days: 10,
            pause_ms: 150,
        }
    }
}

/// Complete configuration of a discovery run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Remote directory the candidate filenames are joined onto.
    pub base_url: String,
    /// Where documents and the ledger are written.
    pub output_dir: PathBuf,
    /// Ledger file name, relative to `output_dir`.
    pub ledger_file: String,
    /// First identifier, inclusive. Required.
    pub start: Option<Identifier>,
    /// Last identifier, inclusive. Defaults to `start`.
    pub end: Option<Identifier>,
    /// Known (identifier, date) pair. Required.
    pub seed: Option<Seed>,
    pub naming: NamingScheme,
    pub search: SearchPlan,
    pub pacing: Pacing,
    pub http: HttpSettings,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            output_dir: PathBuf::from("copom_pdfs"),
            ledger_file: DEFAULT_LEDGER_FILE.to_string(),
            start: None,
            end: None,
            seed: None,
            naming: NamingScheme::default(),
            search: SearchPlan::default(),
            pacing: Pacing::default(),
            http: HttpSettings::default(),
        }
    }
}

/// The validated, required parts of a `SweepConfig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunBounds {
    pub start: Identifier,
    pub end: Identifier,
    pub seed: Seed,
    pub base_url: Url,
}

impl RunBounds {
    /// Number of identifiers in `start..=end`.
    pub fn count(&self) -> u32 {
        self.end - self.start + 1
    }
}

impl SweepConfig {
    /// Check everything a run needs. Nothing touches the network before
    /// this succeeds.
    pub fn validate(&self) -> Result<RunBounds, ConfigError> {
        let start = self.start.ok_or(ConfigError::MissingStart)?;
        let seed = self.seed.ok_or(ConfigError::MissingSeed)?;
        let end = self.end.unwrap_or(start);

        if start == 0 {
            return Err(ConfigError::ZeroIdentifier("start"));
        }
        if seed.identifier == 0 {
            return Err(ConfigError::ZeroIdentifier("seed"));
        }

        if end < start {
            return Err(ConfigError::EndBeforeStart { start, end });
        }
        if seed.identifier > start {
            return Err(ConfigError::SeedAfterStart {
                seed: seed.identifier,
                start,
            });
        }

        self.naming.validate()?;
        self.search.validate()?;
        let base_url = self.parsed_base_url()?;

        Ok(RunBounds {
            start,
            end,
            seed,
            base_url,
        })
    }

    /// Base URL with a guaranteed trailing slash, so joins append.
    pub fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason,
        };

        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.output_dir.join(&self.ledger_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(identifier: Identifier, y: i32, m: u32, d: u32) -> Seed {
        Seed {
            identifier,
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        }
    }

    fn complete() -> SweepConfig {
        SweepConfig {
            start: Some(200),
            end: Some(273),
            seed: Some(seed(200, 2016, 7, 20)),
            ..SweepConfig::default()
        }
    }

    #[test]
    fn test_validate_complete() {
        let bounds = complete().validate().unwrap();
        assert_eq!(bounds.start, 200);
        assert_eq!(bounds.end, 273);
        assert_eq!(bounds.count(), 74);
        assert_eq!(bounds.base_url.as_str(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_missing_start_is_fatal() {
        let cfg = SweepConfig {
            start: None,
            ..complete()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::MissingStart));
    }

    #[test]
    fn test_missing_seed_is_fatal() {
        let cfg = SweepConfig {
            seed: None,
            ..complete()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::MissingSeed));
    }

    #[test]
    fn test_end_defaults_to_start() {
        let cfg = SweepConfig {
            end: None,
            ..complete()
        };
        let bounds = cfg.validate().unwrap();
        assert_eq!(bounds.end, 200);
        assert_eq!(bounds.count(), 1);
    }

    #[test]
    fn test_range_and_seed_checks() {
        let cfg = SweepConfig {
            end: Some(100),
            ..complete()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::EndBeforeStart { .. })
        ));

        let cfg = SweepConfig {
            seed: Some(seed(210, 2017, 1, 1)),
            ..complete()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::SeedAfterStart { .. })
        ));
    }

    #[test]
    fn test_identifier_zero_is_rejected() {
        let cfg = SweepConfig {
            start: Some(0),
            end: Some(u32::MAX),
            seed: Some(seed(0, 2016, 7, 20)),
            ..complete()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroIdentifier("start")));

        let cfg = SweepConfig {
            seed: Some(seed(0, 2016, 7, 20)),
            ..complete()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroIdentifier("seed")));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let cfg = SweepConfig {
            base_url: "https://files.example.org/atas".to_string(),
            ..complete()
        };
        let url = cfg.parsed_base_url().unwrap();
        assert_eq!(url.as_str(), "https://files.example.org/atas/");
        assert_eq!(
            url.join("x.pdf").unwrap().as_str(),
            "https://files.example.org/atas/x.pdf"
        );
    }

    #[test]
    fn test_base_url_rejects_bad_input() {
        for bad in ["not a url", "ftp://files.example.org/"] {
            let cfg = SweepConfig {
                base_url: bad.to_string(),
                ..complete()
            };
            assert!(matches!(
                cfg.validate(),
                Err(ConfigError::InvalidBaseUrl { .. })
            ));
        }
    }

    #[test]
    fn test_deserialize_partial_json() {
        let cfg: SweepConfig = serde_json::from_str(
            r#"{"start": 5, "seed": {"identifier": 5, "date": "2020-02-03"},
                "pacing": {"pause_ms": 0}}"#,
        )
        .unwrap();
        assert_eq!(cfg.start, Some(5));
        assert_eq!(cfg.pacing.pause_ms, 0);
        assert_eq!(cfg.pacing.typical_interval_days, 45);
        assert_eq!(cfg.search, SearchPlan::default());
    }

    #[test]
    fn test_ledger_path() {
        let cfg = SweepConfig {
            output_dir: PathBuf::from("/data/out"),
            ..SweepConfig::default()
        };
        assert_eq!(cfg.ledger_path(), PathBuf::from("/data/out/index.csv"));
    }
}
