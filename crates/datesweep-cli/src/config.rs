//! Configuration loading and resolution.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use datesweep::{Seed, SweepConfig};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "DATESWEEP_CONFIG";

/// Config file picked up from the working directory when nothing else is given.
pub const LOCAL_CONFIG_FILE: &str = "datesweep.toml";

/// Resolve the config file path: explicit flag, then env, then `./datesweep.toml`.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        if !env_path.is_empty() {
            return Some(PathBuf::from(env_path));
        }
    }

    let cwd_config = PathBuf::from(LOCAL_CONFIG_FILE);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    None
}

/// Parse a TOML config file.
pub fn load_config_file(path: &Path) -> Result<SweepConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("invalid config file {}", path.display()))
}

/// Load the resolved config file, or defaults when there is none.
pub fn load(explicit: Option<&Path>) -> Result<SweepConfig> {
    match resolve_config_path(explicit) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            load_config_file(&path)
        }
        None => Ok(SweepConfig::default()),
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub start: Option<u32>,
    pub end: Option<u32>,
    pub seed_id: Option<u32>,
    pub seed_date: Option<NaiveDate>,
    pub output_dir: Option<PathBuf>,
    pub base_url: Option<String>,
    pub pause_ms: Option<u64>,
}

impl Overrides {
    /// Apply onto `config`.
    ///
    /// A seed needs both halves; a lone `--seed-id` or `--seed-date` fills
    /// in the other half from the file's seed when there is one.
    pub fn apply(&self, config: &mut SweepConfig) -> Result<()> {
        if let Some(start) = self.start {
            config.start = Some(start);
        }
        if let Some(end) = self.end {
            config.end = Some(end);
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(pause) = self.pause_ms {
            config.pacing.pause_ms = pause;
        }

        match (self.seed_id, self.seed_date, config.seed) {
            (None, None, _) => {}
            (Some(identifier), Some(date), _) => config.seed = Some(Seed { identifier, date }),
            (Some(identifier), None, Some(seed)) => {
                config.seed = Some(Seed { identifier, ..seed })
            }
            (None, Some(date), Some(seed)) => config.seed = Some(Seed { date, ..seed }),
            (Some(_), None, None) => anyhow::bail!("--seed-id needs --seed-date"),
            (None, Some(_), None) => anyhow::bail!("--seed-date needs --seed-id"),
        }
        Ok(())
    }
}
