//! Engine configuration.
//!
//! Sources, later ones winning:
//!
//! 1. built-in defaults
//! 2. a JSON file (`--config` or `FANTASY_ETL_CONFIG`)
//! 3. environment overrides (`.env` is loaded by the binary first)
//!
//! ```json
//! {
//!   "rules": {"reference_year": 2024, "pct_tolerance": 0.5},
//!   "pipeline": {"policy": "block_batch"}
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};
use crate::pipeline::{PipelineOptions, RejectPolicy};
use crate::validation::ValidationRules;

pub const ENV_CONFIG: &str = "FANTASY_ETL_CONFIG";
pub const ENV_REFERENCE_YEAR: &str = "FANTASY_ETL_REFERENCE_YEAR";
pub const ENV_PCT_TOLERANCE: &str = "FANTASY_ETL_PCT_TOLERANCE";
pub const ENV_REJECT_POLICY: &str = "FANTASY_ETL_REJECT_POLICY";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    pub rules: ValidationRules,
    pub pipeline: PipelineOptions,
}

impl EtlConfig {
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Apply overrides from any key lookup (the environment in production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<()> {
        if let Some(value) = lookup(ENV_REFERENCE_YEAR) {
            let year = value.trim().parse::<i32>().map_err(|_| invalid(ENV_REFERENCE_YEAR, &value))?;
            self.rules.reference_year = Some(year);
        }
        if let Some(value) = lookup(ENV_PCT_TOLERANCE) {
            let tolerance = value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|t| t.is_finite() && *t >= 0.0)
                .ok_or_else(|| invalid(ENV_PCT_TOLERANCE, &value))?;
            self.rules.pct_tolerance = tolerance;
        }
        if let Some(value) = lookup(ENV_REJECT_POLICY) {
            self.pipeline.policy = value.parse::<RejectPolicy>().map_err(|_| invalid(ENV_REJECT_POLICY, &value))?;
        }
        Ok(())
    }

    pub fn apply_env(&mut self) -> ConfigResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Defaults, then the file (explicit path or `FANTASY_ETL_CONFIG`), then env.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let path: Option<PathBuf> = path.map(Path::to_path_buf).or_else(|| std::env::var(ENV_CONFIG).ok().map(PathBuf::from));
        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidOverride { key: key.to_string(), value: value.to_string() }
}
