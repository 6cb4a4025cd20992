//! Harness configuration.
//!
//! Precedence, lowest first:
//! - built-in defaults
//! - a TOML file passed to [`HarnessConfig::load`]
//! - `BEAN_HARNESS_*` environment variables
//!
//! Every source is validated before an exerciser sees it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::error::HarnessError;
use crate::synth::MAX_CONTAINER_LEN;

pub const DEFAULT_SEED_VARIABLE: &str = "BEAN_HARNESS_SEED";
pub const TEST_RUNS_VARIABLE: &str = "BEAN_HARNESS_TEST_RUNS";
pub const TREAT_IGNORE_VARIABLE: &str = "BEAN_HARNESS_TREAT_IGNORE_AS_SUCCESS";

const DEFAULT_TEST_RUNS: usize = 20;
const DEFAULT_MIN_CONTAINER_LEN: usize = 3;
const DEFAULT_MAX_CONTAINER_LEN: usize = 10;

/// Knobs shared by every exerciser
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarnessConfig {
    /// Environment variable holding the value seed
    pub seed_variable: String,
    /// Repetitions of every bean check
    pub test_runs: usize,
    /// Report skipped checks as passed
    pub treat_ignore_as_success: bool,
    pub min_container_len: usize,
    pub max_container_len: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            seed_variable: DEFAULT_SEED_VARIABLE.to_string(),
            test_runs: DEFAULT_TEST_RUNS,
            treat_ignore_as_success: true,
            min_container_len: DEFAULT_MIN_CONTAINER_LEN,
            max_container_len: DEFAULT_MAX_CONTAINER_LEN,
        }
    }
}

impl HarnessConfig {
    /// Defaults overridden by the environment
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by a TOML file, then by the environment
    pub fn load(path: &Path) -> Result<Self> {
        let file_config = load_config_file(path)?;
        let mut config = Self::default();
        config.merge(file_config);
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.seed_variable.trim().is_empty(),
            "seed variable name must not be empty"
        );
        anyhow::ensure!(self.test_runs > 0, "test_runs must be at least 1");
        anyhow::ensure!(
            self.min_container_len <= self.max_container_len,
            "min_container_len {} exceeds max_container_len {}",
            self.min_container_len,
            self.max_container_len
        );
        anyhow::ensure!(
            self.max_container_len <= MAX_CONTAINER_LEN,
            "max_container_len {} exceeds the limit of {}",
            self.max_container_len,
            MAX_CONTAINER_LEN
        );
        Ok(())
    }

    /// [`HarnessConfig::from_env`] for exercisers, failures as [`HarnessError::InvalidConfig`]
    pub(crate) fn resolve() -> crate::error::Result<Self> {
        Self::from_env().map_err(|err| HarnessError::InvalidConfig {
            message: format!("{:#}", err),
        })
    }

    fn merge(&mut self, partial: PartialConfig) {
        let PartialConfig {
            seed_variable,
            test_runs,
            treat_ignore_as_success,
            min_container_len,
            max_container_len,
        } = partial;

        if let Some(seed_variable) = seed_variable {
            self.seed_variable = seed_variable;
        }
        if let Some(test_runs) = test_runs {
            self.test_runs = test_runs;
        }
        if let Some(treat) = treat_ignore_as_success {
            self.treat_ignore_as_success = treat;
        }
        if let Some(min) = min_container_len {
            self.min_container_len = min;
        }
        if let Some(max) = max_container_len {
            self.max_container_len = max;
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(raw) = env::var(TEST_RUNS_VARIABLE) {
            self.test_runs = raw
                .trim()
                .parse()
                .with_context(|| format!("{} must be a positive integer, got {:?}", TEST_RUNS_VARIABLE, raw))?;
        }

        if let Ok(raw) = env::var(TREAT_IGNORE_VARIABLE) {
            self.treat_ignore_as_success = parse_flag(&raw).with_context(|| {
                format!("{} must be true or false, got {:?}", TREAT_IGNORE_VARIABLE, raw)
            })?;
        }

        Ok(())
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("unrecognized flag value {other}"),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialConfig {
    seed_variable: Option<String>,
    test_runs: Option<usize>,
    treat_ignore_as_success: Option<bool>,
    min_container_len: Option<usize>,
    max_container_len: Option<usize>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    toml::from_str(&contents).with_context(|| format!("failed to parse TOML config {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = HarnessConfig::default();
        assert_eq!(config.test_runs, 20);
        assert!(config.treat_ignore_as_success);
        assert_eq!(config.seed_variable, "BEAN_HARNESS_SEED");
        config.validate().expect("defaults validate");
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let config = HarnessConfig {
            min_container_len: 5,
            max_container_len: 2,
            ..HarnessConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn unbounded_container_length_is_rejected() {
        let config = HarnessConfig {
            min_container_len: 0,
            max_container_len: usize::MAX,
            ..HarnessConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("limit"), "{err}");

        let at_limit = HarnessConfig {
            max_container_len: MAX_CONTAINER_LEN,
            ..HarnessConfig::default()
        };
        at_limit.validate().expect("limit itself is allowed");
    }

    #[test]
    fn flags_parse_loosely() {
        assert!(parse_flag("TRUE").unwrap());
        assert!(!parse_flag(" off ").unwrap());
        assert!(parse_flag("maybe").is_err());
    }
}
