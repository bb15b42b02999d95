//! Processor configuration
//!
//! Every field has a default; `from_env` overrides them from `PLAYSTREAM_*`
//! environment variables.

use serde::{Deserialize, Serialize};

use crate::cardinality::{MAX_PRECISION, MIN_PRECISION};
use crate::errors::{Error, Result};
use crate::window::MAX_WINDOW_SECS;

const WINDOW_SECS_ENV: &str = "PLAYSTREAM_WINDOW_SECS";
const ESTIMATOR_ENV: &str = "PLAYSTREAM_ESTIMATOR";
const HLL_PRECISION_ENV: &str = "PLAYSTREAM_HLL_PRECISION";
const QUEUE_CAPACITY_ENV: &str = "PLAYSTREAM_QUEUE_CAPACITY";

/// Backing structure for distinct-listener estimation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    /// Membership set (default)
    #[default]
    Exact,
    /// Fixed-memory probabilistic estimator
    #[serde(alias = "hll")]
    HyperLogLog,
}

impl std::str::FromStr for EstimatorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(EstimatorKind::Exact),
            "hll" | "hyperloglog" | "hyper_log_log" => Ok(EstimatorKind::HyperLogLog),
            other => Err(Error::Config(format!("unknown estimator: {}", other))),
        }
    }
}

/// Stream processor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Tumbling window length in seconds (default: 60)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// Distinct-listener backing (default: exact)
    #[serde(default)]
    pub estimator: EstimatorKind,
    /// HyperLogLog precision (default: 12)
    #[serde(default = "default_hll_precision")]
    pub hll_precision: u8,
    /// Bounded queue size for the async ingestion service (default: 1024)
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_window_secs() -> u64 {
    60
}

fn default_hll_precision() -> u8 {
    12
}

fn default_queue_capacity() -> usize {
    1024
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            estimator: EstimatorKind::default(),
            hll_precision: default_hll_precision(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl ProcessorConfig {
    /// Defaults overridden by any `PLAYSTREAM_*` variables that are set
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment, tests)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(WINDOW_SECS_ENV) {
            config.window_secs = parse_var(WINDOW_SECS_ENV, &raw)?;
        }
        if let Some(raw) = lookup(ESTIMATOR_ENV) {
            config.estimator = raw.parse()?;
        }
        if let Some(raw) = lookup(HLL_PRECISION_ENV) {
            config.hll_precision = parse_var(HLL_PRECISION_ENV, &raw)?;
        }
        if let Some(raw) = lookup(QUEUE_CAPACITY_ENV) {
            config.queue_capacity = parse_var(QUEUE_CAPACITY_ENV, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_window_secs(mut self, window_secs: u64) -> Self {
        self.window_secs = window_secs;
        self
    }

    pub fn with_estimator(mut self, estimator: EstimatorKind) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_WINDOW_SECS).contains(&self.window_secs) {
            return Err(Error::Config(format!(
                "window_secs must be in 1..={}",
                MAX_WINDOW_SECS
            )));
        }
        if self.queue_capacity == 0 {
            return Err(Error::Config("queue_capacity must be > 0".into()));
        }
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&self.hll_precision) {
            return Err(Error::Config(format!(
                "hll_precision must be in {}..={}",
                MIN_PRECISION, MAX_PRECISION
            )));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} has invalid value {:?}", key, raw)))
}
