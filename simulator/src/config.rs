//! Simulator settings, read from `PLAYSTREAM_*` environment variables

use std::path::PathBuf;

use playstream_core::{Error, ProcessorConfig, Result};

const SEED_ENV: &str = "PLAYSTREAM_SEED";
const USERS_ENV: &str = "PLAYSTREAM_USERS";
const PRODUCERS_ENV: &str = "PLAYSTREAM_PRODUCERS";
const CATALOG_ENV: &str = "PLAYSTREAM_CATALOG";
const EXPORT_ENV: &str = "PLAYSTREAM_EXPORT";
const DEFAULT_EXPORT_PATH: &str = "playstream_snapshot.json";

/// One burst of traffic
#[derive(Debug, Clone)]
pub struct Wave {
    pub label: &'static str,
    pub events: usize,
}

pub const WAVES: &[Wave] = &[
    Wave { label: "New release spike", events: 1_200 },
    Wave { label: "Weekend surge", events: 2_500 },
    Wave { label: "Steady state baseline", events: 800 },
];

#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub seed: u64,
    pub users: usize,
    pub producers: usize,
    pub catalog_path: Option<PathBuf>,
    pub export_path: PathBuf,
    pub processor: ProcessorConfig,
}

impl SimulatorConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            seed: env_or(SEED_ENV, 7)?,
            users: env_or(USERS_ENV, 5_000)?,
            producers: env_or(PRODUCERS_ENV, 4)?,
            catalog_path: std::env::var(CATALOG_ENV).ok().map(PathBuf::from),
            export_path: std::env::var(EXPORT_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_EXPORT_PATH)),
            processor: ProcessorConfig::from_env()?,
        };

        if config.users == 0 || config.producers == 0 {
            return Err(Error::Config("users and producers must be > 0".into()));
        }
        Ok(config)
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has invalid value {:?}", key, raw))),
        Err(_) => Ok(default),
    }
}
