//! Configuration loading for both binaries

pub mod contracts;
pub mod seed;

use std::env;
use std::time::Duration;

use thiserror::Error;

pub use contracts::ContractsConfig;
pub use seed::{AirlineSeed, PassengerSeed, SeedConfig};

const DEFAULT_CONFIG_FILE: &str = "config.json";
const DEFAULT_NETWORK: &str = "localhost";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_ORACLES_COUNT: usize = 30;
const DEFAULT_ORACLE_GAS: u64 = 4_000_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no configuration for network '{0}'")]
    UnknownNetwork(String),

    #[error("{name} must be a number, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}

/// Everything read from the environment at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub network: String,
    pub contracts: ContractsConfig,
    pub seed: SeedConfig,
    pub port: u16,
    pub oracles_count: usize,
    pub oracle_gas: u64,
    /// When set, events are polled at this interval instead of subscribed.
    pub event_poll_interval: Option<Duration>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config_file =
            env::var("FLIGHTSURETY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let network =
            env::var("FLIGHTSURETY_NETWORK").unwrap_or_else(|_| DEFAULT_NETWORK.to_string());

        let contracts = ContractsConfig::load(&config_file, &network)?;
        let seed = match env::var("FLIGHTSURETY_SEED") {
            Ok(path) => SeedConfig::load(path)?,
            Err(_) => SeedConfig::default(),
        };

        Ok(Self {
            network,
            contracts,
            seed,
            port: number_from_env("PORT", DEFAULT_PORT)?,
            oracles_count: number_from_env("ORACLES_COUNT", DEFAULT_ORACLES_COUNT)?,
            oracle_gas: number_from_env("ORACLE_GAS", DEFAULT_ORACLE_GAS)?,
            event_poll_interval: env::var("EVENT_POLL_MS")
                .ok()
                .map(|value| parse_number("EVENT_POLL_MS", &value))
                .transpose()?
                .map(Duration::from_millis),
        })
    }
}

fn number_from_env<N: std::str::FromStr>(name: &'static str, default: N) -> Result<N, ConfigError> {
    match env::var(name) {
        Ok(value) => parse_number(name, &value),
        Err(_) => Ok(default),
    }
}

fn parse_number<N: std::str::FromStr>(name: &'static str, value: &str) -> Result<N, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        name,
        value: value.to_string(),
    })
}
