use std::path::Path;

use alloy_primitives::Address;
use serde::Deserialize;

use super::ConfigError;

/// Static directory data the front-end ships with.
#[derive(Clone, Debug, Deserialize)]
pub struct SeedConfig {
    pub airlines: Vec<AirlineSeed>,
    pub passengers: Vec<PassengerSeed>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AirlineSeed {
    pub name: String,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub flights: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PassengerSeed {
    pub name: String,
    #[serde(default)]
    pub address: Option<Address>,
}

impl SeedConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        let airline = |name: &str, flights: &[&str]| AirlineSeed {
            name: name.to_string(),
            address: None,
            flights: flights.iter().map(|f| f.to_string()).collect(),
        };
        let passenger = |name: &str| PassengerSeed {
            name: name.to_string(),
            address: None,
        };

        Self {
            airlines: vec![
                airline("Air Canada", &["AC101", "AC215", "AC870"]),
                airline("Delta", &["DL044", "DL398", "DL1210"]),
                airline("Lufthansa", &["LH400", "LH454", "LH731"]),
                airline("Emirates", &["EK201", "EK412"]),
                airline("Qantas", &["QF001", "QF012", "QF094"]),
            ],
            passengers: vec![
                passenger("Alice"),
                passenger("Bob"),
                passenger("Carol"),
                passenger("Dave"),
                passenger("Erin"),
            ],
        }
    }
}
