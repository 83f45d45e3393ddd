use std::collections::HashMap;
use std::path::Path;

use alloy_primitives::Address;
use serde::Deserialize;

use super::ConfigError;

/// Deployment record for one network, as written by the migration step.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractsConfig {
    pub url: String,
    pub app_address: Address,
    pub data_address: Address,
    #[serde(default)]
    pub ws_url: Option<String>,
}

impl ContractsConfig {
    /// Reads the network record named `network` from a JSON file keyed by
    /// network name.
    pub fn load(path: impl AsRef<Path>, network: &str) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content, network)
    }

    pub fn from_json(content: &str, network: &str) -> Result<Self, ConfigError> {
        let mut networks: HashMap<String, ContractsConfig> = serde_json::from_str(content)?;
        networks
            .remove(network)
            .ok_or_else(|| ConfigError::UnknownNetwork(network.to_string()))
    }

    /// Socket endpoint used for event subscriptions.
    pub fn websocket_url(&self) -> String {
        match &self.ws_url {
            Some(url) => url.clone(),
            None => self.url.replacen("http", "ws", 1),
        }
    }
}
