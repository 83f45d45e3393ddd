//! Data models for the oracle server

pub mod oracle;

use serde::{Deserialize, Serialize};

pub use oracle::OracleRegistry;

/// Body of the static acknowledgement route.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiMessage {
    pub message: String,
}
