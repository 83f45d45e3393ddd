//! Error types shared by the chain client and the contract façade

use alloy_primitives::B256;
use thiserror::Error;

/// Errors reported while talking to the node.
///
/// Node and contract errors are never classified: `Rpc` carries the message
/// exactly as the node returned it.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("{message}")]
    Rpc { code: i64, message: String },

    #[error("transaction {0} reverted")]
    Reverted(B256),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("abi decoding failed: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    #[error("invalid ether amount: {0}")]
    Units(#[from] alloy_primitives::utils::UnitsError),

    #[error("invalid ether amount: {0} is negative")]
    NegativeAmount(String),

    #[error("node returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("unexpected node response: {0}")]
    InvalidResponse(String),
}

impl ChainError {
    pub fn invalid_response(detail: impl Into<String>) -> Self {
        Self::InvalidResponse(detail.into())
    }
}
