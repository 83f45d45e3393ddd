//! JSON-RPC transport to the Ethereum node

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use crate::error::ChainError;

/// A request/response channel to a node.
///
/// Implementations return the `result` member of the JSON-RPC response, or
/// the node's `error` member as [`ChainError::Rpc`].
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ChainError>;
}

/// JSON-RPC over HTTP POST.
pub struct HttpTransport {
    url: String,
    http: Client,
    request_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: Client::new(),
            request_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let response = self
            .http
            .post(&self.url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": method,
                "params": params,
            }))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        tracing::trace!(method, id, %status, "rpc response received");
        decode_response(status, body)
    }
}

/// Decodes an HTTP reply. Nodes may answer a failed call with a non-2xx
/// status and a JSON-RPC `error` body; that error wins over the status.
fn decode_response(status: StatusCode, body: String) -> Result<Value, ChainError> {
    match serde_json::from_str::<Value>(&body) {
        Ok(envelope)
            if status.is_success() || envelope.get("error").is_some_and(|e| !e.is_null()) =>
        {
            into_result(envelope)
        }
        Err(err) if status.is_success() => {
            Err(ChainError::invalid_response(format!("{err}: {body}")))
        }
        _ => Err(ChainError::HttpStatus {
            status: status.as_u16(),
            body,
        }),
    }
}

/// Splits a JSON-RPC response envelope into its result or error.
pub fn into_result(mut response: Value) -> Result<Value, ChainError> {
    if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
        return Err(ChainError::Rpc {
            code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
            message: error
                .get("message")
                .and_then(Value::as_str)
                .map(ToString::to_string)
                .unwrap_or_else(|| error.to_string()),
        });
    }

    match response.get_mut("result") {
        Some(result) => Ok(result.take()),
        None => Err(ChainError::invalid_response(format!(
            "response without result: {response}"
        ))),
    }
}
