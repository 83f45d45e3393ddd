//! Typed wrappers around the eth_* JSON-RPC methods the DApp needs

use std::fmt;
use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::rpc::RpcTransport;
use crate::error::ChainError;

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Parameters of an `eth_call` or `eth_sendTransaction`.
#[derive(Clone, Debug, Default)]
pub struct CallRequest {
    pub from: Option<Address>,
    pub to: Address,
    pub data: Vec<u8>,
    pub value: Option<U256>,
    pub gas: Option<u64>,
}

impl CallRequest {
    pub fn new(to: Address, data: Vec<u8>) -> Self {
        Self {
            to,
            data,
            ..Default::default()
        }
    }

    pub fn from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    pub fn gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }

    fn to_json(&self) -> Value {
        let mut object = Map::new();
        if let Some(from) = self.from {
            object.insert("from".into(), json!(from));
        }
        object.insert("to".into(), json!(self.to));
        object.insert("data".into(), json!(format!("0x{}", hex::encode(&self.data))));
        if let Some(value) = self.value {
            object.insert("value".into(), json!(format!("0x{value:x}")));
        }
        if let Some(gas) = self.gas {
            object.insert("gas".into(), json!(format!("0x{gas:x}")));
        }
        Value::Object(object)
    }
}

/// Outcome of a mined transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    pub success: bool,
}

impl fmt::Display for TransactionReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.transaction_hash)
    }
}

/// A log entry as returned by `eth_getLogs` and log subscriptions.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: String,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<B256>,
    #[serde(default)]
    pub log_index: Option<String>,
}

impl RawLog {
    pub fn data_bytes(&self) -> Result<Vec<u8>, ChainError> {
        decode_hex(&self.data)
    }

    pub fn block(&self) -> Option<u64> {
        self.block_number
            .as_deref()
            .and_then(|quantity| parse_quantity(quantity).ok())
    }

    pub fn index(&self) -> Option<u64> {
        self.log_index
            .as_deref()
            .and_then(|quantity| parse_quantity(quantity).ok())
    }
}

/// Which logs to fetch: one contract, first topic any of `topics`.
#[derive(Clone, Debug)]
pub struct LogFilter {
    pub address: Address,
    pub topics: Vec<B256>,
}

impl LogFilter {
    pub fn new(address: Address, topics: Vec<B256>) -> Self {
        Self { address, topics }
    }

    pub(crate) fn to_json(&self, from_block: Option<u64>, to_block: Option<u64>) -> Value {
        let mut object = Map::new();
        object.insert("address".into(), json!(self.address));
        object.insert("topics".into(), json!([self.topics]));
        if let Some(from) = from_block {
            object.insert("fromBlock".into(), json!(format!("0x{from:x}")));
        }
        if let Some(to) = to_block {
            object.insert("toBlock".into(), json!(format!("0x{to:x}")));
        }
        Value::Object(object)
    }
}

/// Node client shared by the façade and the event streams.
pub struct ChainClient<T> {
    transport: T,
    receipt_poll_interval: Duration,
}

impl<T: RpcTransport> ChainClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            receipt_poll_interval: RECEIPT_POLL_INTERVAL,
        }
    }

    pub fn with_receipt_poll_interval(mut self, interval: Duration) -> Self {
        self.receipt_poll_interval = interval;
        self
    }

    pub async fn accounts(&self) -> Result<Vec<Address>, ChainError> {
        let value = self.transport.request("eth_accounts", json!([])).await?;
        serde_json::from_value(value).map_err(|err| ChainError::invalid_response(err.to_string()))
    }

    pub async fn block_number(&self) -> Result<u64, ChainError> {
        let value = self.transport.request("eth_blockNumber", json!([])).await?;
        let quantity = value
            .as_str()
            .ok_or_else(|| ChainError::invalid_response("block number is not a string"))?;
        parse_quantity(quantity)
    }

    /// Executes a read-only call against the latest block.
    pub async fn call(&self, request: &CallRequest) -> Result<Vec<u8>, ChainError> {
        let value = self
            .transport
            .request("eth_call", json!([request.to_json(), "latest"]))
            .await?;
        let data = value
            .as_str()
            .ok_or_else(|| ChainError::invalid_response("eth_call result is not a string"))?;
        decode_hex(data)
    }

    /// Sends a transaction from an unlocked node account and waits until it
    /// is mined. A mined transaction with a failed status is an error.
    pub async fn send_transaction(
        &self,
        request: &CallRequest,
    ) -> Result<TransactionReceipt, ChainError> {
        let value = self
            .transport
            .request("eth_sendTransaction", json!([request.to_json()]))
            .await?;
        let tx_hash: B256 = serde_json::from_value(value)
            .map_err(|err| ChainError::invalid_response(err.to_string()))?;

        tracing::debug!(%tx_hash, to = %request.to, "transaction submitted");

        let receipt = self.wait_for_receipt(tx_hash).await?;
        if !receipt.success {
            return Err(ChainError::Reverted(tx_hash));
        }
        Ok(receipt)
    }

    pub async fn logs(
        &self,
        filter: &LogFilter,
        from_block: u64,
        to_block: Option<u64>,
    ) -> Result<Vec<RawLog>, ChainError> {
        let value = self
            .transport
            .request("eth_getLogs", json!([filter.to_json(Some(from_block), to_block)]))
            .await?;
        serde_json::from_value(value).map_err(|err| ChainError::invalid_response(err.to_string()))
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TransactionReceipt, ChainError> {
        loop {
            let value = self
                .transport
                .request("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;

            if !value.is_null() {
                return parse_receipt(tx_hash, &value);
            }

            tokio::time::sleep(self.receipt_poll_interval).await;
        }
    }
}

fn parse_receipt(tx_hash: B256, value: &Value) -> Result<TransactionReceipt, ChainError> {
    let block_number = value
        .get("blockNumber")
        .and_then(Value::as_str)
        .map(parse_quantity)
        .transpose()?;

    // Pre-Byzantium receipts carry no status field.
    let success = match value.get("status") {
        Some(Value::String(status)) => parse_quantity(status)? == 1,
        Some(Value::Bool(status)) => *status,
        _ => true,
    };

    Ok(TransactionReceipt {
        transaction_hash: tx_hash,
        block_number,
        success,
    })
}

pub fn parse_quantity(quantity: &str) -> Result<u64, ChainError> {
    let digits = quantity.trim_start_matches("0x");
    if digits.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(digits, 16)
        .map_err(|_| ChainError::invalid_response(format!("invalid quantity '{quantity}'")))
}

pub fn decode_hex(data: &str) -> Result<Vec<u8>, ChainError> {
    hex::decode(data.trim_start_matches("0x"))
        .map_err(|err| ChainError::invalid_response(format!("invalid hex data: {err}")))
}
