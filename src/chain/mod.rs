//! Node connectivity: transport, typed RPC calls, log subscriptions and the
//! contract ABI.

pub mod abi;
pub mod client;
pub mod events;
pub mod rpc;
pub mod units;

pub use client::{CallRequest, ChainClient, LogFilter, RawLog, TransactionReceipt};
pub use events::{EventSource, LogSubscription};
pub use rpc::{HttpTransport, RpcTransport};
