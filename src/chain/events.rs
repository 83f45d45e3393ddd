//! Long-lived log subscriptions delivered over a channel

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::client::{ChainClient, LogFilter, RawLog};
use super::rpc::RpcTransport;
use crate::error::ChainError;

const CHANNEL_CAPACITY: usize = 256;

/// How new logs are followed once history has been replayed.
#[derive(Clone, Debug)]
pub enum EventSource {
    /// `eth_subscribe("logs")` on a persistent socket.
    WebSocket(String),
    /// `eth_getLogs` by block cursor at a fixed interval.
    Polling(Duration),
}

/// Logs matching a filter, replayed from genesis and then followed.
///
/// Dropping the subscription stops the background task and closes the
/// socket.
pub struct LogSubscription {
    receiver: mpsc::Receiver<Result<RawLog, ChainError>>,
    task: JoinHandle<()>,
}

impl LogSubscription {
    pub fn spawn<T>(client: Arc<ChainClient<T>>, filter: LogFilter, source: EventSource) -> Self
    where
        T: RpcTransport + 'static,
    {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let task = tokio::spawn(async move {
            let outcome = match source {
                EventSource::WebSocket(url) => follow_socket(&client, &filter, &url, &sender).await,
                EventSource::Polling(interval) => {
                    follow_polling(&client, &filter, interval, &sender).await
                }
            };

            if let Err(err) = outcome {
                tracing::error!(error = %err, address = %filter.address, "log subscription ended");
                let _ = sender.send(Err(err)).await;
            }
        });

        Self { receiver, task }
    }

    /// Next log, or `None` once the subscription has ended.
    pub async fn next(&mut self) -> Option<Result<RawLog, ChainError>> {
        self.receiver.recv().await
    }
}

impl Drop for LogSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

type LogSender = mpsc::Sender<Result<RawLog, ChainError>>;

/// Replays every matching log up to the current head. Returns the last block
/// covered, or `None` when the receiver is gone.
async fn replay_history<T: RpcTransport>(
    client: &ChainClient<T>,
    filter: &LogFilter,
    sender: &LogSender,
) -> Result<Option<u64>, ChainError> {
    let head = client.block_number().await?;
    let logs = client.logs(filter, 0, Some(head)).await?;

    tracing::debug!(head, replayed = logs.len(), "replayed historical logs");

    for log in logs {
        if sender.send(Ok(log)).await.is_err() {
            return Ok(None);
        }
    }

    Ok(Some(head))
}

async fn follow_polling<T: RpcTransport>(
    client: &ChainClient<T>,
    filter: &LogFilter,
    interval: Duration,
    sender: &LogSender,
) -> Result<(), ChainError> {
    let Some(mut cursor) = replay_history(client, filter, sender).await? else {
        return Ok(());
    };

    loop {
        tokio::time::sleep(interval).await;

        let head = match client.block_number().await {
            Ok(head) => head,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read block number");
                if sender.send(Err(err)).await.is_err() {
                    return Ok(());
                }
                continue;
            }
        };

        if head <= cursor {
            continue;
        }

        match client.logs(filter, cursor + 1, Some(head)).await {
            Ok(logs) => {
                for log in logs {
                    if sender.send(Ok(log)).await.is_err() {
                        return Ok(());
                    }
                }
                cursor = head;
            }
            Err(err) => {
                tracing::warn!(error = %err, from = cursor + 1, to = head, "failed to poll logs");
                if sender.send(Err(err)).await.is_err() {
                    return Ok(());
                }
            }
        }
    }
}

async fn follow_socket<T: RpcTransport>(
    client: &ChainClient<T>,
    filter: &LogFilter,
    url: &str,
    sender: &LogSender,
) -> Result<(), ChainError> {
    let (mut socket, _) = connect_async(url).await?;

    // Subscribe before replaying so nothing mined in between is lost.
    let subscribe = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "eth_subscribe",
        "params": ["logs", filter.to_json(None, None)],
    });
    socket.send(Message::Text(subscribe.to_string())).await?;

    tracing::info!(%url, address = %filter.address, "subscribed to contract logs");

    let Some(replayed_to) = replay_history(client, filter, sender).await? else {
        return Ok(());
    };

    while let Some(message) = socket.next().await {
        let text = match message? {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let Some(log) = parse_notification(&text)? else {
            continue;
        };

        if log.block().is_some_and(|block| block <= replayed_to) {
            continue;
        }

        if sender.send(Ok(log)).await.is_err() {
            return Ok(());
        }
    }

    Err(ChainError::invalid_response("log subscription socket closed"))
}

/// Extracts the log from an `eth_subscription` notification. Other frames
/// (the subscription id reply) yield `None`.
fn parse_notification(text: &str) -> Result<Option<RawLog>, ChainError> {
    let frame: Value =
        serde_json::from_str(text).map_err(|err| ChainError::invalid_response(err.to_string()))?;

    if frame.get("id").is_some() {
        // Reply to eth_subscribe; an error here means the node refused it.
        super::rpc::into_result(frame)?;
        return Ok(None);
    }

    if frame.get("method").and_then(Value::as_str) != Some("eth_subscription") {
        return Ok(None);
    }

    match frame.pointer("/params/result") {
        Some(result) => serde_json::from_value(result.clone())
            .map(Some)
            .map_err(|err| ChainError::invalid_response(err.to_string())),
        None => Ok(None),
    }
}
