//! FlightSurety DApp front-end
//!
//! Binds the UI controller to a line-oriented JSON protocol: one action per
//! line on stdin, rendered panel sections (and requested views) as JSON lines
//! on stdout.

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use flightsurety::chain::{ChainClient, EventSource, HttpTransport, RpcTransport};
use flightsurety::config::AppConfig;
use flightsurety::contract::{ContractEvents, FlightSuretyContract};
use flightsurety::ui::{Directories, InputField, SelectId, UiController};

#[derive(Debug, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum Command {
    Select { list: SelectId, value: String },
    Input { field: InputField, value: String },
    RegisterAirline,
    FundAirline,
    PurchaseInsurance,
    WithdrawFunds,
    FetchFlightStatus,
    View,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout carries the protocol.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    let client = Arc::new(ChainClient::new(HttpTransport::new(config.contracts.url.clone())));
    let contract = Arc::new(
        FlightSuretyContract::connect(client, &config.contracts)
            .await
            .context("failed to connect to node")?,
    );

    let source = match config.event_poll_interval {
        Some(interval) => EventSource::Polling(interval),
        None => EventSource::WebSocket(config.contracts.websocket_url()),
    };
    let events = contract.events(source);

    let directories = Directories::from_seed(&config.seed, contract.accounts());
    let mut controller = UiController::new(Arc::clone(&contract), directories);
    controller.load().await;

    let stdin = BufReader::new(tokio::io::stdin());
    run_session(&mut controller, events, stdin, &mut std::io::stdout()).await
}

/// Parses one protocol line.
fn parse_command(line: &str) -> Result<Command, serde_json::Error> {
    serde_json::from_str(line)
}

/// Serves commands from `input` and contract events until `input` closes.
/// A closed event stream only stops event updates.
async fn run_session<T, R, W>(
    controller: &mut UiController<T>,
    mut events: ContractEvents,
    input: R,
    out: &mut W,
) -> anyhow::Result<()>
where
    T: RpcTransport,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut printed = flush_panel(controller, 0, out)?;
    let mut events_open = true;

    let mut lines = input.lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    info!("stdin closed, exiting");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(command) => execute(controller, command, out).await?,
                    Err(err) => writeln!(out, "{}", json!({ "error": format!("invalid command: {err}") }))?,
                }
            }
            event = events.next(), if events_open => {
                match event {
                    Some(Ok(event)) => controller.apply_event(&event).await,
                    Some(Err(err)) => error!(error = %err, "event subscription error"),
                    None => {
                        warn!("event subscription closed, flight status updates stopped");
                        events_open = false;
                    }
                }
            }
        }

        printed = flush_panel(controller, printed, out)?;
    }

    Ok(())
}

async fn execute<T: RpcTransport, W: Write>(
    controller: &mut UiController<T>,
    command: Command,
    out: &mut W,
) -> anyhow::Result<()> {
    // Action outcomes are rendered into the panel; only select errors need
    // reporting here.
    match command {
        Command::Select { list, value } => {
            if let Err(err) = controller.select(list, &value).await {
                writeln!(out, "{}", json!({ "error": err.to_string() }))?;
            }
        }
        Command::Input { field, value } => controller.set_input(field, value),
        Command::RegisterAirline => {
            let _ = controller.register_airline().await;
        }
        Command::FundAirline => {
            let _ = controller.fund_airline().await;
        }
        Command::PurchaseInsurance => {
            let _ = controller.purchase_insurance().await;
        }
        Command::WithdrawFunds => {
            let _ = controller.withdraw_funds().await;
        }
        Command::FetchFlightStatus => {
            let _ = controller.fetch_flight_status().await;
        }
        Command::View => {
            writeln!(out, "{}", serde_json::to_string(controller.view())?)?;
        }
    }
    Ok(())
}

/// Prints panel sections appended since `printed`.
fn flush_panel<T: RpcTransport, W: Write>(
    controller: &UiController<T>,
    printed: usize,
    out: &mut W,
) -> anyhow::Result<usize> {
    let panel = controller.view().panel();
    for section in &panel[printed..] {
        writeln!(out, "{}", serde_json::to_string(&json!({ "section": section }))?)?;
    }
    out.flush()?;
    Ok(panel.len())
}
