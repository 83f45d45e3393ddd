//! In-memory JSON-RPC node hosting a FlightSurety deployment.
//!
//! Mirrors the observable rules of the two contracts closely enough to
//! exercise the client end to end: owner-only operating status, operational
//! gating, airline funding, registration by the first four airlines without
//! votes and by majority afterwards, capped insurance, oracle registration.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::abi::TokenSeq;
use alloy_sol_types::{SolCall, SolEvent, SolType, SolValue};
use async_trait::async_trait;
use serde_json::{json, Value};

use flightsurety::chain::abi::{FlightSuretyApp as App, FlightSuretyData as Data};
use flightsurety::chain::{ChainClient, RpcTransport};
use flightsurety::config::ContractsConfig;
use flightsurety::contract::FlightSuretyContract;
use flightsurety::error::ChainError;

pub const ETHER: u128 = 1_000_000_000_000_000_000;
pub const ACCOUNT_COUNT: u8 = 20;
pub const STARTING_BALANCE: u128 = 100 * ETHER;
pub const AIRLINE_FUNDING: u128 = 10 * ETHER;
pub const INSURANCE_CAP: u128 = ETHER;
pub const ORACLE_FEE: u128 = ETHER;
pub const CONSENSUS_THRESHOLD: usize = 4;

pub fn ether(amount: u128) -> U256 {
    U256::from(amount * ETHER)
}

pub fn account(index: u8) -> Address {
    Address::with_last_byte(index + 1)
}

#[derive(Clone)]
pub struct SimulatedChain {
    pub app: Address,
    pub data: Address,
    state: Arc<Mutex<ChainState>>,
}

struct Insurance {
    passenger: Address,
    airline: Address,
    flight: String,
    timestamp: U256,
    amount: U256,
}

struct ChainState {
    accounts: Vec<Address>,
    balances: HashMap<Address, U256>,
    operational: bool,
    authorized: HashSet<Address>,
    registered: Vec<Address>,
    funds: HashMap<Address, U256>,
    votes: HashMap<Address, HashSet<Address>>,
    insurances: Vec<Insurance>,
    credits: HashMap<Address, U256>,
    oracles: HashMap<Address, [u8; 3]>,
    block: u64,
    tx_count: u64,
    logs: Vec<Value>,
    receipts: HashMap<B256, Value>,
    invocations: Vec<String>,
}

type Outcome = Result<(Vec<u8>, Vec<Value>), String>;

impl SimulatedChain {
    /// Fresh deployment: account 1 is the first airline, the app contract
    /// is not yet authorized on the data contract.
    pub fn new() -> Self {
        let accounts: Vec<Address> = (0..ACCOUNT_COUNT).map(account).collect();
        let balances = accounts
            .iter()
            .map(|a| (*a, U256::from(STARTING_BALANCE)))
            .collect();

        Self {
            app: Address::with_last_byte(0xa0),
            data: Address::with_last_byte(0xd0),
            state: Arc::new(Mutex::new(ChainState {
                registered: vec![accounts[1]],
                accounts,
                balances,
                operational: true,
                authorized: HashSet::new(),
                funds: HashMap::new(),
                votes: HashMap::new(),
                insurances: Vec::new(),
                credits: HashMap::new(),
                oracles: HashMap::new(),
                block: 0,
                tx_count: 0,
                logs: Vec::new(),
                receipts: HashMap::new(),
                invocations: Vec::new(),
            })),
        }
    }

    /// Deployment with the app contract already authorized.
    pub fn deployed() -> Self {
        let chain = Self::new();
        let app = chain.app;
        chain.state().authorized.insert(app);
        chain
    }

    pub fn contracts_config(&self) -> ContractsConfig {
        ContractsConfig {
            url: "http://simulated".to_string(),
            app_address: self.app,
            data_address: self.data,
            ws_url: None,
        }
    }

    pub async fn connect(&self) -> Arc<FlightSuretyContract<SimulatedChain>> {
        self.connect_to(&self.contracts_config()).await
    }

    pub async fn connect_to(
        &self,
        contracts: &ContractsConfig,
    ) -> Arc<FlightSuretyContract<SimulatedChain>> {
        let client = ChainClient::new(self.clone())
            .with_receipt_poll_interval(Duration::from_millis(1));
        Arc::new(
            FlightSuretyContract::connect(Arc::new(client), contracts)
                .await
                .expect("connect to simulated chain"),
        )
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ChainState> {
        self.state.lock().expect("chain state lock")
    }

    // ===== Test inspection and control =====

    pub fn is_authorized(&self, caller: Address) -> bool {
        self.state().authorized.contains(&caller)
    }

    pub fn is_registered(&self, airline: Address) -> bool {
        self.state().registered.contains(&airline)
    }

    pub fn set_balance(&self, address: Address, balance: U256) {
        self.state().balances.insert(address, balance);
    }

    pub fn balance(&self, address: Address) -> U256 {
        self.state().balances.get(&address).copied().unwrap_or_default()
    }

    pub fn oracle_count(&self) -> usize {
        self.state().oracles.len()
    }

    /// Indexes the app contract assigned to `oracle` on registration.
    pub fn assigned_indexes(&self, oracle: Address) -> Option<[u8; 3]> {
        self.state().oracles.get(&oracle).copied()
    }

    /// Number of calls and transactions that invoked `function`.
    pub fn invocations(&self, function: &str) -> usize {
        self.state()
            .invocations
            .iter()
            .filter(|name| name.as_str() == function)
            .count()
    }

    /// Stands in for the oracles agreeing on a status: credits insurees
    /// 1.5x on an airline delay and emits `FlightStatusInfo`.
    pub fn resolve_flight(&self, airline: Address, flight: &str, timestamp: u64, status: u8) {
        let mut state = self.state();
        let timestamp = U256::from(timestamp);

        if status == 20 {
            let payouts: Vec<(Address, U256)> = state
                .insurances
                .iter()
                .filter(|i| i.airline == airline && i.flight == flight && i.timestamp == timestamp)
                .map(|i| (i.passenger, i.amount * U256::from(3) / U256::from(2)))
                .collect();
            for (passenger, payout) in payouts {
                *state.credits.entry(passenger).or_default() += payout;
            }
        }

        let event = App::FlightStatusInfo {
            airline,
            flight: flight.to_string(),
            timestamp,
            status,
        };
        let log = event_log(self.app, &event);
        state.mine(vec![log]);
    }

    /// An `OracleRequest` log as a node would push it at `block`.
    pub fn oracle_request_log(
        &self,
        airline: Address,
        flight: &str,
        timestamp: u64,
        block: u64,
    ) -> Value {
        let event = App::OracleRequest {
            index: 0,
            airline,
            flight: flight.to_string(),
            timestamp: U256::from(timestamp),
        };
        let mut log = event_log(self.app, &event);
        log["blockNumber"] = json!(format!("0x{block:x}"));
        log["logIndex"] = json!("0x0");
        log
    }

    // ===== Contract execution =====

    fn execute_call(&self, from: Address, to: Address, data: &[u8]) -> Outcome {
        let mut state = self.state();
        state.dispatch(self.app, self.data, from, to, data, U256::ZERO, false)
    }

    fn execute_transaction(
        &self,
        from: Address,
        to: Address,
        data: &[u8],
        value: U256,
    ) -> Result<B256, ChainError> {
        let mut state = self.state();

        let balance = state.balances.get(&from).copied().unwrap_or_default();
        if balance < value {
            return Err(ChainError::Rpc {
                code: -32000,
                message: "sender doesn't have enough funds to send tx".to_string(),
            });
        }

        match state.dispatch(self.app, self.data, from, to, data, value, true) {
            Ok((_, logs)) => {
                *state.balances.entry(from).or_default() -= value;
                Ok(state.mine(logs))
            }
            Err(reason) => Err(ChainError::Rpc {
                code: -32000,
                message: format!("VM Exception while processing transaction: revert {reason}"),
            }),
        }
    }
}

impl ChainState {
    /// Records a transaction in a new block and returns its hash.
    fn mine(&mut self, logs: Vec<Value>) -> B256 {
        self.block += 1;
        self.tx_count += 1;

        let mut hash = [0u8; 32];
        hash[24..].copy_from_slice(&self.tx_count.to_be_bytes());
        let tx_hash = B256::from(hash);

        for (index, mut log) in logs.into_iter().enumerate() {
            log["blockNumber"] = json!(format!("0x{:x}", self.block));
            log["logIndex"] = json!(format!("0x{index:x}"));
            log["transactionHash"] = json!(tx_hash);
            self.logs.push(log);
        }

        self.receipts.insert(
            tx_hash,
            json!({
                "transactionHash": tx_hash,
                "blockNumber": format!("0x{:x}", self.block),
                "status": "0x1",
            }),
        );
        tx_hash
    }

    #[allow(clippy::too_many_arguments)]
    fn dispatch(
        &mut self,
        app: Address,
        data_contract: Address,
        from: Address,
        to: Address,
        data: &[u8],
        value: U256,
        mutating: bool,
    ) -> Outcome {
        if data.len() < 4 {
            return Err("missing function selector".to_string());
        }
        let selector: [u8; 4] = data[..4].try_into().expect("four bytes");

        if to == data_contract {
            return self.dispatch_data(from, selector, data, mutating);
        }
        if to != app {
            return Err("no contract at address".to_string());
        }

        macro_rules! decode {
            ($call:ty) => {
                <$call>::abi_decode(data, true).map_err(|e| e.to_string())?
            };
        }

        if selector == App::isOperationalCall::SELECTOR {
            self.invoked("isOperational");
            return returns((self.operational,));
        }
        if selector == App::getExistingAirlinesCall::SELECTOR {
            self.invoked("getExistingAirlines");
            return returns((self.registered.clone(),));
        }
        if selector == App::getAirlineFundsCall::SELECTOR {
            let call = decode!(App::getAirlineFundsCall);
            self.invoked("getAirlineFunds");
            return returns((self.funds.get(&call.airline).copied().unwrap_or_default(),));
        }
        if selector == App::getPassengerCreditCall::SELECTOR {
            let call = decode!(App::getPassengerCreditCall);
            self.invoked("getPassengerCredit");
            return returns((self.credits.get(&call.passenger).copied().unwrap_or_default(),));
        }
        if selector == App::REGISTRATION_FEECall::SELECTOR {
            self.invoked("REGISTRATION_FEE");
            return returns((U256::from(ORACLE_FEE),));
        }
        if selector == App::getMyIndexesCall::SELECTOR {
            self.invoked("getMyIndexes");
            return match self.oracles.get(&from) {
                Some(indexes) => Ok((
                    App::getMyIndexesCall::abi_encode_returns(&(*indexes,)),
                    Vec::new(),
                )),
                None => Err("Not registered as an oracle".to_string()),
            };
        }

        // Everything below changes state.
        if !mutating {
            return Ok((Vec::new(), Vec::new()));
        }
        if !self.operational {
            return Err("Contract is currently not operational".to_string());
        }
        if !self.authorized.contains(&app) {
            return Err("Caller is not authorized".to_string());
        }

        if selector == App::registerAirlineCall::SELECTOR {
            let call = decode!(App::registerAirlineCall);
            self.invoked("registerAirline");
            return self.register_airline(from, call.airline);
        }
        if selector == App::fundAirlineCall::SELECTOR {
            self.invoked("fundAirline");
            if !self.registered.contains(&from) {
                return Err("Only registered airlines can provide funding".to_string());
            }
            *self.funds.entry(from).or_default() += value;
            return ok();
        }
        if selector == App::buyInsuranceCall::SELECTOR {
            let call = decode!(App::buyInsuranceCall);
            self.invoked("buyInsurance");
            if !self.registered.contains(&call.airline) {
                return Err("Airline is not registered".to_string());
            }
            if value.is_zero() || value > U256::from(INSURANCE_CAP) {
                return Err("Insurance is capped at 1 ether".to_string());
            }
            self.insurances.push(Insurance {
                passenger: from,
                airline: call.airline,
                flight: call.flight,
                timestamp: call.timestamp,
                amount: value,
            });
            return ok();
        }
        if selector == App::withdrawCreditCall::SELECTOR {
            let call = decode!(App::withdrawCreditCall);
            self.invoked("withdrawCredit");
            let credit = self.credits.get(&from).copied().unwrap_or_default();
            if call.amount > credit {
                return Err("Insufficient credit".to_string());
            }
            self.credits.insert(from, credit - call.amount);
            *self.balances.entry(from).or_default() += call.amount;
            return ok();
        }
        if selector == App::fetchFlightStatusCall::SELECTOR {
            let call = decode!(App::fetchFlightStatusCall);
            self.invoked("fetchFlightStatus");
            let event = App::OracleRequest {
                index: (self.block % 10) as u8,
                airline: call.airline,
                flight: call.flight,
                timestamp: call.timestamp,
            };
            return Ok((Vec::new(), vec![event_log(app, &event)]));
        }
        if selector == App::registerOracleCall::SELECTOR {
            self.invoked("registerOracle");
            if value < U256::from(ORACLE_FEE) {
                return Err("Registration fee is required".to_string());
            }
            let n = self.oracles.len() as u8;
            self.oracles
                .insert(from, [n % 10, (n + 3) % 10, (n + 7) % 10]);
            return ok();
        }

        Err("unknown function".to_string())
    }

    fn dispatch_data(
        &mut self,
        from: Address,
        selector: [u8; 4],
        data: &[u8],
        mutating: bool,
    ) -> Outcome {
        let owner = self.accounts[0];

        if selector == Data::isOperationalCall::SELECTOR {
            return returns((self.operational,));
        }
        if selector == Data::isRegisteredCall::SELECTOR {
            let call = Data::isRegisteredCall::abi_decode(data, true).map_err(|e| e.to_string())?;
            return returns((self.registered.contains(&call.airline),));
        }
        if !mutating {
            return Ok((Vec::new(), Vec::new()));
        }
        if selector == Data::setOperatingStatusCall::SELECTOR {
            let call =
                Data::setOperatingStatusCall::abi_decode(data, true).map_err(|e| e.to_string())?;
            self.invoked("setOperatingStatus");
            if from != owner {
                return Err("Caller is not contract owner".to_string());
            }
            self.operational = call.mode;
            return ok();
        }
        if selector == Data::authorizeCallerCall::SELECTOR {
            let call =
                Data::authorizeCallerCall::abi_decode(data, true).map_err(|e| e.to_string())?;
            self.invoked("authorizeCaller");
            if from != owner {
                return Err("Caller is not contract owner".to_string());
            }
            if !self.operational {
                return Err("Contract is currently not operational".to_string());
            }
            self.authorized.insert(call.caller);
            return ok();
        }

        Err("unknown function".to_string())
    }

    fn register_airline(&mut self, from: Address, airline: Address) -> Outcome {
        if !self.registered.contains(&from) {
            return Err("Caller is not a registered airline".to_string());
        }
        if self.funds.get(&from).copied().unwrap_or_default() < U256::from(AIRLINE_FUNDING) {
            return Err("Caller has not provided funding".to_string());
        }
        if self.registered.contains(&airline) {
            return Err("Airline is already registered".to_string());
        }

        if self.registered.len() < CONSENSUS_THRESHOLD {
            self.registered.push(airline);
            return ok();
        }

        let voters = self.votes.entry(airline).or_default();
        if !voters.insert(from) {
            return Err("Caller has already voted".to_string());
        }
        if voters.len() * 2 >= self.registered.len() {
            self.votes.remove(&airline);
            self.registered.push(airline);
        }
        ok()
    }

    fn invoked(&mut self, function: &str) {
        self.invocations.push(function.to_string());
    }
}

fn returns<V: SolValue>(value: V) -> Outcome
where
    for<'a> <<V as SolValue>::SolType as SolType>::Token<'a>: TokenSeq<'a>,
{
    Ok((value.abi_encode_params(), Vec::new()))
}

fn ok() -> Outcome {
    Ok((Vec::new(), Vec::new()))
}

fn event_log<E: SolEvent>(address: Address, event: &E) -> Value {
    json!({
        "address": address,
        "topics": [E::SIGNATURE_HASH],
        "data": format!("0x{}", hex::encode(event.encode_data())),
    })
}

fn parse_address(value: &Value) -> Result<Address, ChainError> {
    serde_json::from_value(value.clone())
        .map_err(|e| ChainError::invalid_response(format!("bad address: {e}")))
}

fn parse_data(value: &Value) -> Result<Vec<u8>, ChainError> {
    let text = value.as_str().unwrap_or("0x");
    hex::decode(text.trim_start_matches("0x"))
        .map_err(|e| ChainError::invalid_response(format!("bad data: {e}")))
}

fn parse_u256(value: &Value) -> U256 {
    value
        .as_str()
        .and_then(|s| U256::from_str_radix(s.trim_start_matches("0x"), 16).ok())
        .unwrap_or_default()
}

fn parse_block(value: &Value, default: u64) -> u64 {
    match value.as_str() {
        Some("latest") | None => default,
        Some(quantity) => u64::from_str_radix(quantity.trim_start_matches("0x"), 16).unwrap_or(0),
    }
}

#[async_trait]
impl RpcTransport for SimulatedChain {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        match method {
            "eth_accounts" => Ok(json!(self.state().accounts)),
            "eth_blockNumber" => Ok(json!(format!("0x{:x}", self.state().block))),
            "eth_call" => {
                let tx = &params[0];
                let from = parse_address(&tx["from"]).unwrap_or_default();
                let to = parse_address(&tx["to"])?;
                let data = parse_data(&tx["data"])?;
                match self.execute_call(from, to, &data) {
                    Ok((output, _)) => Ok(json!(format!("0x{}", hex::encode(output)))),
                    Err(reason) => Err(ChainError::Rpc {
                        code: -32000,
                        message: format!("VM Exception while processing transaction: revert {reason}"),
                    }),
                }
            }
            "eth_sendTransaction" => {
                let tx = &params[0];
                let from = parse_address(&tx["from"])?;
                let to = parse_address(&tx["to"])?;
                let data = parse_data(&tx["data"])?;
                let value = parse_u256(&tx["value"]);
                let hash = self.execute_transaction(from, to, &data, value)?;
                Ok(json!(hash))
            }
            "eth_getTransactionReceipt" => {
                let hash: B256 = serde_json::from_value(params[0].clone())
                    .map_err(|e| ChainError::invalid_response(e.to_string()))?;
                Ok(self.state().receipts.get(&hash).cloned().unwrap_or(Value::Null))
            }
            "eth_getLogs" => {
                let filter = &params[0];
                let state = self.state();
                let from_block = parse_block(&filter["fromBlock"], 0);
                let to_block = parse_block(&filter["toBlock"], state.block);
                let address = filter["address"].clone();
                let topics: Vec<Value> = filter["topics"][0].as_array().cloned().unwrap_or_default();

                let logs: Vec<Value> = state
                    .logs
                    .iter()
                    .filter(|log| {
                        let block = parse_block(&log["blockNumber"], 0);
                        block >= from_block
                            && block <= to_block
                            && parse_address(&log["address"]).ok() == parse_address(&address).ok()
                            && (topics.is_empty() || topics.contains(&log["topics"][0]))
                    })
                    .cloned()
                    .collect();
                Ok(json!(logs))
            }
            other => Err(ChainError::Rpc {
                code: -32601,
                message: format!("Method {other} not supported"),
            }),
        }
    }
}
