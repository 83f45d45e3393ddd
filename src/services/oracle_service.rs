//! Stand-in for the off-chain oracle network: authorizes the app contract,
//! registers a pool of oracle accounts and relays oracle requests to the log.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::chain::RpcTransport;
use crate::contract::{ContractEvent, ContractEvents, FlightSuretyContract};
use crate::error::ChainError;
use crate::models::OracleRegistry;

pub struct OracleBootstrapper<T> {
    contract: Arc<FlightSuretyContract<T>>,
    registry: OracleRegistry,
    oracles_count: usize,
}

impl<T: RpcTransport + 'static> OracleBootstrapper<T> {
    pub fn new(
        contract: Arc<FlightSuretyContract<T>>,
        registry: OracleRegistry,
        oracles_count: usize,
    ) -> Self {
        Self {
            contract,
            registry,
            oracles_count,
        }
    }

    pub fn registry(&self) -> &OracleRegistry {
        &self.registry
    }

    /// Startup sequence: authorize, then register oracles. Failures are
    /// logged; nothing is retried. The returned handles belong to the
    /// per-account registrations still in flight.
    pub async fn run(&self) -> Vec<JoinHandle<()>> {
        info!(accounts = self.contract.accounts().len(), "bootstrapping oracles");

        self.authorize().await;

        match self.register_oracles().await {
            Ok(handles) => handles,
            Err(err) => {
                error!(error = %err, "Error reading oracle registration fee");
                Vec::new()
            }
        }
    }

    /// Lets the app contract call the data contract. Returns whether the
    /// authorization was mined.
    pub async fn authorize(&self) -> bool {
        let app = self.contract.app_address();
        match self.contract.authorize_caller(app).await {
            Ok(receipt) => {
                info!(%app, tx_hash = %receipt.transaction_hash, "app contract authorized on data contract");
                true
            }
            Err(err) => {
                error!(error = %err, %app, "Error in authorizing app contract");
                false
            }
        }
    }

    /// Reads the registration fee, then starts one registration per oracle
    /// account without waiting for earlier ones to finish.
    pub async fn register_oracles(&self) -> Result<Vec<JoinHandle<()>>, ChainError> {
        let fee = self.contract.registration_fee().await?;
        let oracles = self.oracle_accounts();

        info!(oracles = oracles.len(), %fee, "registering oracles");

        let handles = oracles
            .into_iter()
            .map(|oracle| {
                let contract = Arc::clone(&self.contract);
                let registry = self.registry.clone();
                tokio::spawn(async move {
                    register_one(&contract, &registry, oracle, fee).await;
                })
            })
            .collect();

        Ok(handles)
    }

    /// Accounts 1..oracles_count; account 0 deployed the contracts.
    fn oracle_accounts(&self) -> Vec<Address> {
        let accounts = self.contract.accounts();
        let wanted = self.oracles_count.min(accounts.len());
        if wanted < self.oracles_count {
            warn!(
                requested = self.oracles_count,
                available = accounts.len(),
                "fewer node accounts than requested oracles"
            );
        }
        accounts.iter().take(wanted).skip(1).copied().collect()
    }
}

async fn register_one<T: RpcTransport>(
    contract: &FlightSuretyContract<T>,
    registry: &OracleRegistry,
    oracle: Address,
    fee: U256,
) {
    if let Err(err) = contract.register_oracle(oracle, fee).await {
        error!(error = %err, %oracle, "Error while registering oracle");
        return;
    }

    match contract.oracle_indexes(oracle).await {
        Ok(indexes) => {
            registry.record(oracle, indexes).await;
            info!(%oracle, ?indexes, "Oracle registered");
        }
        Err(err) => {
            error!(error = %err, %oracle, "Error reading oracle indexes");
        }
    }
}

/// Logs every oracle request from genesis until the stream ends, along with
/// the registered oracles whose indices match. Returns the number of
/// requests seen.
pub async fn relay_oracle_requests(mut events: ContractEvents, registry: OracleRegistry) -> usize {
    let mut relayed = 0;

    while let Some(event) = events.next().await {
        match event {
            Ok(ContractEvent::OracleRequest(request)) => {
                relayed += 1;
                let matching = registry.oracles_for(request.index).await;
                info!(
                    index = request.index,
                    oracles = matching.len(),
                    airline = %request.key.airline,
                    flight = %request.key.flight,
                    timestamp = request.key.timestamp,
                    "OracleRequest"
                );
            }
            Ok(ContractEvent::FlightStatusInfo(_)) => {}
            Err(err) => {
                error!(error = %err, "oracle request subscription error");
            }
        }
    }

    info!(relayed, "oracle request stream ended");
    relayed
}
