//! Typed client for the FlightSurety app and data contracts

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;

use super::types::{ContractEvent, FlightKey, OracleIndexes};
use crate::chain::abi::{FlightSuretyApp, FlightSuretyData};
use crate::chain::units::to_wei;
use crate::chain::{
    CallRequest, ChainClient, EventSource, LogFilter, LogSubscription, RpcTransport,
    TransactionReceipt,
};
use crate::config::ContractsConfig;
use crate::error::ChainError;

const DEFAULT_GAS: u64 = 4_000_000;

/// Connection context for one deployment of the contracts.
///
/// Built once and shared by `Arc`; node accounts are fetched on connect and
/// account 0 acts as the contract owner.
pub struct FlightSuretyContract<T> {
    client: Arc<ChainClient<T>>,
    app_address: Address,
    data_address: Address,
    accounts: Vec<Address>,
    gas: u64,
}

impl<T: RpcTransport> FlightSuretyContract<T> {
    pub async fn connect(
        client: Arc<ChainClient<T>>,
        contracts: &ContractsConfig,
    ) -> Result<Self, ChainError> {
        let accounts = client.accounts().await?;
        if accounts.is_empty() {
            return Err(ChainError::invalid_response("node reports no accounts"));
        }

        tracing::info!(
            accounts = accounts.len(),
            app = %contracts.app_address,
            data = %contracts.data_address,
            "connected to FlightSurety contracts"
        );

        Ok(Self {
            client,
            app_address: contracts.app_address,
            data_address: contracts.data_address,
            accounts,
            gas: DEFAULT_GAS,
        })
    }

    pub fn with_gas(mut self, gas: u64) -> Self {
        self.gas = gas;
        self
    }

    pub fn client(&self) -> &Arc<ChainClient<T>> {
        &self.client
    }

    pub fn owner(&self) -> Address {
        self.accounts[0]
    }

    pub fn accounts(&self) -> &[Address] {
        &self.accounts
    }

    pub fn app_address(&self) -> Address {
        self.app_address
    }

    pub fn data_address(&self) -> Address {
        self.data_address
    }

    // ===== FlightSuretyApp =====

    pub async fn is_operational(&self) -> Result<bool, ChainError> {
        let ret = self
            .call(self.app_address, self.owner(), FlightSuretyApp::isOperationalCall {})
            .await?;
        Ok(ret._0)
    }

    /// Registers `airline` on behalf of `from`. Whether the registration
    /// takes effect immediately or counts as one vote is decided by the
    /// contract.
    pub async fn register_airline(
        &self,
        from: Address,
        airline: Address,
    ) -> Result<TransactionReceipt, ChainError> {
        self.send(
            self.app_address,
            from,
            FlightSuretyApp::registerAirlineCall { airline },
            None,
        )
        .await
    }

    pub async fn purchase_insurance(
        &self,
        airline: Address,
        flight: &str,
        passenger: Address,
        amount_ether: &str,
        timestamp: u64,
    ) -> Result<TransactionReceipt, ChainError> {
        let value = to_wei(amount_ether)?;
        self.send(
            self.app_address,
            passenger,
            FlightSuretyApp::buyInsuranceCall {
                airline,
                flight: flight.to_string(),
                timestamp: U256::from(timestamp),
            },
            Some(value),
        )
        .await
    }

    /// Asks the oracles for a flight's status. The answer arrives later as a
    /// `FlightStatusInfo` event; the returned key identifies the request.
    pub async fn fetch_flight_status(
        &self,
        airline: Address,
        flight: &str,
        timestamp: u64,
    ) -> Result<FlightKey, ChainError> {
        self.send(
            self.app_address,
            self.owner(),
            FlightSuretyApp::fetchFlightStatusCall {
                airline,
                flight: flight.to_string(),
                timestamp: U256::from(timestamp),
            },
            None,
        )
        .await?;

        Ok(FlightKey {
            airline,
            flight: flight.to_string(),
            timestamp,
        })
    }

    /// Credit owed to a passenger, in wei.
    pub async fn get_balance(&self, passenger: Address) -> Result<U256, ChainError> {
        let ret = self
            .call(
                self.app_address,
                passenger,
                FlightSuretyApp::getPassengerCreditCall { passenger },
            )
            .await?;
        Ok(ret._0)
    }

    pub async fn withdraw_funds(
        &self,
        passenger: Address,
        amount_ether: &str,
    ) -> Result<TransactionReceipt, ChainError> {
        let amount = to_wei(amount_ether)?;
        self.send(
            self.app_address,
            passenger,
            FlightSuretyApp::withdrawCreditCall { amount },
            None,
        )
        .await
    }

    /// Pays `amount_ether` into the airline's funding from the airline's own
    /// account.
    pub async fn send_funds(
        &self,
        airline: Address,
        amount_ether: &str,
    ) -> Result<TransactionReceipt, ChainError> {
        let value = to_wei(amount_ether)?;
        self.send(
            self.app_address,
            airline,
            FlightSuretyApp::fundAirlineCall {},
            Some(value),
        )
        .await
    }

    pub async fn existing_airlines(&self) -> Result<Vec<Address>, ChainError> {
        let ret = self
            .call(
                self.app_address,
                self.owner(),
                FlightSuretyApp::getExistingAirlinesCall {},
            )
            .await?;
        Ok(ret._0)
    }

    /// Funding an airline has provided, in wei.
    pub async fn airline_funds(&self, airline: Address) -> Result<U256, ChainError> {
        let ret = self
            .call(
                self.app_address,
                self.owner(),
                FlightSuretyApp::getAirlineFundsCall { airline },
            )
            .await?;
        Ok(ret._0)
    }

    pub async fn registration_fee(&self) -> Result<U256, ChainError> {
        let ret = self
            .call(
                self.app_address,
                self.owner(),
                FlightSuretyApp::REGISTRATION_FEECall {},
            )
            .await?;
        Ok(ret._0)
    }

    pub async fn register_oracle(
        &self,
        oracle: Address,
        fee: U256,
    ) -> Result<TransactionReceipt, ChainError> {
        self.send(
            self.app_address,
            oracle,
            FlightSuretyApp::registerOracleCall {},
            Some(fee),
        )
        .await
    }

    pub async fn oracle_indexes(&self, oracle: Address) -> Result<OracleIndexes, ChainError> {
        let ret = self
            .call(self.app_address, oracle, FlightSuretyApp::getMyIndexesCall {})
            .await?;
        Ok(ret._0)
    }

    /// App-contract events from genesis onward.
    pub fn events(&self, source: EventSource) -> ContractEvents
    where
        T: 'static,
    {
        use alloy_sol_types::SolEvent;

        let filter = LogFilter::new(
            self.app_address,
            vec![
                FlightSuretyApp::OracleRequest::SIGNATURE_HASH,
                FlightSuretyApp::FlightStatusInfo::SIGNATURE_HASH,
            ],
        );
        ContractEvents {
            logs: LogSubscription::spawn(Arc::clone(&self.client), filter, source),
        }
    }

    // ===== FlightSuretyData =====

    /// Lets the app contract call into the data contract.
    pub async fn authorize_caller(&self, caller: Address) -> Result<TransactionReceipt, ChainError> {
        self.send(
            self.data_address,
            self.owner(),
            FlightSuretyData::authorizeCallerCall { caller },
            None,
        )
        .await
    }

    pub async fn data_is_operational(&self) -> Result<bool, ChainError> {
        let ret = self
            .call(
                self.data_address,
                self.owner(),
                FlightSuretyData::isOperationalCall {},
            )
            .await?;
        Ok(ret._0)
    }

    pub async fn set_operating_status(
        &self,
        from: Address,
        mode: bool,
    ) -> Result<TransactionReceipt, ChainError> {
        self.send(
            self.data_address,
            from,
            FlightSuretyData::setOperatingStatusCall { mode },
            None,
        )
        .await
    }

    pub async fn is_registered(&self, airline: Address) -> Result<bool, ChainError> {
        let ret = self
            .call(
                self.data_address,
                self.owner(),
                FlightSuretyData::isRegisteredCall { airline },
            )
            .await?;
        Ok(ret._0)
    }

    // ===== Private Helper Methods =====

    async fn call<C: SolCall>(
        &self,
        to: Address,
        from: Address,
        call: C,
    ) -> Result<C::Return, ChainError> {
        let request = CallRequest::new(to, call.abi_encode()).from(from);
        let output = self.client.call(&request).await?;
        Ok(C::abi_decode_returns(&output, true)?)
    }

    async fn send<C: SolCall>(
        &self,
        to: Address,
        from: Address,
        call: C,
        value: Option<U256>,
    ) -> Result<TransactionReceipt, ChainError> {
        let mut request = CallRequest::new(to, call.abi_encode())
            .from(from)
            .gas(self.gas);
        if let Some(value) = value {
            request = request.value(value);
        }

        let receipt = self.client.send_transaction(&request).await?;
        tracing::debug!(
            function = C::SIGNATURE,
            %from,
            tx_hash = %receipt.transaction_hash,
            "contract transaction mined"
        );
        Ok(receipt)
    }
}

/// Decoded app-contract events.
pub struct ContractEvents {
    logs: LogSubscription,
}

impl ContractEvents {
    /// Next recognised event; `None` once the subscription has ended.
    pub async fn next(&mut self) -> Option<Result<ContractEvent, ChainError>> {
        loop {
            let log = match self.logs.next().await? {
                Ok(log) => log,
                Err(err) => return Some(Err(err)),
            };

            match ContractEvent::from_log(&log) {
                Ok(Some(event)) => return Some(Ok(event)),
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}
