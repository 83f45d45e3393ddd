//! Keeps the view model in step with façade calls and contract events

use std::sync::Arc;

use alloy_primitives::Address;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::directory::Directories;
use super::view::{ResultRow, SelectId, SelectOption, ViewModel};
use super::ActionError;
use crate::chain::units::from_wei;
use crate::chain::{RpcTransport, TransactionReceipt};
use crate::contract::{ContractEvent, FlightKey, FlightSuretyContract};

/// Free-text inputs of the form. Selections live in the view model.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FormState {
    pub fund_amount: String,
    pub insurance_amount: String,
    pub withdraw_amount: String,
    pub purchase_date: String,
    pub status_date: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputField {
    FundAmount,
    InsuranceAmount,
    WithdrawAmount,
    PurchaseDate,
    StatusDate,
}

/// The four lists that show registered airlines.
const REGISTERED_AIRLINE_LISTS: [SelectId; 4] = [
    SelectId::RegisteredAirline,
    SelectId::InsuredAirline,
    SelectId::FundingAirline,
    SelectId::StatusAirline,
];

pub struct UiController<T> {
    contract: Arc<FlightSuretyContract<T>>,
    directories: Directories,
    form: FormState,
    view: ViewModel,
}

impl<T: RpcTransport> UiController<T> {
    pub fn new(contract: Arc<FlightSuretyContract<T>>, directories: Directories) -> Self {
        Self {
            contract,
            directories,
            form: FormState::default(),
            view: ViewModel::default(),
        }
    }

    pub fn view(&self) -> &ViewModel {
        &self.view
    }

    pub fn set_input(&mut self, field: InputField, value: impl Into<String>) {
        let value = value.into();
        match field {
            InputField::FundAmount => self.form.fund_amount = value,
            InputField::InsuranceAmount => self.form.insurance_amount = value,
            InputField::WithdrawAmount => self.form.withdraw_amount = value,
            InputField::PurchaseDate => self.form.purchase_date = value,
            InputField::StatusDate => self.form.status_date = value,
        }
    }

    /// Initial fetch: operating status, registered airlines, funding,
    /// passenger lists and balance.
    pub async fn load(&mut self) {
        let operational = self.contract.is_operational().await;
        if let Ok(flag) = operational {
            self.view.operational = Some(flag);
        }
        self.view.display(
            "Operational Status",
            "Check if contract is operational",
            vec![ResultRow::from_result("Operational Status", &operational)],
        );

        if self.refresh_airlines().await {
            self.refresh_funding().await;
        }

        let passengers: Vec<SelectOption> = self
            .directories
            .passengers
            .iter()
            .map(|(address, name)| SelectOption::new(address.to_string(), name.clone()))
            .collect();
        self.view
            .select_list_mut(SelectId::InsuredPassengers)
            .populate(passengers.clone());
        self.view
            .select_list_mut(SelectId::Passengers)
            .populate(passengers);

        if let Err(err) = self.refresh_balance().await {
            tracing::warn!(error = %err, "failed to load passenger balance");
        }
    }

    /// Reacts to an app-contract event.
    pub async fn apply_event(&mut self, event: &ContractEvent) {
        match event {
            ContractEvent::FlightStatusInfo(info) => {
                tracing::info!(flight = %info.key.flight, status = %info.status, "flight status resolved");
                let shown: Result<String, ActionError> = Ok(info.to_string());
                self.view.display(
                    "Oracles",
                    "Trigger oracles",
                    vec![ResultRow::from_result("Fetch Flight Status", &shown)],
                );
                if let Err(err) = self.refresh_balance().await {
                    tracing::warn!(error = %err, "failed to refresh balance after flight status");
                }
            }
            ContractEvent::OracleRequest(request) => {
                tracing::debug!(index = request.index, flight = %request.key.flight, "oracle request observed");
            }
        }
    }

    /// Change handler for a select list.
    pub async fn select(&mut self, id: SelectId, value: &str) -> Result<(), ActionError> {
        if !self.view.select_list_mut(id).select(value) {
            return Err(ActionError::UnknownOption {
                list: id,
                value: value.to_string(),
            });
        }

        match id {
            SelectId::InsuredAirline => {
                self.populate_flights(SelectId::InsuredAirline, SelectId::InsuredFlight)
            }
            SelectId::StatusAirline => {
                self.populate_flights(SelectId::StatusAirline, SelectId::StatusFlight)
            }
            SelectId::FundingAirline => self.refresh_funding().await,
            SelectId::InsuredPassengers => {
                if let Err(err) = self.refresh_balance().await {
                    self.view.display(
                        "Withdraw",
                        "Withdraw funds",
                        vec![ResultRow::from_result("Get Balance", &Err::<String, _>(err))],
                    );
                    self.view.balance = Some("0".to_string());
                }
            }
            _ => {}
        }

        Ok(())
    }

    pub async fn register_airline(&mut self) -> Result<TransactionReceipt, ActionError> {
        let result = self.try_register_airline().await;
        self.view.display(
            "Airlines",
            "Register Airline",
            vec![ResultRow::from_result("Register Airline", &result)],
        );
        // Repopulating resets the funding selection to the first airline.
        if result.is_ok() && self.refresh_airlines().await {
            self.refresh_funding().await;
        }
        result
    }

    pub async fn fund_airline(&mut self) -> Result<TransactionReceipt, ActionError> {
        let result = self.try_fund_airline().await;
        self.view.display(
            "Airline Funding",
            "Send Funds",
            vec![ResultRow::from_result("Send Funds", &result)],
        );
        if result.is_ok() {
            self.refresh_funding().await;
        }
        result
    }

    pub async fn purchase_insurance(&mut self) -> Result<TransactionReceipt, ActionError> {
        let result = self.try_purchase_insurance().await;
        self.view.display(
            "Insurance",
            "Purchase Insurance",
            vec![ResultRow::from_result("Purchase Insurance", &result)],
        );
        if result.is_ok() {
            if let Err(err) = self.refresh_balance().await {
                tracing::warn!(error = %err, "failed to refresh balance after purchase");
            }
        }
        result
    }

    pub async fn withdraw_funds(&mut self) -> Result<TransactionReceipt, ActionError> {
        let result = self.try_withdraw_funds().await;
        self.view.display(
            "Withdraw",
            "Withdraw Funds",
            vec![ResultRow::from_result("Withdraw Funds", &result)],
        );
        if result.is_ok() {
            if let Err(err) = self.refresh_balance().await {
                tracing::warn!(error = %err, "failed to refresh balance after withdrawal");
            }
        }
        result
    }

    /// Triggers an oracle request. The outcome shows up later through
    /// [`apply_event`](Self::apply_event).
    pub async fn fetch_flight_status(&mut self) -> Result<FlightKey, ActionError> {
        let result = self.try_fetch_flight_status().await;
        self.view.display(
            "Oracles",
            "Trigger oracles",
            vec![ResultRow::from_result("Fetch Flight Status", &result)],
        );
        result
    }

    // ===== Private Helper Methods =====

    async fn try_register_airline(&self) -> Result<TransactionReceipt, ActionError> {
        let from = self.selected_address(SelectId::RegisteredAirline)?;
        let airline = self.selected_address(SelectId::AirlineAddress)?;
        tracing::info!(%from, %airline, "registering airline");
        Ok(self.contract.register_airline(from, airline).await?)
    }

    async fn try_fund_airline(&self) -> Result<TransactionReceipt, ActionError> {
        let airline = self.selected_address(SelectId::FundingAirline)?;
        Ok(self
            .contract
            .send_funds(airline, &self.form.fund_amount)
            .await?)
    }

    async fn try_purchase_insurance(&self) -> Result<TransactionReceipt, ActionError> {
        let airline = self.selected_address(SelectId::InsuredAirline)?;
        let flight = self.selected_value(SelectId::InsuredFlight)?;
        let passenger = self.selected_address(SelectId::Passengers)?;
        let timestamp = parse_timestamp(&self.form.purchase_date)?;
        tracing::info!(%passenger, %flight, timestamp, "purchasing insurance");
        Ok(self
            .contract
            .purchase_insurance(
                airline,
                &flight,
                passenger,
                &self.form.insurance_amount,
                timestamp,
            )
            .await?)
    }

    async fn try_withdraw_funds(&self) -> Result<TransactionReceipt, ActionError> {
        let passenger = self.selected_address(SelectId::InsuredPassengers)?;
        Ok(self
            .contract
            .withdraw_funds(passenger, &self.form.withdraw_amount)
            .await?)
    }

    async fn try_fetch_flight_status(&self) -> Result<FlightKey, ActionError> {
        let airline = self.selected_address(SelectId::StatusAirline)?;
        let flight = self.selected_value(SelectId::StatusFlight)?;
        let timestamp = parse_timestamp(&self.form.status_date)?;
        Ok(self
            .contract
            .fetch_flight_status(airline, &flight, timestamp)
            .await?)
    }

    /// Re-reads the registered airlines and repopulates every list derived
    /// from them. Returns false when the read failed and nothing changed.
    async fn refresh_airlines(&mut self) -> bool {
        let registered = match self.contract.existing_airlines().await {
            Ok(registered) => registered,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load registered airlines");
                let failed: Result<String, _> = Err(err);
                self.view.display(
                    "Airlines",
                    "Load registered airlines",
                    vec![ResultRow::from_result("Registered Airlines", &failed)],
                );
                return false;
            }
        };

        let options: Vec<SelectOption> = registered
            .iter()
            .map(|address| {
                let name = self
                    .directories
                    .airlines
                    .name(address)
                    .map(ToString::to_string)
                    .unwrap_or_else(|| address.to_string());
                SelectOption::new(address.to_string(), name)
            })
            .collect();
        for id in REGISTERED_AIRLINE_LISTS {
            self.view.select_list_mut(id).populate(options.clone());
        }

        let unregistered: Vec<SelectOption> = self
            .directories
            .airlines
            .iter()
            .filter(|(address, _)| !registered.contains(address))
            .map(|(address, name)| SelectOption::new(address.to_string(), name.clone()))
            .collect();
        self.view
            .select_list_mut(SelectId::AirlineAddress)
            .populate(unregistered);

        self.populate_flights(SelectId::InsuredAirline, SelectId::InsuredFlight);
        self.populate_flights(SelectId::StatusAirline, SelectId::StatusFlight);
        true
    }

    fn populate_flights(&mut self, airline_list: SelectId, flight_list: SelectId) {
        let flights: Vec<SelectOption> = self
            .view
            .selected(airline_list)
            .and_then(|value| value.parse::<Address>().ok())
            .map(|airline| {
                self.directories
                    .flights_of(&airline)
                    .iter()
                    .map(|flight| SelectOption::new(flight.clone(), flight.clone()))
                    .collect()
            })
            .unwrap_or_default();
        self.view.select_list_mut(flight_list).populate(flights);
    }

    async fn refresh_funding(&mut self) {
        let Ok(airline) = self.selected_address(SelectId::FundingAirline) else {
            return;
        };

        match self.contract.airline_funds(airline).await {
            Ok(funds) => self.view.funding = Some(from_wei(funds)),
            Err(err) => {
                tracing::warn!(error = %err, %airline, "failed to read airline funding");
                let failed: Result<String, _> = Err(err);
                self.view.display(
                    "Airline Funding",
                    "Get Funds",
                    vec![ResultRow::from_result("Airline Funds", &failed)],
                );
            }
        }
    }

    /// Re-reads the selected insured passenger's credit. The cached balance
    /// is left untouched on failure.
    async fn refresh_balance(&mut self) -> Result<(), ActionError> {
        let passenger = self.selected_address(SelectId::InsuredPassengers)?;
        let credit = self.contract.get_balance(passenger).await?;
        self.view.balance = Some(from_wei(credit));
        Ok(())
    }

    fn selected_value(&self, id: SelectId) -> Result<String, ActionError> {
        self.view
            .selected(id)
            .map(ToString::to_string)
            .ok_or(ActionError::NothingSelected(id))
    }

    fn selected_address(&self, id: SelectId) -> Result<Address, ActionError> {
        let value = self.selected_value(id)?;
        value
            .parse()
            .map_err(|_| ActionError::InvalidAddress(value))
    }
}

/// Date-picker value to unix seconds. Plain dates are taken as UTC
/// midnight.
pub fn parse_timestamp(input: &str) -> Result<u64, ActionError> {
    let input = input.trim();
    let seconds = if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| ActionError::InvalidDate(input.to_string()))?;
        Utc.from_utc_datetime(&midnight).timestamp()
    } else {
        DateTime::parse_from_rfc3339(input)
            .map_err(|_| ActionError::InvalidDate(input.to_string()))?
            .timestamp()
    };

    u64::try_from(seconds).map_err(|_| ActionError::InvalidDate(input.to_string()))
}
