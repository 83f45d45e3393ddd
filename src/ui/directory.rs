//! Lookup tables the front-end builds once at startup

use std::collections::BTreeMap;

use alloy_primitives::Address;

use crate::config::SeedConfig;

/// Account index the seeded airlines start from; account 0 is the owner.
const FIRST_SEED_ACCOUNT: usize = 1;

/// Address → display name, in seed order.
#[derive(Clone, Debug, Default)]
pub struct AirlineDirectory {
    entries: Vec<(Address, String)>,
}

impl AirlineDirectory {
    pub fn name(&self, address: &Address) -> Option<&str> {
        self.entries
            .iter()
            .find(|(a, _)| a == address)
            .map(|(_, name)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Address, String)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Airline name → flight numbers. Client-defined, never read from chain.
#[derive(Clone, Debug, Default)]
pub struct FlightCatalog {
    flights: BTreeMap<String, Vec<String>>,
}

impl FlightCatalog {
    pub fn flights(&self, airline_name: &str) -> &[String] {
        self.flights
            .get(airline_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, Default)]
pub struct PassengerDirectory {
    entries: Vec<(Address, String)>,
}

impl PassengerDirectory {
    pub fn iter(&self) -> impl Iterator<Item = &(Address, String)> {
        self.entries.iter()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Directories {
    pub airlines: AirlineDirectory,
    pub flights: FlightCatalog,
    pub passengers: PassengerDirectory,
}

impl Directories {
    /// Resolves seed entries to addresses. Entries without a fixed address
    /// take node accounts in order from account 1: airlines first, then
    /// passengers. Entries left without an account are skipped.
    pub fn from_seed(seed: &SeedConfig, accounts: &[Address]) -> Self {
        let mut next_account = accounts.iter().skip(FIRST_SEED_ACCOUNT).copied();
        let mut directories = Self::default();

        for airline in &seed.airlines {
            let Some(address) = airline.address.or_else(|| next_account.next()) else {
                tracing::warn!(airline = %airline.name, "no account left for seeded airline");
                continue;
            };
            directories
                .airlines
                .entries
                .push((address, airline.name.clone()));
            directories
                .flights
                .flights
                .insert(airline.name.clone(), airline.flights.clone());
        }

        for passenger in &seed.passengers {
            let Some(address) = passenger.address.or_else(|| next_account.next()) else {
                tracing::warn!(passenger = %passenger.name, "no account left for seeded passenger");
                continue;
            };
            directories
                .passengers
                .entries
                .push((address, passenger.name.clone()));
        }

        directories
    }

    /// Flights of the airline at `address`, looked up through its name.
    pub fn flights_of(&self, address: &Address) -> &[String] {
        self.airlines
            .name(address)
            .map(|name| self.flights.flights(name))
            .unwrap_or_default()
    }
}
