//! Background services run by the oracle server

pub mod oracle_service;

pub use oracle_service::{relay_oracle_requests, OracleBootstrapper};
