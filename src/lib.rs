//! FlightSurety client library
//!
//! Contract façade, UI view-model controller and oracle bootstrapper for the
//! FlightSurety flight-insurance contracts.

pub mod chain;
pub mod config;
pub mod contract;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod ui;
