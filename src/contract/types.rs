//! Domain values exchanged with the FlightSurety contracts

use std::fmt;

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolEvent;
use serde::Serialize;

use crate::chain::abi::FlightSuretyApp;
use crate::chain::RawLog;
use crate::error::ChainError;

/// Status codes reported by oracles for a flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum FlightStatus {
    Unknown,
    OnTime,
    LateAirline,
    LateWeather,
    LateTechnical,
    LateOther,
    Unrecognized(u8),
}

impl FlightStatus {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Unknown,
            10 => Self::OnTime,
            20 => Self::LateAirline,
            30 => Self::LateWeather,
            40 => Self::LateTechnical,
            50 => Self::LateOther,
            other => Self::Unrecognized(other),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::OnTime => 10,
            Self::LateAirline => 20,
            Self::LateWeather => 30,
            Self::LateTechnical => 40,
            Self::LateOther => 50,
            Self::Unrecognized(code) => *code,
        }
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::OnTime => write!(f, "on time"),
            Self::LateAirline => write!(f, "late (airline)"),
            Self::LateWeather => write!(f, "late (weather)"),
            Self::LateTechnical => write!(f, "late (technical)"),
            Self::LateOther => write!(f, "late (other)"),
            Self::Unrecognized(code) => write!(f, "status {code}"),
        }
    }
}

/// Identifies one flight-status request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FlightKey {
    pub airline: Address,
    pub flight: String,
    pub timestamp: u64,
}

impl fmt::Display for FlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.flight, self.timestamp)
    }
}

/// The three indices the contract assigns to a registered oracle.
pub type OracleIndexes = [u8; 3];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OracleRequest {
    pub index: u8,
    pub key: FlightKey,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FlightStatusInfo {
    pub key: FlightKey,
    pub status: FlightStatus,
}

impl fmt::Display for FlightStatusInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.key.airline, self.key.flight, self.key.timestamp, self.status
        )
    }
}

/// Events emitted by FlightSuretyApp that the client reacts to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ContractEvent {
    OracleRequest(OracleRequest),
    FlightStatusInfo(FlightStatusInfo),
}

impl ContractEvent {
    /// Decodes a log emitted by the app contract. Logs with other
    /// signatures yield `None`.
    pub fn from_log(log: &RawLog) -> Result<Option<Self>, ChainError> {
        let Some(signature) = log.topics.first() else {
            return Ok(None);
        };
        let data = log.data_bytes()?;

        if *signature == FlightSuretyApp::OracleRequest::SIGNATURE_HASH {
            let event = FlightSuretyApp::OracleRequest::decode_raw_log(
                log.topics.iter().copied(),
                &data,
                true,
            )?;
            return Ok(Some(Self::OracleRequest(OracleRequest {
                index: event.index,
                key: FlightKey {
                    airline: event.airline,
                    flight: event.flight,
                    timestamp: timestamp_from(event.timestamp)?,
                },
            })));
        }

        if *signature == FlightSuretyApp::FlightStatusInfo::SIGNATURE_HASH {
            let event = FlightSuretyApp::FlightStatusInfo::decode_raw_log(
                log.topics.iter().copied(),
                &data,
                true,
            )?;
            return Ok(Some(Self::FlightStatusInfo(FlightStatusInfo {
                key: FlightKey {
                    airline: event.airline,
                    flight: event.flight,
                    timestamp: timestamp_from(event.timestamp)?,
                },
                status: FlightStatus::from_code(event.status),
            })));
        }

        Ok(None)
    }
}

fn timestamp_from(value: U256) -> Result<u64, ChainError> {
    u64::try_from(value)
        .map_err(|_| ChainError::invalid_response(format!("timestamp {value} out of range")))
}
