//! Ether/wei conversion for amounts typed into and shown by the UI

use alloy_primitives::utils::{format_ether, ParseUnits, Unit};
use alloy_primitives::U256;

use crate::error::ChainError;

/// Parses a decimal ether amount ("10", "0.5") into wei. Negative amounts
/// are rejected rather than wrapped.
pub fn to_wei(ether: &str) -> Result<U256, ChainError> {
    let ether = ether.trim();
    match ParseUnits::parse_units(ether, Unit::ETHER)? {
        ParseUnits::U256(wei) => Ok(wei),
        ParseUnits::I256(_) => Err(ChainError::NegativeAmount(ether.to_string())),
    }
}

/// Renders wei as ether without trailing zeros.
pub fn from_wei(wei: U256) -> String {
    let formatted = format_ether(wei);
    match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                whole.to_string()
            } else {
                format!("{whole}.{fraction}")
            }
        }
        None => formatted,
    }
}
