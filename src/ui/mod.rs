//! UI controller: form state, cached directories and the rendered view
//! model, driven by user actions and contract events.

pub mod controller;
pub mod directory;
pub mod view;

use thiserror::Error;

use crate::error::ChainError;

pub use controller::{parse_timestamp, FormState, InputField, UiController};
pub use directory::{AirlineDirectory, Directories, FlightCatalog, PassengerDirectory};
pub use view::{ResultRow, ResultSection, RowOutcome, SelectId, SelectList, SelectOption, ViewModel};

/// Why a UI action did not reach or did not succeed on the contract.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("no {0} selected")]
    NothingSelected(SelectId),

    #[error("'{value}' is not an option of {list}")]
    UnknownOption { list: SelectId, value: String },

    #[error("invalid address '{0}'")]
    InvalidAddress(String),

    #[error("invalid date '{0}'")]
    InvalidDate(String),

    #[error(transparent)]
    Chain(#[from] ChainError),
}
