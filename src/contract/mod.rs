//! Contract façade: UI-level operations mapped onto FlightSurety contract
//! calls.

pub mod facade;
pub mod types;

pub use facade::{ContractEvents, FlightSuretyContract};
pub use types::{
    ContractEvent, FlightKey, FlightStatus, FlightStatusInfo, OracleIndexes, OracleRequest,
};
