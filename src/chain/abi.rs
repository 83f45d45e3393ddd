//! ABI surface of the deployed FlightSurety contracts

use alloy_sol_types::sol;

sol! {
    interface FlightSuretyApp {
        event OracleRequest(uint8 index, address airline, string flight, uint256 timestamp);
        event FlightStatusInfo(address airline, string flight, uint256 timestamp, uint8 status);

        function isOperational() external view returns (bool);

        function registerAirline(address airline) external;
        function fundAirline() external payable;
        function getExistingAirlines() external view returns (address[]);
        function getAirlineFunds(address airline) external view returns (uint256);

        function buyInsurance(address airline, string flight, uint256 timestamp) external payable;
        function getPassengerCredit(address passenger) external view returns (uint256);
        function withdrawCredit(uint256 amount) external;

        function fetchFlightStatus(address airline, string flight, uint256 timestamp) external;

        function REGISTRATION_FEE() external view returns (uint256);
        function registerOracle() external payable;
        function getMyIndexes() external view returns (uint8[3]);
    }

    interface FlightSuretyData {
        function isOperational() external view returns (bool);
        function setOperatingStatus(bool mode) external;
        function authorizeCaller(address caller) external;
        function isRegistered(address airline) external view returns (bool);
    }
}
