//! API handlers for the oracle server

use axum::Json;

use crate::models::ApiMessage;

pub const API_MESSAGE: &str = "An API for use with your Dapp!";

/// Static acknowledgement that the server is up.
pub async fn api_root() -> Json<ApiMessage> {
    Json(ApiMessage {
        message: API_MESSAGE.to_string(),
    })
}
