//! HTTP response bodies
//!
//! Field names are part of the public contract: `message` + `status` on
//! success, `error` on failure.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Returned for every publish failure; details stay in the server logs
pub const GENERIC_FAILURE: &str = "Failed to process request";

pub const TRANSFER_INITIATED: &str = "Transfer initiated successfully";

/// 202 body: the transfer was published and awaits settlement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AcceptedResponse {
    #[schema(example = "Transfer initiated successfully")]
    pub message: String,
    #[schema(example = "pending")]
    pub status: String,
}

impl AcceptedResponse {
    pub fn pending() -> Self {
        Self {
            message: TRANSFER_INITIATED.to_string(),
            status: "pending".to_string(),
        }
    }
}

/// 4xx / 5xx body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "invalid transfer request: amount must be greater than 0")]
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Health check body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// "ok" or "unavailable"
    #[schema(example = "ok")]
    pub status: String,
    /// Stream the gateway publishes to
    #[schema(example = "transfer-requests")]
    pub topic: String,
}
