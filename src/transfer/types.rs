//! Transfer request types
//!
//! - `RawTransferRequest`: HTTP body as received, every field optional
//! - `TransferRequest`: validated request, also the event payload on the wire

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============================================================================
// RawTransferRequest: HTTP Request Deserialization
// ============================================================================

/// Transfer request exactly as the caller sent it.
///
/// Fields are optional so that a missing field becomes a validation
/// violation rather than a JSON error. `amount` is kept as a raw JSON value
/// so that "present but not numeric" can be reported per field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTransferRequest {
    #[serde(default)]
    pub idempotency_key: Option<String>,
    #[serde(default)]
    pub source_account: Option<String>,
    #[serde(default)]
    pub target_account: Option<String>,
    #[serde(default)]
    pub amount: Option<serde_json::Value>,
    #[serde(default)]
    pub currency: Option<String>,
}

// ============================================================================
// TransferRequest: Validated Request / Event Payload
// ============================================================================

/// A transfer request that passed validation.
///
/// Only [`crate::transfer::validate_transfer`] constructs this type from
/// caller input, so holding one means every field constraint holds. The
/// serialized form is the event value published to the stream: the same
/// five fields, `amount` encoded as a JSON number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TransferRequest {
    /// Caller-supplied id of one logical transfer attempt; also the partition key
    #[schema(example = "tx-1")]
    pub idempotency_key: String,
    #[schema(example = "A")]
    pub source_account: String,
    #[schema(example = "B")]
    pub target_account: String,
    /// Strictly positive
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 100.50)]
    pub amount: Decimal,
    /// ISO-4217 style code, exactly 3 characters
    #[schema(example = "USD")]
    pub currency: String,
}
