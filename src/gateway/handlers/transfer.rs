//! Transfer submission handler

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use super::super::state::AppState;
use super::super::types::{AcceptedResponse, ErrorResponse, GENERIC_FAILURE};
use crate::ingest::IngestOutcome;
use crate::transfer::RawTransferRequest;

type TransferResult =
    Result<(StatusCode, Json<AcceptedResponse>), (StatusCode, Json<ErrorResponse>)>;

/// Submit a transfer
///
/// POST /api/v1/transfer
///
/// Validates the request and publishes it keyed by `idempotency_key`.
/// 202 means the broker acknowledged the event, not that funds moved.
#[utoipa::path(
    post,
    path = "/api/v1/transfer",
    request_body(content = crate::transfer::TransferRequest, content_type = "application/json"),
    responses(
        (status = 202, description = "Transfer accepted for settlement", body = AcceptedResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Event could not be published; safe to retry", body = ErrorResponse)
    ),
    tag = "Transfer"
)]
pub async fn submit_transfer(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RawTransferRequest>, JsonRejection>,
) -> TransferResult {
    // 1. Parse JSON
    let Json(raw) = payload.map_err(|e| {
        tracing::warn!(error = %e.body_text(), "Invalid request payload");
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(format!("Invalid JSON: {}", e.body_text()))),
        )
    })?;

    // 2. Validate + publish
    match state.gate.submit(raw).await {
        IngestOutcome::Accepted(_) => Ok((StatusCode::ACCEPTED, Json(AcceptedResponse::pending()))),
        IngestOutcome::Rejected(errors) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(errors.to_string())),
        )),
        // Detail already logged by the gate
        IngestOutcome::PublishFailed(_) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(GENERIC_FAILURE)),
        )),
    }
}
