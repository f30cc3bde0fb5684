//! Ingestion gate: validate, publish, report.
//!
//! ```text
//! Received ──▶ Validated ──▶ Published ──▶ Acknowledged
//!    │              │
//!    ▼              ▼
//! Rejected     PublishFailed
//! ```
//!
//! Linear per request. The gate never retries: resubmitting is the caller's
//! call, and is safe because consumers deduplicate on the idempotency key.

use std::sync::Arc;

use crate::publisher::{Ack, EventPublisher, PublishError};
use crate::transfer::{RawTransferRequest, ValidationErrors, validate_transfer};

/// Request lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IngestState {
    Received,
    Validated,
    Published,
    /// Terminal: broker acknowledged the event
    Acknowledged,
    /// Terminal: request failed validation, nothing published
    Rejected,
    /// Terminal: publish failed, request not accepted
    PublishFailed,
}

impl IngestState {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            IngestState::Acknowledged | IngestState::Rejected | IngestState::PublishFailed
        )
    }

    /// Whether `self -> next` is an allowed step
    pub fn can_transition_to(&self, next: IngestState) -> bool {
        use IngestState::*;
        matches!(
            (self, next),
            (Received, Validated)
                | (Received, Rejected)
                | (Validated, Published)
                | (Validated, PublishFailed)
                | (Published, Acknowledged)
        )
    }
}

/// Terminal result of one request
#[derive(Debug)]
pub enum IngestOutcome {
    Accepted(Ack),
    Rejected(ValidationErrors),
    PublishFailed(PublishError),
}

impl IngestOutcome {
    pub fn state(&self) -> IngestState {
        match self {
            IngestOutcome::Accepted(_) => IngestState::Acknowledged,
            IngestOutcome::Rejected(_) => IngestState::Rejected,
            IngestOutcome::PublishFailed(_) => IngestState::PublishFailed,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, IngestOutcome::Accepted(_))
    }
}

/// Orchestrates validator and publisher for each inbound request.
///
/// Cheap to clone; clones share the publisher.
#[derive(Clone)]
pub struct IngestionGate {
    publisher: Arc<dyn EventPublisher>,
}

impl IngestionGate {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }

    pub fn publisher(&self) -> &Arc<dyn EventPublisher> {
        &self.publisher
    }

    /// Run one request to a terminal state.
    pub async fn submit(&self, raw: RawTransferRequest) -> IngestOutcome {
        let mut state = IngestState::Received;

        let request = match validate_transfer(raw) {
            Ok(req) => req,
            Err(errors) => {
                advance(&mut state, IngestState::Rejected);
                tracing::warn!(error = %errors, "Invalid request payload");
                return IngestOutcome::Rejected(errors);
            }
        };
        advance(&mut state, IngestState::Validated);

        let key = request.idempotency_key.as_str();
        match self.publisher.publish(key, &request).await {
            Ok(ack) => {
                advance(&mut state, IngestState::Published);
                advance(&mut state, IngestState::Acknowledged);
                tracing::info!(
                    idempotency_key = key,
                    partition = ack.partition,
                    offset = ack.offset,
                    "Transfer accepted"
                );
                IngestOutcome::Accepted(ack)
            }
            Err(e) => {
                advance(&mut state, IngestState::PublishFailed);
                tracing::error!(
                    idempotency_key = key,
                    error = %e,
                    retryable = e.is_retryable(),
                    "Failed to publish event"
                );
                IngestOutcome::PublishFailed(e)
            }
        }
    }
}

fn advance(state: &mut IngestState, next: IngestState) {
    debug_assert!(
        state.can_transition_to(next),
        "illegal ingest transition {:?} -> {:?}",
        state,
        next
    );
    tracing::trace!(from = ?state, to = ?next, "ingest state");
    *state = next;
}
