use std::sync::Arc;

use crate::ingest::IngestionGate;
use crate::publisher::EventPublisher;

/// Gateway application state (shared by all handlers)
#[derive(Clone)]
pub struct AppState {
    /// Validate-then-publish pipeline
    pub gate: IngestionGate,
}

impl AppState {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            gate: IngestionGate::new(publisher),
        }
    }

    pub fn publisher(&self) -> &Arc<dyn EventPublisher> {
        self.gate.publisher()
    }
}
