//! Transfer Gateway - fund-transfer ingestion service
//!
//! Accepts transfer requests over HTTP, validates them, and publishes each
//! one as an acknowledged, keyed event for asynchronous settlement.
//!
//! # Modules
//!
//! - [`transfer`] - Request types and validation
//! - [`publisher`] - Event publisher trait, Kafka and in-memory implementations
//! - [`bootstrap`] - Startup broker connection with bounded retry
//! - [`ingest`] - Ingestion gate (validate → publish → outcome)
//! - [`gateway`] - axum HTTP surface
//! - [`config`] - YAML + environment configuration
//! - [`logging`] - tracing subscriber setup

pub mod bootstrap;
pub mod config;
pub mod gateway;
pub mod ingest;
pub mod logging;
pub mod publisher;
pub mod transfer;

// Convenient re-exports at crate root
pub use bootstrap::{BootstrapError, RetryPolicy, connect_with_retry};
pub use config::{AppConfig, ConfigError};
pub use ingest::{IngestOutcome, IngestState, IngestionGate};
pub use publisher::{
    Ack, EventPublisher, InMemoryPublisher, KafkaPublisher, PublishError, partition_for_key,
};
pub use transfer::{RawTransferRequest, TransferRequest, ValidationErrors, validate_transfer};
