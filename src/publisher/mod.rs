//! Event publishing
//!
//! [`EventPublisher`] is the seam between the ingestion gate and the broker:
//! - [`kafka::KafkaPublisher`]: production, acks=all produce to Kafka
//! - [`memory::InMemoryPublisher`]: records events in memory (tests, dry runs)
//!
//! Both route an event to a partition with [`partition_for_key`], so events
//! sharing a key land on one partition and keep their send order.

pub mod kafka;
pub mod memory;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::transfer::TransferRequest;

pub use kafka::KafkaPublisher;
pub use memory::InMemoryPublisher;

/// Broker acknowledgment of a durable write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

#[derive(Debug, Error)]
pub enum PublishError {
    /// Payload could not be encoded. Data error, retrying will not help.
    #[error("failed to serialize event payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Broker rejected the write or the network failed
    #[error("broker send failed: {0}")]
    Send(String),

    /// No acknowledgment within the configured bound. The write may still land.
    #[error("no broker acknowledgment within {0} ms")]
    Timeout(u64),

    #[error("publisher is closed")]
    Closed,
}

impl PublishError {
    /// Whether the caller may safely resubmit the same request
    pub fn is_retryable(&self) -> bool {
        !matches!(self, PublishError::Serialization(_))
    }
}

/// Publishes transfer events to an ordered, durable stream.
///
/// Implementations must be safe to share across concurrent requests
/// without external locking.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Send `payload` keyed by `key` and wait for the broker acknowledgment.
    ///
    /// Never retries internally.
    async fn publish(&self, key: &str, payload: &TransferRequest) -> Result<Ack, PublishError>;

    /// Release the broker connection. Later publishes fail with
    /// [`PublishError::Closed`]. Calling it twice is a no-op.
    async fn close(&self) -> Result<(), PublishError>;

    fn is_closed(&self) -> bool;

    /// Stream (topic) this publisher writes to
    fn topic(&self) -> &str;
}

/// Encode a transfer as the event value: JSON with the five request fields.
pub fn encode_event(payload: &TransferRequest) -> Result<Vec<u8>, PublishError> {
    Ok(serde_json::to_vec(payload)?)
}

/// Map a key to a partition: FNV-1a (32 bit) of the key bytes modulo the
/// partition count, made non-negative.
///
/// Same scheme as the common Kafka client hash partitioners, so keys stay
/// on the same partition as producers written against those clients.
pub fn partition_for_key(key: &str, partition_count: i32) -> i32 {
    if partition_count <= 1 {
        return 0;
    }
    let p = (fnv1a_32(key.as_bytes()) as i32) % partition_count;
    p.abs()
}

fn fnv1a_32(bytes: &[u8]) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;

    bytes.iter().fold(OFFSET_BASIS, |hash, b| {
        (hash ^ u32::from(*b)).wrapping_mul(PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fnv1a_known_vectors() {
        assert_eq!(fnv1a_32(b""), 0x811c_9dc5);
        assert_eq!(fnv1a_32(b"a"), 0xe40c_292c);
        assert_eq!(fnv1a_32(b"foobar"), 0xbf9c_f968);
    }

    #[test]
    fn test_partition_is_stable_and_in_range() {
        for key in ["tx-1", "tx-2", "some-much-longer-idempotency-key", ""] {
            let p = partition_for_key(key, 12);
            assert!((0..12).contains(&p));
            assert_eq!(p, partition_for_key(key, 12));
        }
    }

    #[test]
    fn test_single_partition_topic() {
        assert_eq!(partition_for_key("tx-1", 1), 0);
        assert_eq!(partition_for_key("tx-1", 0), 0);
    }

    #[test]
    fn test_encode_event_field_set() {
        let req = TransferRequest {
            idempotency_key: "tx-1".to_string(),
            source_account: "A".to_string(),
            target_account: "B".to_string(),
            amount: dec!(100.50),
            currency: "USD".to_string(),
        };
        let bytes = encode_event(&req).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let obj = value.as_object().unwrap();

        assert_eq!(obj.len(), 5);
        assert_eq!(obj["idempotency_key"], "tx-1");
        assert_eq!(obj["source_account"], "A");
        assert_eq!(obj["target_account"], "B");
        assert_eq!(obj["amount"], 100.5);
        assert_eq!(obj["currency"], "USD");

        let decoded: TransferRequest = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(PublishError::Send("broker down".into()).is_retryable());
        assert!(PublishError::Timeout(10_000).is_retryable());
        assert!(PublishError::Closed.is_retryable());

        let bad = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(!PublishError::Serialization(bad).is_retryable());
    }
}
