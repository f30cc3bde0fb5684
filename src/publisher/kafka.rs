use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rskafka::client::partition::{Compression, PartitionClient, UnknownTopicHandling};
use rskafka::client::{Client, ClientBuilder};
use rskafka::record::Record;
use thiserror::Error;
use tokio::sync::RwLock;

use super::{Ack, EventPublisher, PublishError, encode_event, partition_for_key};
use crate::transfer::TransferRequest;

#[derive(Debug, Error)]
pub enum KafkaConnectError {
    #[error("kafka client error: {0}")]
    Client(#[from] rskafka::client::error::Error),

    #[error("topic '{0}' not found on the cluster")]
    TopicNotFound(String),

    #[error("topic '{0}' has no partitions")]
    NoPartitions(String),
}

/// Live broker connection: the client plus one partition client per
/// partition of the target topic, ordered by partition id.
struct Connection {
    _client: Client,
    partitions: Vec<(i32, Arc<PartitionClient>)>,
}

/// Kafka-backed [`EventPublisher`].
///
/// Produce requests wait for all in-sync replicas (`acks = all`). The
/// connection is created once by [`KafkaPublisher::connect`] and shared by
/// every concurrent `publish` call; partition clients synchronize internally.
pub struct KafkaPublisher {
    topic: String,
    ack_timeout: Duration,
    connection: RwLock<Option<Connection>>,
    closed: AtomicBool,
}

impl KafkaPublisher {
    /// Connect to the cluster and resolve the partitions of `topic`.
    ///
    /// A single attempt; retrying belongs to [`crate::bootstrap`].
    pub async fn connect(
        brokers: &[String],
        topic: &str,
        ack_timeout: Duration,
    ) -> Result<Self, KafkaConnectError> {
        let client = ClientBuilder::new(brokers.to_vec()).build().await?;

        let topics = client.list_topics().await?;
        let partition_ids = topics
            .into_iter()
            .find(|t| t.name == topic)
            .map(|t| t.partitions)
            .ok_or_else(|| KafkaConnectError::TopicNotFound(topic.to_string()))?;
        if partition_ids.is_empty() {
            return Err(KafkaConnectError::NoPartitions(topic.to_string()));
        }

        let mut partitions = Vec::with_capacity(partition_ids.len());
        for id in partition_ids {
            let partition_client = client
                .partition_client(topic.to_string(), id, UnknownTopicHandling::Error)
                .await?;
            partitions.push((id, Arc::new(partition_client)));
        }

        tracing::info!(
            topic,
            partitions = partitions.len(),
            "Successfully connected to Kafka"
        );

        Ok(Self {
            topic: topic.to_string(),
            ack_timeout,
            connection: RwLock::new(Some(Connection {
                _client: client,
                partitions,
            })),
            closed: AtomicBool::new(false),
        })
    }

    /// Pick the partition client for `key`
    async fn route(&self, key: &str) -> Result<(i32, Arc<PartitionClient>), PublishError> {
        let guard = self.connection.read().await;
        let conn = guard.as_ref().ok_or(PublishError::Closed)?;
        let idx = partition_for_key(key, conn.partitions.len() as i32) as usize;
        let (id, client) = &conn.partitions[idx];
        Ok((*id, Arc::clone(client)))
    }
}

#[async_trait]
impl EventPublisher for KafkaPublisher {
    async fn publish(&self, key: &str, payload: &TransferRequest) -> Result<Ack, PublishError> {
        if self.is_closed() {
            return Err(PublishError::Closed);
        }
        let value = encode_event(payload)?;
        let (partition, client) = self.route(key).await?;

        let record = Record {
            key: Some(key.as_bytes().to_vec()),
            value: Some(value),
            headers: BTreeMap::new(),
            timestamp: Utc::now(),
        };

        let produced = tokio::time::timeout(
            self.ack_timeout,
            client.produce(vec![record], Compression::NoCompression),
        )
        .await;

        let offsets = match produced {
            Ok(Ok(offsets)) => offsets,
            Ok(Err(e)) => {
                tracing::error!(topic = %self.topic, partition, error = %e, "Failed to send message to Kafka");
                return Err(PublishError::Send(e.to_string()));
            }
            Err(_) => {
                let ms = self.ack_timeout.as_millis() as u64;
                tracing::error!(topic = %self.topic, partition, timeout_ms = ms, "Kafka acknowledgment timed out");
                return Err(PublishError::Timeout(ms));
            }
        };

        let offset = offsets
            .first()
            .copied()
            .ok_or_else(|| PublishError::Send("broker returned no offset".to_string()))?;

        tracing::info!(topic = %self.topic, partition, offset, "Message sent to Kafka");

        Ok(Ack {
            topic: self.topic.clone(),
            partition,
            offset,
        })
    }

    async fn close(&self) -> Result<(), PublishError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        // In-flight publishes hold their own partition client and still complete
        self.connection.write().await.take();
        tracing::info!(topic = %self.topic, "Kafka publisher closed");
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn topic(&self) -> &str {
        &self.topic
    }
}
