//! In-memory event publisher
//!
//! Records every published event instead of talking to a broker. Partition
//! routing and per-partition offsets behave like the Kafka publisher, so
//! ordering properties can be checked without a cluster.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{Ack, EventPublisher, PublishError, encode_event, partition_for_key};
use crate::transfer::TransferRequest;

/// One event as it would have been written to the stream
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    pub key: String,
    pub value: Vec<u8>,
    pub partition: i32,
    pub offset: i64,
}

impl RecordedEvent {
    /// Decode the event value back into a request
    pub fn payload(&self) -> Result<TransferRequest, serde_json::Error> {
        serde_json::from_slice(&self.value)
    }
}

#[derive(Debug, Default)]
struct Log {
    events: Vec<RecordedEvent>,
    next_offsets: Vec<i64>,
}

#[derive(Debug)]
pub struct InMemoryPublisher {
    topic: String,
    partition_count: i32,
    log: Mutex<Log>,
    closed: AtomicBool,
    /// Configured behavior
    fail_send: AtomicBool,
    attempts: AtomicUsize,
}

impl InMemoryPublisher {
    pub fn new(topic: impl Into<String>, partition_count: i32) -> Self {
        let partition_count = partition_count.max(1);
        Self {
            topic: topic.into(),
            partition_count,
            log: Mutex::new(Log {
                events: Vec::new(),
                next_offsets: vec![0; partition_count as usize],
            }),
            closed: AtomicBool::new(false),
            fail_send: AtomicBool::new(false),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Make every following send fail as if the broker rejected it
    pub fn set_fail_send(&self, fail: bool) {
        self.fail_send.store(fail, Ordering::SeqCst);
    }

    /// Number of publish calls, successful or not
    pub fn attempt_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Snapshot of the recorded events in send order
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.log
            .lock()
            .map(|log| log.events.clone())
            .unwrap_or_default()
    }

    /// Recorded events for one key, in send order
    pub fn events_for_key(&self, key: &str) -> Vec<RecordedEvent> {
        self.events().into_iter().filter(|e| e.key == key).collect()
    }
}

#[async_trait]
impl EventPublisher for InMemoryPublisher {
    async fn publish(&self, key: &str, payload: &TransferRequest) -> Result<Ack, PublishError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self.is_closed() {
            return Err(PublishError::Closed);
        }
        let value = encode_event(payload)?;
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(PublishError::Send("simulated broker failure".to_string()));
        }

        let partition = partition_for_key(key, self.partition_count);
        let mut log = self
            .log
            .lock()
            .map_err(|_| PublishError::Send("event log poisoned".to_string()))?;
        let offset = log.next_offsets[partition as usize];
        log.next_offsets[partition as usize] += 1;
        log.events.push(RecordedEvent {
            key: key.to_string(),
            value,
            partition,
            offset,
        });

        tracing::debug!(
            topic = %self.topic,
            partition,
            offset,
            "Recorded event in memory"
        );

        Ok(Ack {
            topic: self.topic.clone(),
            partition,
            offset,
        })
    }

    async fn close(&self) -> Result<(), PublishError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn topic(&self) -> &str {
        &self.topic
    }
}
