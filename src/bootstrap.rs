//! Connection bootstrap with bounded, fixed-delay retry
//!
//! The broker may come up after this service. Startup absorbs that race by
//! retrying a fixed number of times, then gives up for good: without a broker
//! connection the gateway must not accept traffic.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::config::KafkaConfig;
use crate::publisher::KafkaPublisher;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 15;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first, at least 1
    pub max_attempts: u32,
    /// Fixed wait between a failed attempt and the next one
    pub delay: Duration,
    /// Bound on a single attempt; `None` leaves it to the client
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
            attempt_timeout: None,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &KafkaConfig) -> Self {
        Self {
            max_attempts: config.connect_max_attempts.max(1),
            delay: Duration::from_millis(config.connect_retry_delay_ms),
            attempt_timeout: Some(Duration::from_millis(config.connect_attempt_timeout_ms)),
        }
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to connect to {endpoint} after {attempts} attempts: {last_error}")]
    Exhausted {
        endpoint: String,
        attempts: u32,
        last_error: String,
    },
}

/// Run `connect` until it succeeds or `policy.max_attempts` is used up.
///
/// `connect` receives the 1-based attempt number. There is no wait after
/// the final failed attempt.
pub async fn connect_with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    endpoint: &str,
    mut connect: F,
) -> Result<T, BootstrapError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        let outcome = match policy.attempt_timeout {
            Some(limit) => match tokio::time::timeout(limit, connect(attempt)).await {
                Ok(res) => res.map_err(|e| e.to_string()),
                Err(_) => Err(format!("attempt timed out after {} ms", limit.as_millis())),
            },
            None => connect(attempt).await.map_err(|e| e.to_string()),
        };

        match outcome {
            Ok(conn) => {
                tracing::info!(endpoint, attempt, "Connected");
                return Ok(conn);
            }
            Err(e) => {
                tracing::warn!(
                    endpoint,
                    attempt,
                    max_attempts,
                    error = %e,
                    "Connection attempt failed"
                );
                last_error = e;
            }
        }

        if attempt < max_attempts {
            tokio::time::sleep(policy.delay).await;
        }
    }

    tracing::error!(endpoint, attempts = max_attempts, error = %last_error, "Giving up on connection");
    Err(BootstrapError::Exhausted {
        endpoint: endpoint.to_string(),
        attempts: max_attempts,
        last_error,
    })
}

/// Connect the Kafka publisher, retrying per the configured policy.
pub async fn connect_kafka(config: &KafkaConfig) -> Result<KafkaPublisher, BootstrapError> {
    let policy = RetryPolicy::from_config(config);
    let ack_timeout = Duration::from_millis(config.ack_timeout_ms);
    let endpoint = format!("kafka[{}]", config.brokers.join(","));

    connect_with_retry(&policy, &endpoint, |_| {
        KafkaPublisher::connect(&config.brokers, &config.topic, ack_timeout)
    })
    .await
}
