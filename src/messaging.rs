//! Publishing of order events.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::events::OrderEvent;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("could not encode event: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &OrderEvent) -> Result<(), PublishError>;
}

/// Publishes JSON-encoded events on NATS, one subject per event kind.
pub struct NatsPublisher {
    client: async_nats::Client,
}

impl NatsPublisher {
    pub fn new(client: async_nats::Client) -> Self { Self { client } }

    pub async fn connect(url: &str) -> Result<Self, PublishError> {
        let client = async_nats::connect(url).await.map_err(|e| PublishError::Transport(e.to_string()))?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl EventPublisher for NatsPublisher {
    async fn publish(&self, event: &OrderEvent) -> Result<(), PublishError> {
        let payload = serde_json::to_vec(event)?;
        self.client
            .publish(event.subject().to_string(), payload.into())
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))
    }
}

/// Used when no broker is configured.
#[derive(Debug, Default)]
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish(&self, event: &OrderEvent) -> Result<(), PublishError> {
        debug!(subject = event.subject(), "no broker configured, dropping event");
        Ok(())
    }
}

/// Keeps published events in memory.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<OrderEvent>>,
    fail: bool,
}

impl RecordingPublisher {
    pub fn new() -> Self { Self::default() }

    /// A publisher whose every publish fails.
    pub fn failing() -> Self { Self { events: Mutex::default(), fail: true } }

    pub async fn events(&self) -> Vec<OrderEvent> { self.events.lock().await.clone() }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &OrderEvent) -> Result<(), PublishError> {
        if self.fail {
            return Err(PublishError::Transport("broker unreachable".into()));
        }
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}
