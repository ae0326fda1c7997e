//! Outbound collaborators: supplier submission and order event publishing.
//!
//! Failures are returned to the caller as-is. Nothing here retries.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex;
use crate::domain::events::{EventEnvelope, OrderEvent};
use crate::supplier::SupplierSpec;

#[async_trait]
pub trait SupplierGateway: Send + Sync {
    async fn submit(&self, spec: &SupplierSpec) -> Result<(), GatewayError>;
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: OrderEvent) -> Result<(), GatewayError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("publish to `{subject}` failed: {reason}")]
    Publish { subject: String, reason: String },
}

/// Publishes supplier requests and events as JSON on NATS subjects under a common prefix.
#[derive(Clone)]
pub struct NatsPublisher {
    client: async_nats::Client,
    prefix: String,
}

impl NatsPublisher {
    pub fn new(client: async_nats::Client, prefix: impl Into<String>) -> Self { Self { client, prefix: prefix.into() } }

    pub fn supplier_subject(&self) -> String { format!("{}.supplier.requests", self.prefix) }

    async fn send(&self, subject: String, payload: Vec<u8>) -> Result<(), GatewayError> {
        self.client
            .publish(subject.clone(), payload.into())
            .await
            .map_err(|e| GatewayError::Publish { subject, reason: e.to_string() })
    }
}

#[async_trait]
impl SupplierGateway for NatsPublisher {
    async fn submit(&self, spec: &SupplierSpec) -> Result<(), GatewayError> {
        let subject = self.supplier_subject();
        self.send(subject.clone(), serde_json::to_vec(spec)?).await?;
        tracing::info!(order_id = %spec.order_id, %subject, lines = spec.line_items.len(), "supplier request published");
        Ok(())
    }
}

#[async_trait]
impl EventPublisher for NatsPublisher {
    async fn publish(&self, event: OrderEvent) -> Result<(), GatewayError> {
        let subject = format!("{}.{}", self.prefix, event.subject());
        let envelope = EventEnvelope::from(event);
        self.send(subject, serde_json::to_vec(&envelope)?).await?;
        tracing::debug!(event_id = %envelope.event_id, order_id = envelope.event.order_id(), "event published");
        Ok(())
    }
}

/// Used when no broker is configured: records outbound traffic through `tracing`
/// and keeps the last requests in memory for inspection.
#[derive(Clone, Default)]
pub struct LoggingPublisher {
    sent: Arc<Mutex<Vec<SupplierSpec>>>,
    events: Arc<Mutex<Vec<OrderEvent>>>,
}

impl LoggingPublisher {
    const RETAINED: usize = 256;

    pub fn new() -> Self { Self::default() }

    pub fn sent(&self) -> Vec<SupplierSpec> { self.sent.lock().map(|s| s.clone()).unwrap_or_default() }
    pub fn events(&self) -> Vec<OrderEvent> { self.events.lock().map(|e| e.clone()).unwrap_or_default() }

    fn retain<T>(buf: &Mutex<Vec<T>>, item: T) {
        if let Ok(mut buf) = buf.lock() {
            if buf.len() == Self::RETAINED { buf.remove(0); }
            buf.push(item);
        }
    }
}

#[async_trait]
impl SupplierGateway for LoggingPublisher {
    async fn submit(&self, spec: &SupplierSpec) -> Result<(), GatewayError> {
        tracing::info!(order_id = %spec.order_id, payload = %serde_json::to_string(spec)?, "supplier request (log only)");
        Self::retain(&self.sent, spec.clone());
        Ok(())
    }
}

#[async_trait]
impl EventPublisher for LoggingPublisher {
    async fn publish(&self, event: OrderEvent) -> Result<(), GatewayError> {
        tracing::info!(order_id = event.order_id(), subject = event.subject(), "order event (log only)");
        Self::retain(&self.events, event);
        Ok(())
    }
}
