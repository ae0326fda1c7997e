//! Domain events
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;
use crate::domain::aggregates::Order;
use crate::domain::lifecycle::{OrderStatus, PaymentStatus};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    #[serde(rename_all = "camelCase")]
    Placed {
        order_id: String,
        #[serde(rename = "totalUSD")]
        total_usd: Decimal,
        item_count: u32,
    },
    #[serde(rename_all = "camelCase")]
    StatusChanged { order_id: String, from: OrderStatus, to: OrderStatus },
    #[serde(rename_all = "camelCase")]
    Updated { order_id: String, payment_status: PaymentStatus },
    #[serde(rename_all = "camelCase")]
    SentToSupplier { order_id: String, line_count: usize },
}

impl OrderEvent {
    pub fn placed(order: &Order) -> Self {
        Self::Placed { order_id: order.id().to_string(), total_usd: order.total_usd(), item_count: order.item_count() }
    }

    /// Events implied by moving from `before` to `after`.
    pub fn diff(before: &Order, after: &Order) -> Vec<Self> {
        let mut events = vec![];
        if before.status() != after.status() {
            events.push(Self::StatusChanged { order_id: after.id().to_string(), from: before.status(), to: after.status() });
        }
        if before.customer() != after.customer() || before.line_items() != after.line_items()
            || before.notes() != after.notes() || before.payment_status() != after.payment_status() {
            events.push(Self::Updated { order_id: after.id().to_string(), payment_status: after.payment_status() });
        }
        events
    }

    pub fn order_id(&self) -> &str {
        match self {
            Self::Placed { order_id, .. } | Self::StatusChanged { order_id, .. }
            | Self::Updated { order_id, .. } | Self::SentToSupplier { order_id, .. } => order_id,
        }
    }

    /// Subject suffix the event is published under.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Placed { .. } => "order.placed",
            Self::StatusChanged { .. } => "order.status_changed",
            Self::Updated { .. } => "order.updated",
            Self::SentToSupplier { .. } => "order.sent_to_supplier",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub event: OrderEvent,
}

impl From<OrderEvent> for EventEnvelope {
    fn from(event: OrderEvent) -> Self { Self { event_id: Uuid::now_v7(), occurred_at: Utc::now(), event } }
}
