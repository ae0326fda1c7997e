//! Order persistence.
//!
//! Creates are idempotent by order id: a second create with a known id fails
//! and leaves the first record untouched. Updates to one id are serialized;
//! reads never observe a half-applied update.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::domain::aggregates::{Order, OrderError, OrderPatch};
use crate::domain::lifecycle::OrderStatus;

pub use memory::InMemoryOrderStore;
pub use postgres::PgOrderStore;

/// A committed update: the record it replaced and the record now stored.
#[derive(Clone, Debug)]
pub struct Revision {
    pub before: Order,
    pub after: Order,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create(&self, order: Order) -> Result<Order, StoreError>;
    /// Applies `patch` while holding the order's lock. `before` is the state the patch replaced.
    async fn revise(&self, id: &str, patch: OrderPatch) -> Result<Revision, StoreError>;
    async fn update(&self, id: &str, patch: OrderPatch) -> Result<Order, StoreError> {
        Ok(self.revise(id, patch).await?.after)
    }
    async fn get(&self, id: &str) -> Result<Order, StoreError>;
    /// Matching orders by `created_at` ascending, ties in insertion order.
    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, StoreError>;
}

/// `created_from` is inclusive, `created_to` exclusive.
#[derive(Clone, Debug, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl OrderFilter {
    pub fn status(status: OrderStatus) -> Self { Self { status: Some(status), ..Self::default() } }

    pub fn matches(&self, order: &Order) -> bool {
        self.status.map_or(true, |s| order.status() == s)
            && self.created_from.map_or(true, |from| order.created_at() >= from)
            && self.created_to.map_or(true, |to| order.created_at() < to)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("order `{0}` already exists")]
    DuplicateOrderId(String),
    #[error("order `{0}` not found")]
    OrderNotFound(String),
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt order record `{id}`: {reason}")]
    Corrupt { id: String, reason: String },
}

impl StoreError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateOrderId(_) => "duplicate_order_id",
            Self::OrderNotFound(_) => "order_not_found",
            Self::Order(e) => e.kind(),
            Self::Database(_) | Self::Corrupt { .. } => "storage",
        }
    }
}
