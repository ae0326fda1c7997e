//! In-memory order store.
//!
//! The index lock is held only to find or insert a slot; each order then has
//! its own lock, so updates to one id queue behind each other while other ids
//! proceed.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::domain::aggregates::{Order, OrderPatch};
use crate::store::{OrderFilter, OrderStore, Revision, StoreError};

struct Slot {
    seq: u64,
    order: RwLock<Order>,
}

#[derive(Default)]
pub struct InMemoryOrderStore {
    slots: RwLock<HashMap<String, Arc<Slot>>>,
    next_seq: AtomicU64,
}

impl InMemoryOrderStore {
    pub fn new() -> Self { Self::default() }

    pub async fn len(&self) -> usize { self.slots.read().await.len() }

    async fn slot(&self, id: &str) -> Result<Arc<Slot>, StoreError> {
        self.slots.read().await.get(id).cloned().ok_or_else(|| StoreError::OrderNotFound(id.to_string()))
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: Order) -> Result<Order, StoreError> {
        let mut slots = self.slots.write().await;
        if slots.contains_key(order.id()) {
            tracing::warn!(order_id = order.id(), "rejected duplicate create");
            return Err(StoreError::DuplicateOrderId(order.id().to_string()));
        }
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        slots.insert(order.id().to_string(), Arc::new(Slot { seq, order: RwLock::new(order.clone()) }));
        tracing::info!(order_id = order.id(), total_usd = %order.total_usd(), "order created");
        Ok(order)
    }

    async fn revise(&self, id: &str, patch: OrderPatch) -> Result<Revision, StoreError> {
        let slot = self.slot(id).await?;
        let mut current = slot.order.write().await;
        let mut next = current.clone();
        next.apply(patch)?;
        let before = std::mem::replace(&mut *current, next.clone());
        tracing::info!(order_id = id, from = %before.status(), to = %next.status(), "order updated");
        Ok(Revision { before, after: next })
    }

    async fn get(&self, id: &str) -> Result<Order, StoreError> {
        let slot = self.slot(id).await?;
        let order = slot.order.read().await.clone();
        Ok(order)
    }

    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, StoreError> {
        let slots: Vec<Arc<Slot>> = self.slots.read().await.values().cloned().collect();
        let mut matched = Vec::with_capacity(slots.len());
        for slot in slots {
            let order = slot.order.read().await;
            if filter.matches(&order) { matched.push((slot.seq, order.clone())); }
        }
        matched.sort_by(|(a_seq, a), (b_seq, b)| a.created_at().cmp(&b.created_at()).then(a_seq.cmp(b_seq)));
        Ok(matched.into_iter().map(|(_, o)| o).collect())
    }
}
