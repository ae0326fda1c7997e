//! Per-order guards for handlers that read an order, act on it, then write it back.
//!
//! The store serializes single updates; a guard extends that across a whole
//! handler so a supplier submission cannot be sent twice for one order.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub struct OrderLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl OrderLocks {
    pub fn new() -> Self { Self::default() }

    /// Waits for any other holder of `id`, then holds it until the guard is dropped.
    pub async fn acquire(&self, id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Entries nobody holds or waits on.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub async fn len(&self) -> usize { self.locks.lock().await.len() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_id_waits() {
        let locks = Arc::new(OrderLocks::new());
        let held = locks.acquire("ORD-1").await;
        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move { locks.acquire("ORD-1").await; })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        drop(held);
        tokio::time::timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_other_ids_proceed() {
        let locks = OrderLocks::new();
        let _a = locks.acquire("ORD-1").await;
        tokio::time::timeout(Duration::from_secs(1), locks.acquire("ORD-2")).await.unwrap();
    }

    #[tokio::test]
    async fn test_released_entries_are_pruned() {
        let locks = OrderLocks::new();
        for i in 0..10 {
            drop(locks.acquire(&format!("ORD-{i}")).await);
        }
        let _held = locks.acquire("ORD-x").await;
        assert_eq!(locks.len().await, 1);
    }
}
