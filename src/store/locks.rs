use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockKey {
    Order(Uuid),
    Driver(Uuid),
}

/// Keyed async mutexes that fence multi-row mutations.
///
/// Callers that need both take the driver lock before the order lock.
#[derive(Default)]
pub struct LockTable {
    locks: DashMap<LockKey, Arc<Mutex<()>>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, key: LockKey) -> OwnedMutexGuard<()> {
        let lock = Arc::clone(self.locks.entry(key).or_default().value());
        lock.lock_owned().await
    }

    pub async fn order(&self, order_id: Uuid) -> OwnedMutexGuard<()> {
        self.acquire(LockKey::Order(order_id)).await
    }

    pub async fn driver(&self, driver_id: Uuid) -> OwnedMutexGuard<()> {
        self.acquire(LockKey::Driver(driver_id)).await
    }
}
