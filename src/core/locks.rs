use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per trip. Holding the guard serializes every
/// read-validate-write sequence on that trip; different trips never contend.
#[derive(Clone, Default)]
pub struct TripLocks {
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl TripLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries whose mutex is neither held nor awaited are dropped on the way
    /// in, so the registry only tracks trips with work in flight.
    pub async fn acquire(&self, trip_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(trip_id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}
