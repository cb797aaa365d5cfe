//! Per-tonie serialization of fetch-then-replace sequences
//!
//! Two requests that both fetch a chapter list and submit an edited copy
//! would otherwise overwrite each other. Holding the tonie's lock for the
//! whole sequence makes them take turns. Only this process is covered;
//! other cloud clients still race (last writer wins).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockTable = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Async mutexes keyed by tonie id, created on first use and dropped once
/// nobody holds or waits for them
#[derive(Default, Clone)]
pub struct TargetLocks {
    locks: LockTable,
}

/// Exclusive access to one tonie; released on drop
pub struct TargetGuard {
    guard: Option<OwnedMutexGuard<()>>,
    locks: LockTable,
    target_id: String,
}

impl Drop for TargetGuard {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Only the table's own reference left: no holder, no waiter
        if locks
            .get(&self.target_id)
            .map(|lock| Arc::strong_count(lock) == 1)
            .unwrap_or(false)
        {
            locks.remove(&self.target_id);
        }
    }
}

impl TargetLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `target_id`
    pub async fn acquire(&self, target_id: &str) -> TargetGuard {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            locks
                .entry(target_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        TargetGuard {
            guard: Some(lock.lock_owned().await),
            locks: self.locks.clone(),
            target_id: target_id.to_string(),
        }
    }

    /// Number of tonies currently locked or waited on
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .map(|locks| locks.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
