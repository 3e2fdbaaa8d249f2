use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

type LockMap = HashMap<String, Arc<AsyncMutex<()>>>;

/// Per-key mutual exclusion.
///
/// Each key maps to its own async mutex, created on first use and dropped from
/// the registry once the last holder or waiter releases it.
#[derive(Default)]
pub struct KeyedLocks {
    locks: Arc<Mutex<LockMap>>,
}

/// Holds the lock for one key until dropped.
pub struct KeyGuard {
    key: String,
    lock: Arc<AsyncMutex<()>>,
    registry: Arc<Mutex<LockMap>>,
    _guard: OwnedMutexGuard<()>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, key: &str) -> KeyGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        debug!(key, "waiting for lock");
        let guard = lock.clone().lock_owned().await;
        KeyGuard {
            key: key.to_string(),
            lock,
            registry: Arc::clone(&self.locks),
            _guard: guard,
        }
    }

    /// Number of keys currently held or awaited.
    pub fn active_keys(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        let mut locks = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        // Owners are the registry, `self.lock` and the owned guard; any more means waiters.
        if Arc::strong_count(&self.lock) == 3
            && locks
                .get(&self.key)
                .is_some_and(|existing| Arc::ptr_eq(existing, &self.lock))
        {
            locks.remove(&self.key);
        }
    }
}
