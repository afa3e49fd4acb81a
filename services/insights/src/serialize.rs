//! Serialized, memoizing cells for expensive fetch-and-parse work.
//!
//! Callers queue on a fair async mutex, so they run one at a time in arrival
//! order. The first successful result is kept and handed to every later
//! caller. A failed attempt is returned to its own caller only; the cell stays
//! empty and the next caller in line makes a fresh attempt.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::Mutex;

pub struct Serialized<T> {
    slot: Mutex<Option<Arc<T>>>,
}

impl<T> Default for Serialized<T> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }
}

impl<T> Serialized<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value, or run `init` while holding the queue.
    pub async fn get_or_try_init<E, F, Fut>(&self, init: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(value) = slot.as_ref() {
            return Ok(Arc::clone(value));
        }
        let value = Arc::new(init().await?);
        *slot = Some(Arc::clone(&value));
        Ok(value)
    }
}

/// One [`Serialized`] cell per key; different keys never wait on each other.
pub struct SerializedMap<K, T> {
    cells: Mutex<HashMap<K, Arc<Serialized<T>>>>,
}

impl<K, T> Default for SerializedMap<K, T> {
    fn default() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash, T> SerializedMap<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_try_init<E, F, Fut>(&self, key: K, init: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let cell = {
            let mut cells = self.cells.lock().await;
            Arc::clone(cells.entry(key).or_default())
        };
        cell.get_or_try_init(init).await
    }
}
