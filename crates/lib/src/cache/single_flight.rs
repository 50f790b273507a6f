//! Deduplication of concurrent work by key.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OnceCell;

/// Runs at most one computation per key at a time.
///
/// Callers arriving while a computation for their key is in flight await its
/// result instead of starting their own. Once a flight lands it is forgotten,
/// so a later call computes afresh.
pub struct SingleFlight<K, V> {
  inflight: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> Default for SingleFlight<K, V> {
  fn default() -> Self {
    Self {
      inflight: Mutex::new(HashMap::new()),
    }
  }
}

impl<K, V> SingleFlight<K, V>
where
  K: Eq + Hash + Clone,
  V: Clone,
{
  pub fn new() -> Self {
    Self::default()
  }

  /// Run `f` for `key`, or join the flight already running for it.
  ///
  /// If the caller driving a flight is cancelled, one of the waiters takes
  /// over and runs its own `f`.
  pub async fn run<F, Fut>(&self, key: K, f: F) -> V
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = V>,
  {
    let cell = {
      let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
      inflight.entry(key.clone()).or_default().clone()
    };

    let value = cell.get_or_init(f).await.clone();

    let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
    if inflight.get(&key).is_some_and(|current| Arc::ptr_eq(current, &cell)) {
      inflight.remove(&key);
    }

    value
  }

  /// Number of keys with a flight in progress.
  pub fn in_flight(&self) -> usize {
    self.inflight.lock().unwrap_or_else(PoisonError::into_inner).len()
  }
}
