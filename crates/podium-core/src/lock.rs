//! Per-scope mutual exclusion for recomputes.
//!
//! At most one recompute runs per canonical scope key. Different keys never
//! contend.

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{Error, Result};

/// Held for the whole aggregate → rank → persist cycle of one scope.
pub type ScopeGuard = OwnedMutexGuard<()>;

#[derive(Debug)]
pub struct ScopeLocks {
  locks:   DashMap<String, Arc<Mutex<()>>>,
  timeout: Duration,
}

impl ScopeLocks {
  pub fn new(timeout: Duration) -> Self { Self { locks: DashMap::new(), timeout } }

  /// Wait up to the configured timeout for the lock on `key`.
  pub async fn acquire(&self, key: &str) -> Result<ScopeGuard> {
    let lock = self.locks.entry(key.to_owned()).or_default().clone();
    tokio::time::timeout(self.timeout, lock.lock_owned())
      .await
      .map_err(|_| Error::ConcurrentRecomputeConflict(key.to_owned()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn second_acquire_on_same_key_times_out() {
    let locks = ScopeLocks::new(Duration::from_millis(20));
    let _held = locks.acquire("2025/provincial").await.unwrap();

    let err = locks.acquire("2025/provincial").await.unwrap_err();
    assert!(matches!(err, Error::ConcurrentRecomputeConflict(k) if k == "2025/provincial"));
  }

  #[tokio::test]
  async fn different_keys_do_not_contend() {
    let locks = ScopeLocks::new(Duration::from_millis(20));
    let _a = locks.acquire("a").await.unwrap();
    assert!(locks.acquire("b").await.is_ok());
  }

  #[tokio::test]
  async fn lock_is_released_on_drop() {
    let locks = ScopeLocks::new(Duration::from_millis(20));
    drop(locks.acquire("a").await.unwrap());
    assert!(locks.acquire("a").await.is_ok());
  }
}
