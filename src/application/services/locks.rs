//! # Per-Trade Advisory Locks
//!
//! Serializes writers on the same trade within this process.
//!
//! Transitions on one trade are mutually exclusive: the engine tries to
//! take the trade's advisory lock without waiting, and a losing caller
//! receives a concurrency conflict instead of silently overwriting. The
//! store's version compare-and-swap remains the cross-process backstop.

use crate::domain::value_objects::ids::TradeId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-trade advisory lock registry.
///
/// # Examples
///
/// ```
/// use trade_kernel::application::services::locks::TradeLocks;
/// use trade_kernel::domain::value_objects::ids::TradeId;
///
/// # async fn example() {
/// let locks = TradeLocks::new();
/// let trade_id = TradeId::new_v4();
///
/// let guard = locks.try_acquire(trade_id).await;
/// assert!(guard.is_some());
///
/// // A second writer on the same trade loses immediately.
/// assert!(locks.try_acquire(trade_id).await.is_none());
///
/// drop(guard);
/// assert!(locks.try_acquire(trade_id).await.is_some());
/// # }
/// ```
#[derive(Debug, Default)]
pub struct TradeLocks {
    registry: Mutex<HashMap<TradeId, Arc<Mutex<()>>>>,
}

impl TradeLocks {
    /// Creates an empty lock registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to acquire the advisory lock of a trade without waiting.
    ///
    /// Returns `None` if another writer currently holds it.
    pub async fn try_acquire(&self, trade_id: TradeId) -> Option<OwnedMutexGuard<()>> {
        let lock = {
            let mut registry = self.registry.lock().await;
            Arc::clone(
                registry
                    .entry(trade_id)
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        lock.try_lock_owned().ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_and_release() {
        let locks = TradeLocks::new();
        let trade_id = TradeId::new_v4();

        let guard = locks.try_acquire(trade_id).await;
        assert!(guard.is_some());

        drop(guard);
        assert!(locks.try_acquire(trade_id).await.is_some());
    }

    #[tokio::test]
    async fn contended_lock_is_refused() {
        let locks = TradeLocks::new();
        let trade_id = TradeId::new_v4();

        let _held = locks.try_acquire(trade_id).await.unwrap();
        assert!(locks.try_acquire(trade_id).await.is_none());
    }

    #[tokio::test]
    async fn different_trades_do_not_contend() {
        let locks = TradeLocks::new();

        let _a = locks.try_acquire(TradeId::new_v4()).await.unwrap();
        assert!(locks.try_acquire(TradeId::new_v4()).await.is_some());
    }
}
