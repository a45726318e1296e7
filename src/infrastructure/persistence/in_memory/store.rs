//! # In-Memory Kernel Store
//!
//! In-memory implementation of [`KernelStore`] for testing and
//! single-node deployments.
//!
//! All tables live behind a single `RwLock`, which is what makes
//! [`commit_transition`](KernelStore::commit_transition) atomic: the
//! version check, trade write, escrow write, and audit append happen
//! under one write guard. Readers take snapshots and never observe a
//! partially applied commit.

use crate::domain::entities::escrow::EscrowAccount;
use crate::domain::entities::quote::Quote;
use crate::domain::entities::trade::Trade;
use crate::domain::events::transition_event::TransitionEvent;
use crate::domain::value_objects::ids::{QuoteId, TradeId};
use crate::infrastructure::persistence::traits::{
    KernelStore, RecordedEvent, StoreError, StoreResult,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    trades: HashMap<TradeId, Trade>,
    escrows: HashMap<TradeId, EscrowAccount>,
    quotes: HashMap<QuoteId, Quote>,
    events: Vec<RecordedEvent>,
    next_sequence: u64,
}

impl Tables {
    fn record(&mut self, event: TransitionEvent) -> RecordedEvent {
        self.next_sequence += 1;
        let recorded = RecordedEvent {
            sequence: self.next_sequence,
            event,
        };
        self.events.push(recorded.clone());
        recorded
    }
}

/// In-memory implementation of [`KernelStore`].
///
/// Suitable for unit tests and single-process deployments without a
/// database dependency.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKernelStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryKernelStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of trades in the store.
    pub async fn trade_count(&self) -> usize {
        self.tables.read().await.trades.len()
    }

    /// Clears all tables.
    pub async fn clear(&self) {
        let mut tables = self.tables.write().await;
        tables.trades.clear();
        tables.escrows.clear();
        tables.quotes.clear();
        tables.events.clear();
        tables.next_sequence = 0;
    }
}

#[async_trait]
impl KernelStore for InMemoryKernelStore {
    async fn insert_trade(&self, trade: &Trade, escrow: &EscrowAccount) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.trades.contains_key(&trade.id()) {
            return Err(StoreError::AlreadyExists(trade.id().to_string()));
        }
        tables.trades.insert(trade.id(), trade.clone());
        tables.escrows.insert(trade.id(), escrow.clone());
        Ok(())
    }

    async fn get_trade(&self, id: &TradeId) -> StoreResult<Option<Trade>> {
        let tables = self.tables.read().await;
        Ok(tables.trades.get(id).cloned())
    }

    async fn get_escrow(&self, trade_id: &TradeId) -> StoreResult<Option<EscrowAccount>> {
        let tables = self.tables.read().await;
        Ok(tables.escrows.get(trade_id).cloned())
    }

    async fn save_escrow(&self, escrow: &EscrowAccount) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.escrows.insert(escrow.trade_id(), escrow.clone());
        Ok(())
    }

    async fn save_quote(&self, quote: &Quote) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.quotes.insert(quote.id(), quote.clone());
        Ok(())
    }

    async fn get_quote(&self, id: &QuoteId) -> StoreResult<Option<Quote>> {
        let tables = self.tables.read().await;
        Ok(tables.quotes.get(id).cloned())
    }

    async fn append_event(&self, event: TransitionEvent) -> StoreResult<RecordedEvent> {
        let mut tables = self.tables.write().await;
        Ok(tables.record(event))
    }

    async fn commit_transition(
        &self,
        expected_version: u64,
        trade: &Trade,
        escrow: &EscrowAccount,
        event: TransitionEvent,
    ) -> StoreResult<RecordedEvent> {
        let mut tables = self.tables.write().await;

        let stored_version = tables
            .trades
            .get(&trade.id())
            .map(Trade::version)
            .ok_or_else(|| StoreError::internal(format!("trade not found: {}", trade.id())))?;
        if stored_version != expected_version {
            return Err(StoreError::version_conflict(
                "Trade",
                trade.id().to_string(),
                expected_version,
                stored_version,
            ));
        }

        tables.trades.insert(trade.id(), trade.clone());
        tables.escrows.insert(trade.id(), escrow.clone());
        Ok(tables.record(event))
    }

    async fn tail(&self, trade_id: &TradeId, limit: usize) -> StoreResult<Vec<RecordedEvent>> {
        let tables = self.tables.read().await;
        Ok(tables
            .events
            .iter()
            .filter(|recorded| recorded.event.trade_id() == *trade_id)
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_events(&self) -> StoreResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables.events.len() as u64)
    }
}
