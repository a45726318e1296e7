//! # Get Trade State Use Case
//!
//! The pull-based read API: trade, escrow view, audit tail, and the
//! recommended next action in one snapshot.
//!
//! Reads are lock-free and run concurrently with writes; the snapshot
//! may be slightly stale but never violates the escrow or stage-graph
//! invariants, because those only ever change atomically in the
//! transition engine.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::guard_evaluator::{GuardEvaluator, GuardResult};
use crate::application::services::projector::{project, TradeProjection};
use crate::domain::entities::escrow::EscrowView;
use crate::domain::entities::trade::Trade;
use crate::domain::value_objects::ids::TradeId;
use crate::infrastructure::persistence::traits::{KernelStore, RecordedEvent};
use serde::Serialize;
use std::sync::Arc;

/// Default number of audit entries returned with a state read.
const DEFAULT_TAIL_LIMIT: usize = 20;

/// A consistent snapshot of everything a trade workspace needs.
#[derive(Debug, Clone, Serialize)]
pub struct TradeStateView {
    /// The trade.
    pub trade: Trade,
    /// The escrow progress view.
    pub escrow: EscrowView,
    /// Recent transition attempts, most recent first.
    pub audit_tail: Vec<RecordedEvent>,
    /// Stage index, recommended next action, terminality.
    pub projection: TradeProjection,
}

/// Use case answering `getTradeState`.
#[derive(Debug, Clone)]
pub struct GetTradeState {
    store: Arc<dyn KernelStore>,
    guards: GuardEvaluator,
}

impl GetTradeState {
    /// Creates the use case.
    #[must_use]
    pub fn new(store: Arc<dyn KernelStore>, guards: GuardEvaluator) -> Self {
        Self { store, guards }
    }

    /// Reads the state snapshot of a trade.
    ///
    /// The recommended next action is derived by evaluating the guards
    /// against the next spine stage (the same gates a transition would
    /// face), so the UI shows the blocking cause before anyone attempts
    /// the move.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::TradeNotFound`] for unknown trades.
    pub async fn read(&self, trade_id: TradeId) -> ApplicationResult<TradeStateView> {
        let trade = self
            .store
            .get_trade(&trade_id)
            .await?
            .ok_or_else(|| ApplicationError::TradeNotFound(trade_id.to_string()))?;
        let escrow = self
            .store
            .get_escrow(&trade_id)
            .await?
            .ok_or_else(|| ApplicationError::EscrowNotFound(trade_id.to_string()))?;
        let audit_tail = self.store.tail(&trade_id, DEFAULT_TAIL_LIMIT).await?;

        let guard_failure = match trade.stage().next_on_spine() {
            Some(next) if !trade.is_terminal() => {
                let quote = match trade.details().selected_quote() {
                    Some(quote_id) => self.store.get_quote(&quote_id).await?,
                    None => None,
                };
                match self
                    .guards
                    .evaluate(&trade, next, quote.as_ref(), &escrow)
                    .await
                {
                    GuardResult::Pass => None,
                    GuardResult::Fail(failure) => Some(failure),
                }
            }
            _ => None,
        };

        let projection = project(&trade, &escrow, guard_failure.as_ref());

        Ok(TradeStateView {
            escrow: escrow.view(),
            audit_tail,
            projection,
            trade,
        })
    }

    /// Reads the audit tail of a trade with an explicit limit.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::TradeNotFound`] for unknown trades.
    pub async fn tail(
        &self,
        trade_id: TradeId,
        limit: usize,
    ) -> ApplicationResult<Vec<RecordedEvent>> {
        if self.store.get_trade(&trade_id).await?.is_none() {
            return Err(ApplicationError::TradeNotFound(trade_id.to_string()));
        }
        Ok(self.store.tail(&trade_id, limit).await?)
    }
}
