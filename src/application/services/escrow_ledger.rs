//! # Escrow Ledger
//!
//! Milestone-gated escrow orchestration.
//!
//! The ledger owns the two escrow operations of the kernel:
//!
//! - **hold**: the funding entry point, called while the trade sits in
//!   `escrow_required`. Legal only while nothing is held (no double-hold,
//!   no top-up).
//! - **release planning**: computing the releases due when a stage is
//!   entered, from the trade's fixed milestone schedule. Entering
//!   `settled` always releases the remainder under the reserved `final`
//!   milestone.
//!
//! Custodian calls carry a bounded timeout; a timeout surfaces as a
//! collaborator error and never mutates local state.

use crate::application::error::{ApplicationError, ApplicationResult, CollaboratorError};
use crate::application::services::locks::TradeLocks;
use crate::domain::entities::escrow::{EscrowAccount, EscrowView};
use crate::domain::entities::trade::Trade;
use crate::domain::value_objects::ids::{MilestoneId, TradeId};
use crate::domain::value_objects::milestone::MilestoneSchedule;
use crate::domain::value_objects::money::Money;
use crate::domain::value_objects::stage::TradeStage;
use crate::infrastructure::persistence::traits::KernelStore;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// The external escrow custodian.
///
/// Holds and releases the actual funds; the kernel's escrow accounts
/// mirror its state and enforce the monetary invariants.
#[async_trait]
pub trait EscrowCustodian: Send + Sync + fmt::Debug {
    /// Places a hold with the custodian.
    async fn hold(&self, trade_id: TradeId, amount: &Money) -> Result<(), CollaboratorError>;

    /// Releases funds for a milestone with the custodian.
    async fn release(
        &self,
        trade_id: TradeId,
        milestone: &MilestoneId,
        amount: &Money,
    ) -> Result<(), CollaboratorError>;
}

/// A release that is due because a stage was entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRelease {
    /// The milestone being released.
    pub milestone: MilestoneId,
    /// The amount to release.
    pub amount: Money,
}

/// Computes the releases due when `entering` a stage, given the trade's
/// fixed schedule and the current escrow state.
///
/// Already-released milestones are skipped, zero remainders are skipped,
/// and the settlement remainder is exact: `held - released - partials
/// due this entry`.
///
/// # Errors
///
/// Returns a domain arithmetic error if the schedule math fails, which
/// would indicate corrupted state.
pub fn plan_releases(
    trade: &Trade,
    escrow: &EscrowAccount,
    entering: TradeStage,
) -> ApplicationResult<Vec<PlannedRelease>> {
    let mut planned = Vec::new();
    let mut projected_released = escrow.released().clone();

    for scheduled in trade.schedule().releases_on(entering) {
        if escrow.released_milestones().contains(&scheduled.milestone) {
            continue;
        }
        let amount = escrow
            .held()
            .percentage(scheduled.basis_points)
            .map_err(ApplicationError::Domain)?;
        if amount.is_zero() {
            continue;
        }
        projected_released = projected_released
            .safe_add(&amount)
            .map_err(ApplicationError::Domain)?;
        planned.push(PlannedRelease {
            milestone: scheduled.milestone.clone(),
            amount,
        });
    }

    if entering == TradeStage::Settled {
        let remainder = escrow
            .held()
            .safe_sub(&projected_released)
            .map_err(ApplicationError::Domain)?;
        if !remainder.is_zero() {
            planned.push(PlannedRelease {
                milestone: MilestoneSchedule::final_milestone(),
                amount: remainder,
            });
        }
    }

    Ok(planned)
}

/// Escrow orchestration service.
#[derive(Debug, Clone)]
pub struct EscrowLedger {
    store: Arc<dyn KernelStore>,
    custodian: Arc<dyn EscrowCustodian>,
    locks: Arc<TradeLocks>,
    call_timeout: Duration,
}

impl EscrowLedger {
    /// Creates a new escrow ledger.
    #[must_use]
    pub fn new(
        store: Arc<dyn KernelStore>,
        custodian: Arc<dyn EscrowCustodian>,
        locks: Arc<TradeLocks>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            store,
            custodian,
            locks,
            call_timeout,
        }
    }

    /// Places the escrow hold for a trade.
    ///
    /// Calls the custodian first; only on custodian success is the local
    /// account updated.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::ConcurrencyConflict`] if another
    /// writer holds the trade's lock, a domain error for double-holds,
    /// and a collaborator error if the custodian call fails or times
    /// out.
    pub async fn hold(&self, trade_id: TradeId, amount: Money) -> ApplicationResult<EscrowView> {
        let _guard = self
            .locks
            .try_acquire(trade_id)
            .await
            .ok_or_else(|| ApplicationError::ConcurrencyConflict(trade_id.to_string()))?;

        let trade = self
            .store
            .get_trade(&trade_id)
            .await?
            .ok_or_else(|| ApplicationError::TradeNotFound(trade_id.to_string()))?;
        if trade.is_terminal() {
            return Err(ApplicationError::validation(format!(
                "trade {trade_id} is {} and can no longer be funded",
                trade.stage()
            )));
        }

        let mut escrow = self
            .store
            .get_escrow(&trade_id)
            .await?
            .ok_or_else(|| ApplicationError::EscrowNotFound(trade_id.to_string()))?;

        self.custodian_hold(trade_id, &amount).await?;
        escrow.hold(amount)?;
        self.store.save_escrow(&escrow).await?;

        info!(trade_id = %trade_id, held = %escrow.held(), "escrow hold placed");
        Ok(escrow.view())
    }

    /// Executes planned releases with the custodian and applies them to
    /// the account.
    ///
    /// Used by the transition engine inside the guarded transition path.
    ///
    /// # Errors
    ///
    /// Returns a collaborator error if a custodian call fails or times
    /// out, and a domain error if a release violates the escrow
    /// invariants.
    pub async fn execute_releases(
        &self,
        escrow: &mut EscrowAccount,
        planned: &[PlannedRelease],
    ) -> ApplicationResult<()> {
        for release in planned {
            self.custodian_release(escrow.trade_id(), &release.milestone, &release.amount)
                .await?;
            escrow.release(release.milestone.clone(), release.amount.clone())?;
            info!(
                trade_id = %escrow.trade_id(),
                milestone = %release.milestone,
                amount = %release.amount,
                "escrow milestone released"
            );
        }
        Ok(())
    }

    /// Returns the progress view of a trade's escrow account.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::EscrowNotFound`] if the trade has no
    /// escrow account.
    pub async fn view(&self, trade_id: TradeId) -> ApplicationResult<EscrowView> {
        let escrow = self
            .store
            .get_escrow(&trade_id)
            .await?
            .ok_or_else(|| ApplicationError::EscrowNotFound(trade_id.to_string()))?;
        Ok(escrow.view())
    }

    async fn custodian_hold(
        &self,
        trade_id: TradeId,
        amount: &Money,
    ) -> Result<(), CollaboratorError> {
        match tokio::time::timeout(self.call_timeout, self.custodian.hold(trade_id, amount)).await
        {
            Ok(result) => result,
            Err(_) => Err(CollaboratorError::Timeout(format!(
                "escrow custodian hold for trade {trade_id}"
            ))),
        }
    }

    async fn custodian_release(
        &self,
        trade_id: TradeId,
        milestone: &MilestoneId,
        amount: &Money,
    ) -> Result<(), CollaboratorError> {
        match tokio::time::timeout(
            self.call_timeout,
            self.custodian.release(trade_id, milestone, amount),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(CollaboratorError::Timeout(format!(
                "escrow custodian release of {milestone} for trade {trade_id}"
            ))),
        }
    }
}
