//! # Transition Engine
//!
//! Owner of the legal stage graph and the only writer of trade state.
//!
//! A transition request runs through a fixed pipeline:
//!
//! 1. take the trade's advisory lock (losing callers conflict
//!    immediately);
//! 2. validate that the target is a legal next stage; anything else is
//!    rejected without consulting the guards;
//! 3. run the guard evaluator;
//! 4. on a full pass, apply the stage write, any escrow releases due on
//!    entering the stage, and the success audit event in one atomic
//!    store commit;
//! 5. emit a notice for the external notification dispatcher.
//!
//! Every attempt, blocked or successful, lands in the audit ledger.
//! Rejections are structured values with a reason code and remediation
//! hints, never errors; the only errors crossing this boundary are
//! infrastructure failures.
//!
//! A store-level version conflict is retried once automatically before
//! being surfaced as a `CONCURRENCY_CONFLICT` rejection.

use crate::application::error::{ApplicationError, ApplicationResult, CollaboratorError};
use crate::application::services::escrow_ledger::{plan_releases, EscrowLedger};
use crate::application::services::guard_evaluator::{GuardEvaluator, GuardFailure, GuardResult};
use crate::application::services::locks::TradeLocks;
use crate::application::services::retry::{execute_with_retry, RetryPolicy};
use crate::domain::entities::trade::{Trade, TradeType};
use crate::domain::events::transition_event::TransitionEvent;
use crate::domain::value_objects::ids::{PartyId, QuoteId, TradeId};
use crate::domain::value_objects::reason::ReasonCode;
use crate::domain::value_objects::stage::TradeStage;
use crate::infrastructure::persistence::traits::KernelStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Notice emitted on every successful transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionNotice {
    /// The transitioned trade.
    pub trade_id: TradeId,
    /// The stage the trade left.
    pub from_stage: TradeStage,
    /// The stage the trade entered.
    pub to_stage: TradeStage,
}

/// Consumer of transition notices.
///
/// Implemented by the external notification dispatcher adapter. Delivery
/// failures are logged, never propagated: notification is best-effort
/// and the audit ledger remains the source of truth.
#[async_trait]
pub trait TransitionNotifier: Send + Sync + fmt::Debug {
    /// Delivers a transition notice.
    async fn notify(&self, notice: TransitionNotice) -> Result<(), CollaboratorError>;
}

/// Caller-supplied context for a transition request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionMetadata {
    /// The party requesting the transition.
    pub actor: PartyId,
    /// The quote backing a move to `contracted`, for RFQ trades.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_id: Option<QuoteId>,
}

impl TransitionMetadata {
    /// Creates metadata with just an actor.
    #[must_use]
    pub fn new(actor: PartyId) -> Self {
        Self {
            actor,
            quote_id: None,
        }
    }

    /// Attaches a quote reference.
    #[must_use]
    pub fn with_quote(mut self, quote_id: QuoteId) -> Self {
        self.quote_id = Some(quote_id);
        self
    }
}

/// A structured rejection: why the transition was blocked and what to do
/// about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// Machine-readable cause.
    pub reason_code: ReasonCode,
    /// Short human-readable remediation hints.
    pub required_actions: Vec<String>,
}

impl From<GuardFailure> for Rejection {
    fn from(failure: GuardFailure) -> Self {
        Self {
            reason_code: failure.reason_code,
            required_actions: failure.required_actions,
        }
    }
}

/// Outcome of a transition request.
///
/// Rejections are values, not errors: every caller always has a reason
/// code to act on or display.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// The transition committed; the updated trade is returned.
    Completed {
        /// The trade after the transition.
        trade: Trade,
    },
    /// The transition was blocked; the trade is unchanged.
    Rejected(Rejection),
}

impl TransitionOutcome {
    /// Returns true if the transition committed.
    #[inline]
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Returns the rejection, if any.
    #[must_use]
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Completed { .. } => None,
            Self::Rejected(rejection) => Some(rejection),
        }
    }
}

/// The transition engine.
///
/// Sole owner of trade stage writes. All dependencies are injected; the
/// engine holds no state beyond its collaborator handles.
#[derive(Debug, Clone)]
pub struct TransitionEngine {
    store: Arc<dyn KernelStore>,
    guards: GuardEvaluator,
    escrow_ledger: EscrowLedger,
    notifier: Arc<dyn TransitionNotifier>,
    locks: Arc<TradeLocks>,
    retry: RetryPolicy,
}

impl TransitionEngine {
    /// Creates a new transition engine.
    #[must_use]
    pub fn new(
        store: Arc<dyn KernelStore>,
        guards: GuardEvaluator,
        escrow_ledger: EscrowLedger,
        notifier: Arc<dyn TransitionNotifier>,
        locks: Arc<TradeLocks>,
    ) -> Self {
        Self {
            store,
            guards,
            escrow_ledger,
            notifier,
            locks,
            retry: RetryPolicy::single_conflict_retry(),
        }
    }

    /// Requests a transition of `trade_id` to `target`.
    ///
    /// A version conflict is retried once before being surfaced as a
    /// `CONCURRENCY_CONFLICT` rejection. Every blocked attempt is
    /// recorded in the audit ledger.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure failures (missing trade,
    /// store errors). Business rejections come back as
    /// [`TransitionOutcome::Rejected`].
    pub async fn transition(
        &self,
        trade_id: TradeId,
        target: TradeStage,
        metadata: TransitionMetadata,
    ) -> ApplicationResult<TransitionOutcome> {
        let result = execute_with_retry(&self.retry, || {
            self.execute_once(trade_id, target, metadata.clone())
        })
        .await;

        match result {
            Err(error) if error.is_conflict() => {
                warn!(trade_id = %trade_id, target = %target, "transition lost the write race");
                if let Some(trade) = self.store.get_trade(&trade_id).await? {
                    let event = TransitionEvent::blocked(
                        trade_id,
                        trade.stage(),
                        target,
                        ReasonCode::ConcurrencyConflict,
                        metadata.actor.clone(),
                    );
                    self.store.append_event(event).await?;
                }
                Ok(TransitionOutcome::Rejected(Rejection {
                    reason_code: ReasonCode::ConcurrencyConflict,
                    required_actions: vec![
                        "re-read the trade state and retry the transition".to_string(),
                    ],
                }))
            }
            other => other,
        }
    }

    async fn execute_once(
        &self,
        trade_id: TradeId,
        target: TradeStage,
        metadata: TransitionMetadata,
    ) -> ApplicationResult<TransitionOutcome> {
        let _guard = self
            .locks
            .try_acquire(trade_id)
            .await
            .ok_or_else(|| ApplicationError::ConcurrencyConflict(trade_id.to_string()))?;

        let stored = self
            .store
            .get_trade(&trade_id)
            .await?
            .ok_or_else(|| ApplicationError::TradeNotFound(trade_id.to_string()))?;
        let from_stage = stored.stage();

        // Stage-graph legality, before any guard is consulted.
        if !from_stage.can_transition_to(target) {
            let event = TransitionEvent::blocked(
                trade_id,
                from_stage,
                target,
                ReasonCode::InvalidTransition,
                metadata.actor.clone(),
            );
            self.store.append_event(event).await?;
            let legal = from_stage
                .valid_transitions()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            let hint = if legal.is_empty() {
                format!("trade is {from_stage}; no further transitions are legal")
            } else {
                format!("request one of: {legal}")
            };
            return Ok(TransitionOutcome::Rejected(Rejection {
                reason_code: ReasonCode::InvalidTransition,
                required_actions: vec![hint],
            }));
        }

        let escrow = self
            .store
            .get_escrow(&trade_id)
            .await?
            .ok_or_else(|| ApplicationError::EscrowNotFound(trade_id.to_string()))?;

        let quote = match metadata.quote_id {
            Some(quote_id) => self.store.get_quote(&quote_id).await?,
            None => None,
        };

        if let GuardResult::Fail(failure) = self
            .guards
            .evaluate(&stored, target, quote.as_ref(), &escrow)
            .await
        {
            warn!(
                trade_id = %trade_id,
                target = %target,
                reason = %failure.reason_code,
                "transition blocked by guard"
            );
            let event = TransitionEvent::blocked(
                trade_id,
                from_stage,
                target,
                failure.reason_code,
                metadata.actor.clone(),
            );
            self.store.append_event(event).await?;
            return Ok(TransitionOutcome::Rejected(failure.into()));
        }

        // Guards passed: compute the full effect set before committing.
        let expected_version = stored.version();
        let mut trade = stored;
        trade.transition_to(target)?;
        if target == TradeStage::Contracted && trade.trade_type() == TradeType::Rfq {
            if let Some(quote) = &quote {
                trade.select_quote(quote.id())?;
            }
        }

        let mut escrow = escrow;
        let planned = plan_releases(&trade, &escrow, target)?;
        if !planned.is_empty() {
            if let Err(error) = self.escrow_ledger.execute_releases(&mut escrow, &planned).await {
                return match error {
                    ApplicationError::Collaborator(cause) => {
                        warn!(
                            trade_id = %trade_id,
                            target = %target,
                            error = %cause,
                            "escrow custodian call failed; transition blocked"
                        );
                        let event = TransitionEvent::blocked(
                            trade_id,
                            from_stage,
                            target,
                            ReasonCode::ExternalTimeout,
                            metadata.actor.clone(),
                        );
                        self.store.append_event(event).await?;
                        Ok(TransitionOutcome::Rejected(Rejection {
                            reason_code: ReasonCode::ExternalTimeout,
                            required_actions: vec![format!(
                                "escrow custodian call failed ({cause}); retry the transition"
                            )],
                        }))
                    }
                    other => Err(other),
                };
            }
        }

        let event = TransitionEvent::success(trade_id, from_stage, target, metadata.actor.clone());
        self.store
            .commit_transition(expected_version, &trade, &escrow, event)
            .await
            .map_err(|error| {
                if error.is_version_conflict() {
                    ApplicationError::ConcurrencyConflict(trade_id.to_string())
                } else {
                    ApplicationError::Store(error)
                }
            })?;

        info!(
            trade_id = %trade_id,
            from = %from_stage,
            to = %target,
            "transition committed"
        );

        let notice = TransitionNotice {
            trade_id,
            from_stage,
            to_stage: target,
        };
        if let Err(error) = self.notifier.notify(notice).await {
            warn!(trade_id = %trade_id, error = %error, "transition notice delivery failed");
        }

        Ok(TransitionOutcome::Completed { trade })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::escrow::EscrowAccount;
    use crate::domain::entities::quote::{Incoterms, Quote};
    use crate::domain::value_objects::compliance::{
        Certificate, CertificateType, ComplianceProfile, KycStatus,
    };
    use crate::domain::value_objects::money::{Currency, Money};
    use crate::domain::value_objects::timestamp::Timestamp;
    use crate::infrastructure::collaborators::compliance::StaticComplianceProvider;
    use crate::infrastructure::collaborators::custodian::InMemoryCustodian;
    use crate::infrastructure::collaborators::notifier::RecordingNotifier;
    use crate::infrastructure::persistence::in_memory::store::InMemoryKernelStore;
    use rust_decimal::Decimal;
    use std::time::Duration;

    fn usd(value: i64) -> Money {
        Money::new(Decimal::new(value, 0), Currency::new("USD").unwrap()).unwrap()
    }

    struct Harness {
        engine: TransitionEngine,
        store: Arc<InMemoryKernelStore>,
        notifier: Arc<RecordingNotifier>,
        trade_id: TradeId,
    }

    async fn verified_profiles(provider: &StaticComplianceProvider) {
        for party in ["BUYER_1", "SELLER_1"] {
            provider
                .put(ComplianceProfile::new(
                    PartyId::new(party),
                    KycStatus::Verified,
                    vec![Certificate::new(
                        CertificateType::PreferentialOrigin,
                        Timestamp::now().add_secs(86_400),
                    )],
                ))
                .await;
        }
    }

    async fn harness() -> Harness {
        let provider = StaticComplianceProvider::new();
        verified_profiles(&provider).await;
        harness_with(provider, InMemoryCustodian::new()).await
    }

    async fn harness_with(
        provider: StaticComplianceProvider,
        custodian: InMemoryCustodian,
    ) -> Harness {
        let store = Arc::new(InMemoryKernelStore::new());
        let trade = Trade::new_rfq(
            PartyId::new("BUYER_1"),
            PartyId::new("SELLER_1"),
            usd(5_000),
            "cocoa-beans-001",
            100,
        )
        .unwrap();
        let escrow = EscrowAccount::new(trade.id(), trade.total().currency().clone());
        let trade_id = trade.id();
        store.insert_trade(&trade, &escrow).await.unwrap();

        let locks = Arc::new(TradeLocks::new());
        let custodian = Arc::new(custodian);
        let notifier = Arc::new(RecordingNotifier::new());
        let engine = TransitionEngine::new(
            store.clone(),
            GuardEvaluator::new(Arc::new(provider), Duration::from_millis(200)),
            EscrowLedger::new(
                store.clone(),
                custodian,
                locks.clone(),
                Duration::from_millis(200),
            ),
            notifier.clone(),
            locks,
        );

        Harness {
            engine,
            store,
            notifier,
            trade_id,
        }
    }

    fn metadata() -> TransitionMetadata {
        TransitionMetadata::new(PartyId::new("BUYER_1"))
    }

    async fn accepted_quote(harness: &Harness) -> QuoteId {
        let mut quote = Quote::new(
            harness.trade_id,
            PartyId::new("SELLER_1"),
            usd(50),
            usd(5_000),
            14,
            Incoterms::Fob,
        );
        quote.accept().unwrap();
        let id = quote.id();
        harness.store.save_quote(&quote).await.unwrap();
        id
    }

    async fn advance(harness: &Harness, target: TradeStage, metadata: TransitionMetadata) {
        let outcome = harness
            .engine
            .transition(harness.trade_id, target, metadata)
            .await
            .unwrap();
        assert!(outcome.is_completed(), "expected {target} to commit");
    }

    #[tokio::test]
    async fn legal_spine_advance_commits() {
        let h = harness().await;

        let outcome = h
            .engine
            .transition(h.trade_id, TradeStage::Quoted, metadata())
            .await
            .unwrap();

        assert!(outcome.is_completed());
        let trade = h.store.get_trade(&h.trade_id).await.unwrap().unwrap();
        assert_eq!(trade.stage(), TradeStage::Quoted);

        let tail = h.store.tail(&h.trade_id, 10).await.unwrap();
        assert_eq!(tail.len(), 1);
        assert!(tail[0].event.is_success());
    }

    #[tokio::test]
    async fn stage_skip_is_rejected_and_audited() {
        let h = harness().await;

        let outcome = h
            .engine
            .transition(h.trade_id, TradeStage::Settled, metadata())
            .await
            .unwrap();

        let rejection = outcome.rejection().unwrap();
        assert_eq!(rejection.reason_code, ReasonCode::InvalidTransition);

        let trade = h.store.get_trade(&h.trade_id).await.unwrap().unwrap();
        assert_eq!(trade.stage(), TradeStage::RfqOpen);

        let tail = h.store.tail(&h.trade_id, 10).await.unwrap();
        assert_eq!(tail.len(), 1);
        assert_eq!(
            tail[0].event.reason_code(),
            Some(ReasonCode::InvalidTransition)
        );
    }

    #[tokio::test]
    async fn idempotent_target_is_invalid() {
        let h = harness().await;

        let outcome = h
            .engine
            .transition(h.trade_id, TradeStage::RfqOpen, metadata())
            .await
            .unwrap();

        assert_eq!(
            outcome.rejection().unwrap().reason_code,
            ReasonCode::InvalidTransition
        );
        let trade = h.store.get_trade(&h.trade_id).await.unwrap().unwrap();
        assert_eq!(trade.stage(), TradeStage::RfqOpen);
        assert_eq!(trade.version(), 1);
    }

    #[tokio::test]
    async fn contracted_requires_quote() {
        let h = harness().await;
        advance(&h, TradeStage::Quoted, metadata()).await;

        let outcome = h
            .engine
            .transition(h.trade_id, TradeStage::Contracted, metadata())
            .await
            .unwrap();

        assert_eq!(
            outcome.rejection().unwrap().reason_code,
            ReasonCode::QuoteRequired
        );
    }

    #[tokio::test]
    async fn contracted_with_accepted_quote_records_selection() {
        let h = harness().await;
        advance(&h, TradeStage::Quoted, metadata()).await;
        let quote_id = accepted_quote(&h).await;

        let outcome = h
            .engine
            .transition(
                h.trade_id,
                TradeStage::Contracted,
                metadata().with_quote(quote_id),
            )
            .await
            .unwrap();

        assert!(outcome.is_completed());
        let trade = h.store.get_trade(&h.trade_id).await.unwrap().unwrap();
        assert_eq!(trade.stage(), TradeStage::Contracted);
        assert_eq!(trade.details().selected_quote(), Some(quote_id));
    }

    #[tokio::test]
    async fn unverified_party_blocks_everything_past_rfq_open() {
        let provider = StaticComplianceProvider::new();
        provider
            .put(ComplianceProfile::new(
                PartyId::new("BUYER_1"),
                KycStatus::Pending,
                Vec::new(),
            ))
            .await;
        provider
            .put(ComplianceProfile::new(
                PartyId::new("SELLER_1"),
                KycStatus::Verified,
                Vec::new(),
            ))
            .await;
        let h = harness_with(provider, InMemoryCustodian::new()).await;

        let outcome = h
            .engine
            .transition(h.trade_id, TradeStage::Quoted, metadata())
            .await
            .unwrap();

        assert_eq!(
            outcome.rejection().unwrap().reason_code,
            ReasonCode::CompliancePending
        );
        let trade = h.store.get_trade(&h.trade_id).await.unwrap().unwrap();
        assert_eq!(trade.stage(), TradeStage::RfqOpen);
    }

    #[tokio::test]
    async fn escrow_funded_requires_hold() {
        let h = harness().await;
        advance(&h, TradeStage::Quoted, metadata()).await;
        let quote_id = accepted_quote(&h).await;
        advance(&h, TradeStage::Contracted, metadata().with_quote(quote_id)).await;
        advance(&h, TradeStage::EscrowRequired, metadata()).await;

        let outcome = h
            .engine
            .transition(h.trade_id, TradeStage::EscrowFunded, metadata())
            .await
            .unwrap();

        assert_eq!(
            outcome.rejection().unwrap().reason_code,
            ReasonCode::FundingRequired
        );
    }

    #[tokio::test]
    async fn full_walk_releases_escrow_in_lockstep() {
        let h = harness().await;
        advance(&h, TradeStage::Quoted, metadata()).await;
        let quote_id = accepted_quote(&h).await;
        advance(&h, TradeStage::Contracted, metadata().with_quote(quote_id)).await;
        advance(&h, TradeStage::EscrowRequired, metadata()).await;

        // Fund the escrow through the ledger path.
        let mut escrow = h.store.get_escrow(&h.trade_id).await.unwrap().unwrap();
        escrow.hold(usd(5_000)).unwrap();
        h.store.save_escrow(&escrow).await.unwrap();

        advance(&h, TradeStage::EscrowFunded, metadata()).await;
        advance(&h, TradeStage::Production, metadata()).await;
        advance(&h, TradeStage::PickupScheduled, metadata()).await;

        // Entering in_transit releases 30%.
        advance(&h, TradeStage::InTransit, metadata()).await;
        let escrow = h.store.get_escrow(&h.trade_id).await.unwrap().unwrap();
        assert_eq!(escrow.released().amount(), Decimal::new(1_500, 0));

        advance(&h, TradeStage::Delivered, metadata()).await;

        // Settlement releases the remainder.
        advance(&h, TradeStage::Settled, metadata()).await;
        let escrow = h.store.get_escrow(&h.trade_id).await.unwrap().unwrap();
        assert!(escrow.is_fully_released());
        assert_eq!(escrow.released().amount(), Decimal::new(5_000, 0));

        let trade = h.store.get_trade(&h.trade_id).await.unwrap().unwrap();
        assert!(trade.is_terminal());
    }

    #[tokio::test]
    async fn custodian_failure_blocks_release_stage() {
        let provider = StaticComplianceProvider::new();
        verified_profiles(&provider).await;
        let h = harness_with(provider, InMemoryCustodian::new().failing()).await;

        advance(&h, TradeStage::Quoted, metadata()).await;
        let quote_id = accepted_quote(&h).await;
        advance(&h, TradeStage::Contracted, metadata().with_quote(quote_id)).await;
        advance(&h, TradeStage::EscrowRequired, metadata()).await;

        let mut escrow = h.store.get_escrow(&h.trade_id).await.unwrap().unwrap();
        escrow.hold(usd(5_000)).unwrap();
        h.store.save_escrow(&escrow).await.unwrap();

        advance(&h, TradeStage::EscrowFunded, metadata()).await;
        advance(&h, TradeStage::Production, metadata()).await;
        advance(&h, TradeStage::PickupScheduled, metadata()).await;

        // The in_transit release hits the failing custodian.
        let outcome = h
            .engine
            .transition(h.trade_id, TradeStage::InTransit, metadata())
            .await
            .unwrap();

        assert_eq!(
            outcome.rejection().unwrap().reason_code,
            ReasonCode::ExternalTimeout
        );
        let trade = h.store.get_trade(&h.trade_id).await.unwrap().unwrap();
        assert_eq!(trade.stage(), TradeStage::PickupScheduled);
        let escrow = h.store.get_escrow(&h.trade_id).await.unwrap().unwrap();
        assert!(escrow.released().is_zero());
    }

    #[tokio::test]
    async fn success_emits_notice() {
        let h = harness().await;

        advance(&h, TradeStage::Quoted, metadata()).await;

        let notices = h.notifier.notices().await;
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].from_stage, TradeStage::RfqOpen);
        assert_eq!(notices[0].to_stage, TradeStage::Quoted);
    }

    #[tokio::test]
    async fn blocked_attempt_emits_no_notice() {
        let h = harness().await;

        let _ = h
            .engine
            .transition(h.trade_id, TradeStage::Settled, metadata())
            .await
            .unwrap();

        assert!(h.notifier.notices().await.is_empty());
    }

    #[tokio::test]
    async fn concurrent_transitions_conflict() {
        let h = harness().await;

        // Hold the advisory lock so both engine calls lose, including
        // their automatic retry.
        let locks = Arc::new(TradeLocks::new());
        let engine = TransitionEngine {
            retry: RetryPolicy::no_retry(),
            locks: locks.clone(),
            ..h.engine.clone()
        };
        let _held = locks.try_acquire(h.trade_id).await.unwrap();

        let outcome = engine
            .transition(h.trade_id, TradeStage::Quoted, metadata())
            .await
            .unwrap();

        let rejection = outcome.rejection().unwrap();
        assert_eq!(rejection.reason_code, ReasonCode::ConcurrencyConflict);

        // The conflict is audited.
        let tail = h.store.tail(&h.trade_id, 10).await.unwrap();
        assert_eq!(
            tail[0].event.reason_code(),
            Some(ReasonCode::ConcurrencyConflict)
        );
    }

    #[tokio::test]
    async fn exactly_one_of_two_racing_transitions_wins() {
        let h = harness().await;
        let engine_a = h.engine.clone();
        let engine_b = h.engine.clone();
        let trade_id = h.trade_id;

        let (a, b) = tokio::join!(
            engine_a.transition(trade_id, TradeStage::Quoted, metadata()),
            engine_b.transition(trade_id, TradeStage::Quoted, metadata()),
        );

        let a = a.unwrap();
        let b = b.unwrap();
        let completed = [&a, &b].iter().filter(|o| o.is_completed()).count();
        assert_eq!(completed, 1, "exactly one racer must win");

        let trade = h.store.get_trade(&h.trade_id).await.unwrap().unwrap();
        assert_eq!(trade.stage(), TradeStage::Quoted);
    }

    #[tokio::test]
    async fn unknown_trade_is_an_error() {
        let h = harness().await;

        let result = h
            .engine
            .transition(TradeId::new_v4(), TradeStage::Quoted, metadata())
            .await;

        assert!(matches!(result, Err(ApplicationError::TradeNotFound(_))));
    }
}
