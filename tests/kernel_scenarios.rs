//! End-to-end lifecycle scenarios against the in-memory wiring.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use trade_kernel::application::services::escrow_ledger::EscrowLedger;
use trade_kernel::application::services::guard_evaluator::GuardEvaluator;
use trade_kernel::application::services::locks::TradeLocks;
use trade_kernel::application::use_cases::get_trade_state::GetTradeState;
use trade_kernel::application::use_cases::transition_trade::{
    TransitionEngine, TransitionMetadata, TransitionOutcome,
};
use trade_kernel::domain::entities::quote::{Incoterms, Quote};
use trade_kernel::domain::entities::trade::Trade;
use trade_kernel::domain::value_objects::compliance::{
    Certificate, CertificateType, ComplianceProfile, KycStatus,
};
use trade_kernel::domain::value_objects::ids::{PartyId, QuoteId, TradeId};
use trade_kernel::domain::value_objects::money::{Currency, Money};
use trade_kernel::domain::value_objects::reason::ReasonCode;
use trade_kernel::domain::value_objects::stage::TradeStage;
use trade_kernel::domain::value_objects::timestamp::Timestamp;
use trade_kernel::domain::entities::escrow::EscrowAccount;
use trade_kernel::infrastructure::collaborators::compliance::StaticComplianceProvider;
use trade_kernel::infrastructure::collaborators::custodian::InMemoryCustodian;
use trade_kernel::infrastructure::collaborators::notifier::RecordingNotifier;
use trade_kernel::infrastructure::persistence::in_memory::InMemoryKernelStore;
use trade_kernel::infrastructure::persistence::traits::KernelStore;

const BUYER: &str = "BUYER_1";
const SELLER: &str = "SELLER_1";

fn usd(value: i64) -> Money {
    Money::new(Decimal::new(value, 0), Currency::new("USD").unwrap()).unwrap()
}

struct Kernel {
    engine: TransitionEngine,
    ledger: EscrowLedger,
    reader: GetTradeState,
    store: Arc<InMemoryKernelStore>,
    notifier: Arc<RecordingNotifier>,
    trade_id: TradeId,
}

impl Kernel {
    async fn with_verified_parties() -> Self {
        let provider = StaticComplianceProvider::new();
        for party in [BUYER, SELLER] {
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
        Self::build(provider).await
    }

    async fn with_pending_buyer() -> Self {
        let provider = StaticComplianceProvider::new();
        provider
            .put(ComplianceProfile::new(
                PartyId::new(BUYER),
                KycStatus::Pending,
                Vec::new(),
            ))
            .await;
        provider
            .put(ComplianceProfile::new(
                PartyId::new(SELLER),
                KycStatus::Verified,
                Vec::new(),
            ))
            .await;
        Self::build(provider).await
    }

    async fn build(provider: StaticComplianceProvider) -> Self {
        let store = Arc::new(InMemoryKernelStore::new());
        let trade = Trade::new_rfq(
            PartyId::new(BUYER),
            PartyId::new(SELLER),
            usd(5_000),
            "cocoa-beans-001",
            100,
        )
        .unwrap();
        let escrow = EscrowAccount::new(trade.id(), trade.total().currency().clone());
        let trade_id = trade.id();
        store.insert_trade(&trade, &escrow).await.unwrap();

        let locks = Arc::new(TradeLocks::new());
        let guards = GuardEvaluator::new(Arc::new(provider), Duration::from_millis(200));
        let ledger = EscrowLedger::new(
            store.clone(),
            Arc::new(InMemoryCustodian::new()),
            locks.clone(),
            Duration::from_millis(200),
        );
        let notifier = Arc::new(RecordingNotifier::new());
        let engine = TransitionEngine::new(
            store.clone(),
            guards.clone(),
            ledger.clone(),
            notifier.clone(),
            locks,
        );
        let reader = GetTradeState::new(store.clone(), guards);

        Self {
            engine,
            ledger,
            reader,
            store,
            notifier,
            trade_id,
        }
    }

    fn metadata(&self) -> TransitionMetadata {
        TransitionMetadata::new(PartyId::new(BUYER))
    }

    async fn submit_accepted_quote(&self) -> QuoteId {
        let mut quote = Quote::new(
            self.trade_id,
            PartyId::new(SELLER),
            usd(50),
            usd(5_000),
            14,
            Incoterms::Fob,
        );
        quote.accept().unwrap();
        let id = quote.id();
        self.store.save_quote(&quote).await.unwrap();
        id
    }

    async fn transition(&self, target: TradeStage, metadata: TransitionMetadata) -> TransitionOutcome {
        self.engine
            .transition(self.trade_id, target, metadata)
            .await
            .unwrap()
    }

    async fn advance(&self, target: TradeStage) {
        let outcome = self.transition(target, self.metadata()).await;
        assert!(
            outcome.is_completed(),
            "expected {target} to commit, got {:?}",
            outcome.rejection()
        );
    }

    async fn trade(&self) -> Trade {
        self.store
            .get_trade(&self.trade_id)
            .await
            .unwrap()
            .unwrap()
    }

    async fn escrow(&self) -> EscrowAccount {
        self.store
            .get_escrow(&self.trade_id)
            .await
            .unwrap()
            .unwrap()
    }
}

/// Contracting against an accepted quote succeeds; funding without a
/// prior hold is blocked.
#[tokio::test]
async fn contract_then_unfunded_escrow_is_blocked() {
    let kernel = Kernel::with_verified_parties().await;

    kernel.advance(TradeStage::Quoted).await;
    let quote_id = kernel.submit_accepted_quote().await;

    let outcome = kernel
        .transition(
            TradeStage::Contracted,
            kernel.metadata().with_quote(quote_id),
        )
        .await;
    assert!(outcome.is_completed());
    assert_eq!(kernel.trade().await.stage(), TradeStage::Contracted);

    kernel.advance(TradeStage::EscrowRequired).await;

    let outcome = kernel
        .transition(TradeStage::EscrowFunded, kernel.metadata())
        .await;
    let rejection = outcome.rejection().expect("funding gate must block");
    assert_eq!(rejection.reason_code, ReasonCode::FundingRequired);
    assert_eq!(kernel.trade().await.stage(), TradeStage::EscrowRequired);
}

/// After a full hold, escrow_funded commits with the amount held and
/// nothing released.
#[tokio::test]
async fn hold_then_escrow_funded() {
    let kernel = Kernel::with_verified_parties().await;

    kernel.advance(TradeStage::Quoted).await;
    let quote_id = kernel.submit_accepted_quote().await;
    kernel
        .transition(
            TradeStage::Contracted,
            kernel.metadata().with_quote(quote_id),
        )
        .await;
    kernel.advance(TradeStage::EscrowRequired).await;

    let view = kernel.ledger.hold(kernel.trade_id, usd(5_000)).await.unwrap();
    assert_eq!(view.held_amount.amount(), Decimal::new(5_000, 0));

    kernel.advance(TradeStage::EscrowFunded).await;

    let escrow = kernel.escrow().await;
    assert_eq!(escrow.held().amount(), Decimal::new(5_000, 0));
    assert!(escrow.released().is_zero());
}

/// Entering in_transit releases 30%, settling releases the remainder.
#[tokio::test]
async fn milestone_releases_in_lockstep() {
    let kernel = Kernel::with_verified_parties().await;

    kernel.advance(TradeStage::Quoted).await;
    let quote_id = kernel.submit_accepted_quote().await;
    kernel
        .transition(
            TradeStage::Contracted,
            kernel.metadata().with_quote(quote_id),
        )
        .await;
    kernel.advance(TradeStage::EscrowRequired).await;
    kernel.ledger.hold(kernel.trade_id, usd(5_000)).await.unwrap();
    kernel.advance(TradeStage::EscrowFunded).await;
    kernel.advance(TradeStage::Production).await;
    kernel.advance(TradeStage::PickupScheduled).await;

    kernel.advance(TradeStage::InTransit).await;
    let escrow = kernel.escrow().await;
    assert_eq!(escrow.released().amount(), Decimal::new(1_500, 0));

    kernel.advance(TradeStage::Delivered).await;
    kernel.advance(TradeStage::Settled).await;

    let escrow = kernel.escrow().await;
    assert_eq!(escrow.released().amount(), Decimal::new(5_000, 0));
    assert_eq!(escrow.released(), escrow.held());
    assert!(kernel.trade().await.is_terminal());
}

/// Of two concurrent transitions on one trade, exactly one commits.
#[tokio::test]
async fn exactly_one_concurrent_writer_wins() {
    let kernel = Kernel::with_verified_parties().await;
    let engine_a = kernel.engine.clone();
    let engine_b = kernel.engine.clone();
    let trade_id = kernel.trade_id;

    let (a, b) = tokio::join!(
        engine_a.transition(
            trade_id,
            TradeStage::Quoted,
            TransitionMetadata::new(PartyId::new(BUYER)),
        ),
        engine_b.transition(
            trade_id,
            TradeStage::Quoted,
            TransitionMetadata::new(PartyId::new(SELLER)),
        ),
    );

    let outcomes = [a.unwrap(), b.unwrap()];
    let winners = outcomes.iter().filter(|o| o.is_completed()).count();
    assert_eq!(winners, 1, "exactly one concurrent transition must win");

    assert_eq!(kernel.trade().await.stage(), TradeStage::Quoted);
    assert_eq!(kernel.trade().await.version(), 2);
}

#[tokio::test]
async fn compliance_gating_blocks_everything_past_rfq_open() {
    let kernel = Kernel::with_pending_buyer().await;

    let outcome = kernel
        .transition(TradeStage::Quoted, kernel.metadata())
        .await;
    let rejection = outcome.rejection().unwrap();
    assert_eq!(rejection.reason_code, ReasonCode::CompliancePending);
    assert!(!rejection.required_actions.is_empty());

    let trade = kernel.trade().await;
    assert_eq!(trade.stage(), TradeStage::RfqOpen);
    assert_eq!(trade.version(), 1);
}

#[tokio::test]
async fn idempotent_target_returns_invalid_transition_and_changes_nothing() {
    let kernel = Kernel::with_verified_parties().await;

    let before = kernel.trade().await;
    let outcome = kernel
        .transition(TradeStage::RfqOpen, kernel.metadata())
        .await;

    assert_eq!(
        outcome.rejection().unwrap().reason_code,
        ReasonCode::InvalidTransition
    );
    let after = kernel.trade().await;
    assert_eq!(after.stage(), before.stage());
    assert_eq!(after.version(), before.version());
}

#[tokio::test]
async fn missing_certificate_blocks_release_stages_but_not_logistics() {
    let provider = StaticComplianceProvider::new();
    for party in [BUYER, SELLER] {
        provider
            .put(ComplianceProfile::new(
                PartyId::new(party),
                KycStatus::Verified,
                Vec::new(), // no certificates on file
            ))
            .await;
    }
    let kernel = Kernel::build(provider).await;

    kernel.advance(TradeStage::Quoted).await;
    let quote_id = kernel.submit_accepted_quote().await;
    kernel
        .transition(
            TradeStage::Contracted,
            kernel.metadata().with_quote(quote_id),
        )
        .await;
    kernel.advance(TradeStage::EscrowRequired).await;
    kernel.ledger.hold(kernel.trade_id, usd(5_000)).await.unwrap();
    kernel.advance(TradeStage::EscrowFunded).await;

    // Logistics stages stay reachable without the certificate.
    kernel.advance(TradeStage::Production).await;
    kernel.advance(TradeStage::PickupScheduled).await;
    kernel.advance(TradeStage::InTransit).await;

    // Delivery is blocked until the document is on file.
    let outcome = kernel
        .transition(TradeStage::Delivered, kernel.metadata())
        .await;
    assert_eq!(
        outcome.rejection().unwrap().reason_code,
        ReasonCode::CertificateMissing
    );
    assert_eq!(kernel.trade().await.stage(), TradeStage::InTransit);
}

#[tokio::test]
async fn audit_ledger_answers_why_is_this_stuck() {
    let kernel = Kernel::with_verified_parties().await;

    // A blocked skip, a success, a blocked guard.
    kernel
        .transition(TradeStage::Settled, kernel.metadata())
        .await;
    kernel.advance(TradeStage::Quoted).await;
    kernel
        .transition(TradeStage::Contracted, kernel.metadata())
        .await;

    let tail = kernel.store.tail(&kernel.trade_id, 10).await.unwrap();
    assert_eq!(tail.len(), 3);

    // Most recent first, strictly decreasing sequence.
    assert!(tail[0].sequence > tail[1].sequence);
    assert!(tail[1].sequence > tail[2].sequence);

    assert_eq!(tail[0].event.reason_code(), Some(ReasonCode::QuoteRequired));
    assert!(tail[1].event.is_success());
    assert_eq!(
        tail[2].event.reason_code(),
        Some(ReasonCode::InvalidTransition)
    );
}

#[tokio::test]
async fn notices_are_emitted_for_successes_only() {
    let kernel = Kernel::with_verified_parties().await;

    kernel
        .transition(TradeStage::Settled, kernel.metadata())
        .await; // blocked
    kernel.advance(TradeStage::Quoted).await; // success
    kernel.advance(TradeStage::Disputed).await; // success (escape)

    let notices = kernel.notifier.notices().await;
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[0].to_stage, TradeStage::Quoted);
    assert_eq!(notices[1].to_stage, TradeStage::Disputed);
}

#[tokio::test]
async fn dispute_resolves_to_terminal() {
    let kernel = Kernel::with_verified_parties().await;

    kernel.advance(TradeStage::Quoted).await;
    kernel.advance(TradeStage::Disputed).await;
    kernel.advance(TradeStage::DisputedResolved).await;

    let trade = kernel.trade().await;
    assert!(trade.is_terminal());

    // Nothing is legal from a terminal stage.
    let outcome = kernel
        .transition(TradeStage::Cancelled, kernel.metadata())
        .await;
    assert_eq!(
        outcome.rejection().unwrap().reason_code,
        ReasonCode::InvalidTransition
    );
}

#[tokio::test]
async fn read_api_snapshot_matches_kernel_state() {
    let kernel = Kernel::with_verified_parties().await;
    kernel.advance(TradeStage::Quoted).await;

    let view = kernel.reader.read(kernel.trade_id).await.unwrap();
    assert_eq!(view.trade.stage(), TradeStage::Quoted);
    assert_eq!(view.projection.current_stage_index, Some(1));
    assert_eq!(view.audit_tail.len(), 1);

    // Next recommended action reflects the first failing guard: the
    // contracted move needs a quote.
    let action = view.projection.next_action.unwrap();
    assert_eq!(action.reason_code, Some(ReasonCode::QuoteRequired));
}
