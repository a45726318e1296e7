//! # Guard Evaluator
//!
//! Stateless precondition checks for stage transitions.
//!
//! The evaluator runs the ordered gates relevant to the destination
//! stage and short-circuits on the first failure, so the caller gets one
//! actionable cause instead of an exhaustive list:
//!
//! 1. **Compliance gate**: both parties KYC-verified, required for every
//!    spine advance past `rfq_open`.
//! 2. **Quote-selection gate**: `contracted` requires an accepted quote
//!    for RFQ trades.
//! 3. **Funding gate**: `escrow_funded` requires the full amount on
//!    hold.
//! 4. **Document gate**: `delivered` and `settled` require an unexpired
//!    preferential-origin certificate; earlier logistics stages stay
//!    reachable without it.
//!
//! Escape transitions (`cancelled`, `disputed`, `disputed_resolved`)
//! bypass the gates: a party must always be able to pull the cord.
//!
//! Collaborator lookups run under a bounded timeout; a timeout blocks
//! the transition with `EXTERNAL_TIMEOUT`, never an implicit pass.

use crate::application::error::CollaboratorError;
use crate::domain::entities::quote::Quote;
use crate::domain::entities::trade::{Trade, TradeType};
use crate::domain::entities::escrow::EscrowAccount;
use crate::domain::value_objects::compliance::{CertificateType, ComplianceProfile};
use crate::domain::value_objects::ids::PartyId;
use crate::domain::value_objects::reason::ReasonCode;
use crate::domain::value_objects::stage::TradeStage;
use crate::domain::value_objects::timestamp::Timestamp;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Provider of party compliance profiles.
///
/// Implemented by the external compliance collaborator adapter; the
/// kernel only reads.
#[async_trait]
pub trait ComplianceProvider: Send + Sync + fmt::Debug {
    /// Fetches the compliance profile of a party.
    async fn profile(&self, party: &PartyId) -> Result<ComplianceProfile, CollaboratorError>;
}

/// A failed guard check: the reason and how to fix it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardFailure {
    /// Machine-readable cause.
    pub reason_code: ReasonCode,
    /// Short human-readable remediation hints.
    pub required_actions: Vec<String>,
}

impl GuardFailure {
    /// Creates a guard failure.
    #[must_use]
    pub fn new(reason_code: ReasonCode, required_actions: Vec<String>) -> Self {
        Self {
            reason_code,
            required_actions,
        }
    }
}

impl fmt::Display for GuardFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reason_code, self.required_actions.join("; "))
    }
}

/// Outcome of a guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardResult {
    /// All gates relevant to the destination stage passed.
    Pass,
    /// The first failing gate.
    Fail(GuardFailure),
}

impl GuardResult {
    /// Returns true if evaluation passed.
    #[inline]
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Returns the failure, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&GuardFailure> {
        match self {
            Self::Pass => None,
            Self::Fail(failure) => Some(failure),
        }
    }
}

/// Stateless evaluator of transition preconditions.
///
/// Holds no trade state of its own: every evaluation is a pure function
/// of the trade, the destination stage, and collaborator data fetched at
/// call time.
#[derive(Debug, Clone)]
pub struct GuardEvaluator {
    compliance: Arc<dyn ComplianceProvider>,
    call_timeout: Duration,
}

impl GuardEvaluator {
    /// Creates an evaluator with the given compliance provider and
    /// per-call timeout.
    #[must_use]
    pub fn new(compliance: Arc<dyn ComplianceProvider>, call_timeout: Duration) -> Self {
        Self {
            compliance,
            call_timeout,
        }
    }

    /// Evaluates the gates for moving `trade` to `target`.
    ///
    /// `quote` is the resolved quote referenced by the transition
    /// metadata, if any; the engine resolves it so the evaluator stays
    /// free of store access.
    pub async fn evaluate(
        &self,
        trade: &Trade,
        target: TradeStage,
        quote: Option<&Quote>,
        escrow: &EscrowAccount,
    ) -> GuardResult {
        // Escape branches bypass the gates.
        let Some(target_index) = target.spine_index() else {
            return GuardResult::Pass;
        };
        if target_index == 0 {
            return GuardResult::Pass;
        }

        // 1. Compliance gate
        let buyer = match self.fetch_profile(trade.buyer()).await {
            Ok(profile) => profile,
            Err(failure) => return GuardResult::Fail(failure),
        };
        let seller = match self.fetch_profile(trade.seller()).await {
            Ok(profile) => profile,
            Err(failure) => return GuardResult::Fail(failure),
        };
        for (role, profile) in [("buyer", &buyer), ("seller", &seller)] {
            if !profile.kyc_status().is_verified() {
                return GuardResult::Fail(GuardFailure::new(
                    ReasonCode::CompliancePending,
                    vec![format!(
                        "complete KYC verification for {role} {}",
                        profile.party_id()
                    )],
                ));
            }
        }

        // 2. Quote-selection gate
        if target == TradeStage::Contracted && trade.trade_type() == TradeType::Rfq {
            if let Some(failure) = Self::check_quote(trade, quote) {
                return GuardResult::Fail(failure);
            }
        }

        // 3. Funding gate
        if target == TradeStage::EscrowFunded && escrow.held() != trade.total() {
            return GuardResult::Fail(GuardFailure::new(
                ReasonCode::FundingRequired,
                vec![format!("place an escrow hold of {}", trade.total())],
            ));
        }

        // 4. Document gate
        if target.is_release_affecting()
            && !seller.has_valid_certificate(CertificateType::PreferentialOrigin, Timestamp::now())
        {
            return GuardResult::Fail(GuardFailure::new(
                ReasonCode::CertificateMissing,
                vec![format!(
                    "upload a valid preferential-origin certificate for seller {}",
                    trade.seller()
                )],
            ));
        }

        GuardResult::Pass
    }

    fn check_quote(trade: &Trade, quote: Option<&Quote>) -> Option<GuardFailure> {
        let Some(quote) = quote else {
            return Some(GuardFailure::new(
                ReasonCode::QuoteRequired,
                vec!["reference an accepted quote in the transition metadata".to_string()],
            ));
        };
        if quote.trade_id() != trade.id() {
            return Some(GuardFailure::new(
                ReasonCode::QuoteRequired,
                vec![format!("quote {} does not belong to this trade", quote.id())],
            ));
        }
        if !quote.is_accepted() {
            return Some(GuardFailure::new(
                ReasonCode::QuoteRequired,
                vec![format!(
                    "quote {} must be accepted before contracting",
                    quote.id()
                )],
            ));
        }
        if quote.total_price() != trade.total() {
            return Some(GuardFailure::new(
                ReasonCode::QuoteRequired,
                vec![format!(
                    "quote total {} does not match the trade total {}",
                    quote.total_price(),
                    trade.total()
                )],
            ));
        }
        None
    }

    async fn fetch_profile(&self, party: &PartyId) -> Result<ComplianceProfile, GuardFailure> {
        match tokio::time::timeout(self.call_timeout, self.compliance.profile(party)).await {
            Ok(Ok(profile)) => Ok(profile),
            Ok(Err(error)) => Err(GuardFailure::new(
                ReasonCode::ExternalTimeout,
                vec![format!(
                    "compliance lookup for {party} failed ({error}); retry the transition"
                )],
            )),
            Err(_) => Err(GuardFailure::new(
                ReasonCode::ExternalTimeout,
                vec![format!(
                    "compliance lookup for {party} timed out; retry the transition"
                )],
            )),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::quote::Incoterms;
    use crate::domain::value_objects::compliance::{Certificate, KycStatus};
    use crate::domain::value_objects::money::{Currency, Money};
    use rust_decimal::Decimal;
    use std::collections::HashMap;

    #[derive(Debug, Default)]
    struct StaticCompliance {
        profiles: HashMap<String, ComplianceProfile>,
        delay: Option<Duration>,
    }

    impl StaticCompliance {
        fn verified_for(parties: &[&str]) -> Self {
            Self::with_status(parties, KycStatus::Verified, true)
        }

        fn with_status(parties: &[&str], kyc: KycStatus, with_certificate: bool) -> Self {
            let mut profiles = HashMap::new();
            for party in parties {
                let certificates = if with_certificate {
                    vec![Certificate::new(
                        CertificateType::PreferentialOrigin,
                        Timestamp::now().add_secs(86_400),
                    )]
                } else {
                    Vec::new()
                };
                profiles.insert(
                    (*party).to_string(),
                    ComplianceProfile::new(PartyId::new(*party), kyc, certificates),
                );
            }
            Self {
                profiles,
                delay: None,
            }
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }
    }

    #[async_trait]
    impl ComplianceProvider for StaticCompliance {
        async fn profile(&self, party: &PartyId) -> Result<ComplianceProfile, CollaboratorError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.profiles
                .get(party.as_str())
                .cloned()
                .ok_or_else(|| CollaboratorError::Unavailable(party.to_string()))
        }
    }

    fn usd(value: i64) -> Money {
        Money::new(Decimal::new(value, 0), Currency::new("USD").unwrap()).unwrap()
    }

    fn rfq_trade() -> Trade {
        Trade::new_rfq(
            PartyId::new("BUYER_1"),
            PartyId::new("SELLER_1"),
            usd(5_000),
            "cocoa-beans-001",
            100,
        )
        .unwrap()
    }

    fn empty_escrow(trade: &Trade) -> EscrowAccount {
        EscrowAccount::new(trade.id(), trade.total().currency().clone())
    }

    fn funded_escrow(trade: &Trade) -> EscrowAccount {
        let mut escrow = empty_escrow(trade);
        escrow.hold(trade.total().clone()).unwrap();
        escrow
    }

    fn accepted_quote(trade: &Trade) -> Quote {
        let mut quote = Quote::new(
            trade.id(),
            PartyId::new("SELLER_1"),
            usd(50),
            usd(5_000),
            14,
            Incoterms::Fob,
        );
        quote.accept().unwrap();
        quote
    }

    fn evaluator(provider: StaticCompliance) -> GuardEvaluator {
        GuardEvaluator::new(Arc::new(provider), Duration::from_millis(200))
    }

    mod compliance_gate {
        use super::*;

        #[tokio::test]
        async fn verified_parties_pass() {
            let trade = rfq_trade();
            let escrow = empty_escrow(&trade);
            let eval = evaluator(StaticCompliance::verified_for(&["BUYER_1", "SELLER_1"]));

            let result = eval
                .evaluate(&trade, TradeStage::Quoted, None, &escrow)
                .await;
            assert!(result.is_pass());
        }

        #[tokio::test]
        async fn pending_kyc_blocks_with_compliance_pending() {
            let trade = rfq_trade();
            let escrow = empty_escrow(&trade);
            let eval = evaluator(StaticCompliance::with_status(
                &["BUYER_1", "SELLER_1"],
                KycStatus::Pending,
                true,
            ));

            let result = eval
                .evaluate(&trade, TradeStage::Quoted, None, &escrow)
                .await;
            let failure = result.failure().unwrap();
            assert_eq!(failure.reason_code, ReasonCode::CompliancePending);
            assert!(!failure.required_actions.is_empty());
        }

        #[tokio::test]
        async fn rejected_kyc_blocks() {
            let trade = rfq_trade();
            let escrow = empty_escrow(&trade);
            let eval = evaluator(StaticCompliance::with_status(
                &["BUYER_1", "SELLER_1"],
                KycStatus::Rejected,
                true,
            ));

            let result = eval
                .evaluate(&trade, TradeStage::Quoted, None, &escrow)
                .await;
            assert_eq!(
                result.failure().unwrap().reason_code,
                ReasonCode::CompliancePending
            );
        }

        #[tokio::test]
        async fn escape_transitions_bypass_gates() {
            let trade = rfq_trade();
            let escrow = empty_escrow(&trade);
            // Unverified parties, yet cancel and dispute remain open.
            let eval = evaluator(StaticCompliance::with_status(
                &["BUYER_1", "SELLER_1"],
                KycStatus::Pending,
                false,
            ));

            for target in [TradeStage::Cancelled, TradeStage::Disputed] {
                let result = eval.evaluate(&trade, target, None, &escrow).await;
                assert!(result.is_pass(), "{target} should bypass gates");
            }
        }
    }

    mod quote_gate {
        use super::*;

        #[tokio::test]
        async fn missing_quote_blocks_contracted() {
            let mut trade = rfq_trade();
            trade.transition_to(TradeStage::Quoted).unwrap();
            let escrow = empty_escrow(&trade);
            let eval = evaluator(StaticCompliance::verified_for(&["BUYER_1", "SELLER_1"]));

            let result = eval
                .evaluate(&trade, TradeStage::Contracted, None, &escrow)
                .await;
            assert_eq!(
                result.failure().unwrap().reason_code,
                ReasonCode::QuoteRequired
            );
        }

        #[tokio::test]
        async fn accepted_quote_passes() {
            let mut trade = rfq_trade();
            trade.transition_to(TradeStage::Quoted).unwrap();
            let escrow = empty_escrow(&trade);
            let quote = accepted_quote(&trade);
            let eval = evaluator(StaticCompliance::verified_for(&["BUYER_1", "SELLER_1"]));

            let result = eval
                .evaluate(&trade, TradeStage::Contracted, Some(&quote), &escrow)
                .await;
            assert!(result.is_pass());
        }

        #[tokio::test]
        async fn submitted_quote_blocks() {
            let mut trade = rfq_trade();
            trade.transition_to(TradeStage::Quoted).unwrap();
            let escrow = empty_escrow(&trade);
            let quote = Quote::new(
                trade.id(),
                PartyId::new("SELLER_1"),
                usd(50),
                usd(5_000),
                14,
                Incoterms::Fob,
            );
            let eval = evaluator(StaticCompliance::verified_for(&["BUYER_1", "SELLER_1"]));

            let result = eval
                .evaluate(&trade, TradeStage::Contracted, Some(&quote), &escrow)
                .await;
            assert_eq!(
                result.failure().unwrap().reason_code,
                ReasonCode::QuoteRequired
            );
        }

        #[tokio::test]
        async fn foreign_quote_blocks() {
            let mut trade = rfq_trade();
            trade.transition_to(TradeStage::Quoted).unwrap();
            let escrow = empty_escrow(&trade);
            let other_trade = rfq_trade();
            let quote = accepted_quote(&other_trade);
            let eval = evaluator(StaticCompliance::verified_for(&["BUYER_1", "SELLER_1"]));

            let result = eval
                .evaluate(&trade, TradeStage::Contracted, Some(&quote), &escrow)
                .await;
            assert_eq!(
                result.failure().unwrap().reason_code,
                ReasonCode::QuoteRequired
            );
        }

        #[tokio::test]
        async fn mismatched_total_blocks() {
            let mut trade = rfq_trade();
            trade.transition_to(TradeStage::Quoted).unwrap();
            let escrow = empty_escrow(&trade);
            let mut quote = Quote::new(
                trade.id(),
                PartyId::new("SELLER_1"),
                usd(40),
                usd(4_000),
                14,
                Incoterms::Fob,
            );
            quote.accept().unwrap();
            let eval = evaluator(StaticCompliance::verified_for(&["BUYER_1", "SELLER_1"]));

            let result = eval
                .evaluate(&trade, TradeStage::Contracted, Some(&quote), &escrow)
                .await;
            assert_eq!(
                result.failure().unwrap().reason_code,
                ReasonCode::QuoteRequired
            );
        }
    }

    mod funding_gate {
        use super::*;

        #[tokio::test]
        async fn unfunded_escrow_blocks_escrow_funded() {
            let trade = rfq_trade();
            let escrow = empty_escrow(&trade);
            let eval = evaluator(StaticCompliance::verified_for(&["BUYER_1", "SELLER_1"]));

            let result = eval
                .evaluate(&trade, TradeStage::EscrowFunded, None, &escrow)
                .await;
            let failure = result.failure().unwrap();
            assert_eq!(failure.reason_code, ReasonCode::FundingRequired);
            assert!(failure.required_actions[0].contains("5000 USD"));
        }

        #[tokio::test]
        async fn full_hold_passes() {
            let trade = rfq_trade();
            let escrow = funded_escrow(&trade);
            let eval = evaluator(StaticCompliance::verified_for(&["BUYER_1", "SELLER_1"]));

            let result = eval
                .evaluate(&trade, TradeStage::EscrowFunded, None, &escrow)
                .await;
            assert!(result.is_pass());
        }

        #[tokio::test]
        async fn partial_hold_blocks() {
            let trade = rfq_trade();
            let mut escrow = empty_escrow(&trade);
            escrow.hold(usd(1_000)).unwrap();
            let eval = evaluator(StaticCompliance::verified_for(&["BUYER_1", "SELLER_1"]));

            let result = eval
                .evaluate(&trade, TradeStage::EscrowFunded, None, &escrow)
                .await;
            assert_eq!(
                result.failure().unwrap().reason_code,
                ReasonCode::FundingRequired
            );
        }
    }

    mod document_gate {
        use super::*;

        #[tokio::test]
        async fn missing_certificate_blocks_delivered_and_settled() {
            let trade = rfq_trade();
            let escrow = funded_escrow(&trade);
            let eval = evaluator(StaticCompliance::with_status(
                &["BUYER_1", "SELLER_1"],
                KycStatus::Verified,
                false,
            ));

            for target in [TradeStage::Delivered, TradeStage::Settled] {
                let result = eval.evaluate(&trade, target, None, &escrow).await;
                assert_eq!(
                    result.failure().unwrap().reason_code,
                    ReasonCode::CertificateMissing,
                    "{target} should require the certificate"
                );
            }
        }

        #[tokio::test]
        async fn missing_certificate_does_not_block_logistics_stages() {
            let trade = rfq_trade();
            let escrow = funded_escrow(&trade);
            let eval = evaluator(StaticCompliance::with_status(
                &["BUYER_1", "SELLER_1"],
                KycStatus::Verified,
                false,
            ));

            for target in [
                TradeStage::Production,
                TradeStage::PickupScheduled,
                TradeStage::InTransit,
            ] {
                let result = eval.evaluate(&trade, target, None, &escrow).await;
                assert!(result.is_pass(), "{target} should not require the certificate");
            }
        }

        #[tokio::test]
        async fn expired_certificate_blocks() {
            let trade = rfq_trade();
            let escrow = funded_escrow(&trade);
            let mut provider = StaticCompliance::verified_for(&["BUYER_1"]);
            provider.profiles.insert(
                "SELLER_1".to_string(),
                ComplianceProfile::new(
                    PartyId::new("SELLER_1"),
                    KycStatus::Verified,
                    vec![Certificate::new(
                        CertificateType::PreferentialOrigin,
                        Timestamp::now().add_secs(-60),
                    )],
                ),
            );
            let eval = evaluator(provider);

            let result = eval
                .evaluate(&trade, TradeStage::Delivered, None, &escrow)
                .await;
            assert_eq!(
                result.failure().unwrap().reason_code,
                ReasonCode::CertificateMissing
            );
        }
    }

    mod timeouts {
        use super::*;

        #[tokio::test]
        async fn slow_collaborator_blocks_with_external_timeout() {
            let trade = rfq_trade();
            let escrow = empty_escrow(&trade);
            let provider = StaticCompliance::verified_for(&["BUYER_1", "SELLER_1"])
                .slow(Duration::from_millis(500));
            let eval = GuardEvaluator::new(Arc::new(provider), Duration::from_millis(20));

            let result = eval
                .evaluate(&trade, TradeStage::Quoted, None, &escrow)
                .await;
            assert_eq!(
                result.failure().unwrap().reason_code,
                ReasonCode::ExternalTimeout
            );
        }

        #[tokio::test]
        async fn unavailable_collaborator_blocks_with_external_timeout() {
            let trade = rfq_trade();
            let escrow = empty_escrow(&trade);
            // No profiles registered: provider errors.
            let eval = evaluator(StaticCompliance::default());

            let result = eval
                .evaluate(&trade, TradeStage::Quoted, None, &escrow)
                .await;
            assert_eq!(
                result.failure().unwrap().reason_code,
                ReasonCode::ExternalTimeout
            );
        }
    }

    mod ordering {
        use super::*;

        #[tokio::test]
        async fn compliance_failure_wins_over_funding() {
            let trade = rfq_trade();
            let escrow = empty_escrow(&trade);
            let eval = evaluator(StaticCompliance::with_status(
                &["BUYER_1", "SELLER_1"],
                KycStatus::Pending,
                false,
            ));

            // Funding is also unmet, but the compliance gate fires first.
            let result = eval
                .evaluate(&trade, TradeStage::EscrowFunded, None, &escrow)
                .await;
            assert_eq!(
                result.failure().unwrap().reason_code,
                ReasonCode::CompliancePending
            );
        }
    }
}
