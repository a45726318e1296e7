//! # Trade Aggregate
//!
//! The persisted record of one trade's identity, parties, amount, and
//! current stage.
//!
//! A trade's status changes only through the transition engine; no other
//! component writes to it. The aggregate enforces the stage graph locally
//! via [`TradeStage::can_transition_to`] and carries a version counter
//! for optimistic locking.
//!
//! # Examples
//!
//! ```
//! use trade_kernel::domain::entities::trade::Trade;
//! use trade_kernel::domain::value_objects::{Currency, Money, PartyId, TradeStage};
//! use rust_decimal::Decimal;
//!
//! let total = Money::new(Decimal::new(5_000, 0), Currency::new("USD").unwrap()).unwrap();
//! let trade = Trade::new_rfq(
//!     PartyId::new("BUYER_1"),
//!     PartyId::new("SELLER_1"),
//!     total,
//!     "cocoa-beans-001",
//!     100,
//! ).unwrap();
//!
//! assert_eq!(trade.stage(), TradeStage::RfqOpen);
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::ids::{PartyId, QuoteId, TradeId};
use crate::domain::value_objects::milestone::MilestoneSchedule;
use crate::domain::value_objects::money::Money;
use crate::domain::value_objects::stage::TradeStage;
use crate::domain::value_objects::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The trade's origin, with its type-specific payload.
///
/// Modeled as a tagged union rather than a free-form map so payload
/// access is exhaustive at compile time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TradeDetails {
    /// Trade originated from a buyer's request for quotation.
    Rfq {
        /// Catalog reference of the requested product.
        product_ref: String,
        /// Requested quantity in catalog units.
        quantity: u64,
        /// The accepted quote, set when the trade reaches `contracted`.
        selected_quote: Option<QuoteId>,
    },
    /// Trade placed directly against a published offer.
    DirectOrder {
        /// Catalog reference of the ordered product.
        product_ref: String,
        /// Ordered quantity in catalog units.
        quantity: u64,
    },
}

impl TradeDetails {
    /// Returns the trade type for this payload.
    #[must_use]
    pub const fn trade_type(&self) -> TradeType {
        match self {
            Self::Rfq { .. } => TradeType::Rfq,
            Self::DirectOrder { .. } => TradeType::DirectOrder,
        }
    }

    /// Returns the product reference.
    #[must_use]
    pub fn product_ref(&self) -> &str {
        match self {
            Self::Rfq { product_ref, .. } | Self::DirectOrder { product_ref, .. } => product_ref,
        }
    }

    /// Returns the quantity.
    #[must_use]
    pub const fn quantity(&self) -> u64 {
        match self {
            Self::Rfq { quantity, .. } | Self::DirectOrder { quantity, .. } => *quantity,
        }
    }

    /// Returns the selected quote, if this is an RFQ trade with one.
    #[must_use]
    pub const fn selected_quote(&self) -> Option<QuoteId> {
        match self {
            Self::Rfq { selected_quote, .. } => *selected_quote,
            Self::DirectOrder { .. } => None,
        }
    }
}

/// The trade type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeType {
    /// RFQ-originated trade; starts at `rfq_open`.
    Rfq,
    /// Direct order; starts at `contracted`.
    DirectOrder,
}

impl TradeType {
    /// Returns the initial stage for this trade type.
    #[must_use]
    pub const fn initial_stage(&self) -> TradeStage {
        match self {
            Self::Rfq => TradeStage::RfqOpen,
            Self::DirectOrder => TradeStage::Contracted,
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Rfq => "rfq",
            Self::DirectOrder => "direct_order",
        };
        write!(f, "{}", s)
    }
}

/// A trade between a buyer and a seller.
///
/// # Invariants
///
/// - The stage only changes along the canonical stage graph.
/// - The total amount, parties, and milestone schedule are fixed at
///   creation.
/// - The version increments on every committed mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Unique identifier for this trade.
    id: TradeId,
    /// Type-specific payload.
    details: TradeDetails,
    /// Current lifecycle stage.
    stage: TradeStage,
    /// The buying party.
    buyer: PartyId,
    /// The selling party.
    seller: PartyId,
    /// Total trade amount.
    total: Money,
    /// Fixed escrow release schedule.
    schedule: MilestoneSchedule,
    /// Version for optimistic locking.
    version: u64,
    /// When this trade was created.
    created_at: Timestamp,
    /// When this trade was last updated.
    updated_at: Timestamp,
}

impl Trade {
    /// Creates an RFQ-originated trade in the `rfq_open` stage with the
    /// standard milestone schedule.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidQuantity`] if the quantity is zero.
    pub fn new_rfq(
        buyer: PartyId,
        seller: PartyId,
        total: Money,
        product_ref: impl Into<String>,
        quantity: u64,
    ) -> DomainResult<Self> {
        let details = TradeDetails::Rfq {
            product_ref: product_ref.into(),
            quantity,
            selected_quote: None,
        };
        Self::create(details, buyer, seller, total, MilestoneSchedule::standard())
    }

    /// Creates a direct order in the `contracted` stage with the standard
    /// milestone schedule.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidQuantity`] if the quantity is zero.
    pub fn new_direct_order(
        buyer: PartyId,
        seller: PartyId,
        total: Money,
        product_ref: impl Into<String>,
        quantity: u64,
    ) -> DomainResult<Self> {
        let details = TradeDetails::DirectOrder {
            product_ref: product_ref.into(),
            quantity,
        };
        Self::create(details, buyer, seller, total, MilestoneSchedule::standard())
    }

    /// Creates a trade with an explicit milestone schedule.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidQuantity`] if the quantity is zero.
    pub fn with_schedule(
        details: TradeDetails,
        buyer: PartyId,
        seller: PartyId,
        total: Money,
        schedule: MilestoneSchedule,
    ) -> DomainResult<Self> {
        Self::create(details, buyer, seller, total, schedule)
    }

    fn create(
        details: TradeDetails,
        buyer: PartyId,
        seller: PartyId,
        total: Money,
        schedule: MilestoneSchedule,
    ) -> DomainResult<Self> {
        if details.quantity() == 0 {
            return Err(DomainError::InvalidQuantity(
                "quantity must be positive".to_string(),
            ));
        }
        if total.is_zero() {
            return Err(DomainError::InvalidAmount(
                "trade total must be positive".to_string(),
            ));
        }
        let now = Timestamp::now();
        Ok(Self {
            id: TradeId::new_v4(),
            stage: details.trade_type().initial_stage(),
            details,
            buyer,
            seller,
            total,
            schedule,
            version: 1,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstructs a trade from storage.
    ///
    /// Bypasses validation; only for trusted persisted data.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: TradeId,
        details: TradeDetails,
        stage: TradeStage,
        buyer: PartyId,
        seller: PartyId,
        total: Money,
        schedule: MilestoneSchedule,
        version: u64,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            details,
            stage,
            buyer,
            seller,
            total,
            schedule,
            version,
            created_at,
            updated_at,
        }
    }

    // ========== Accessors ==========

    /// Returns the trade ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> TradeId {
        self.id
    }

    /// Returns the type-specific payload.
    #[inline]
    #[must_use]
    pub fn details(&self) -> &TradeDetails {
        &self.details
    }

    /// Returns the trade type.
    #[inline]
    #[must_use]
    pub fn trade_type(&self) -> TradeType {
        self.details.trade_type()
    }

    /// Returns the current stage.
    #[inline]
    #[must_use]
    pub fn stage(&self) -> TradeStage {
        self.stage
    }

    /// Returns the buying party.
    #[inline]
    #[must_use]
    pub fn buyer(&self) -> &PartyId {
        &self.buyer
    }

    /// Returns the selling party.
    #[inline]
    #[must_use]
    pub fn seller(&self) -> &PartyId {
        &self.seller
    }

    /// Returns the total trade amount.
    #[inline]
    #[must_use]
    pub fn total(&self) -> &Money {
        &self.total
    }

    /// Returns the fixed milestone schedule.
    #[inline]
    #[must_use]
    pub fn schedule(&self) -> &MilestoneSchedule {
        &self.schedule
    }

    /// Returns the version for optimistic locking.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns when this trade was created.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns when this trade was last updated.
    #[inline]
    #[must_use]
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Returns true if the trade is in a terminal stage.
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }

    // ========== Mutations (transition engine only) ==========

    /// Moves the trade to the target stage.
    ///
    /// Only the transition engine calls this, after guards have passed.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidStageTransition`] if the move is not
    /// legal from the current stage.
    pub fn transition_to(&mut self, target: TradeStage) -> DomainResult<()> {
        if !self.stage.can_transition_to(target) {
            return Err(DomainError::InvalidStageTransition {
                from: self.stage,
                to: target,
            });
        }
        self.stage = target;
        self.touch();
        Ok(())
    }

    /// Records the accepted quote on an RFQ trade.
    ///
    /// Called by the transition engine when the trade enters
    /// `contracted`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::OperationNotAllowed`] for direct orders or
    /// when a quote was already selected.
    pub fn select_quote(&mut self, quote_id: QuoteId) -> DomainResult<()> {
        match &mut self.details {
            TradeDetails::Rfq { selected_quote, .. } => {
                if selected_quote.is_some() {
                    return Err(DomainError::OperationNotAllowed(
                        "a quote was already selected".to_string(),
                    ));
                }
                *selected_quote = Some(quote_id);
                self.touch();
                Ok(())
            }
            TradeDetails::DirectOrder { .. } => Err(DomainError::OperationNotAllowed(
                "direct orders do not select quotes".to_string(),
            )),
        }
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
        self.version = self.version.saturating_add(1);
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Trade({} {} {} [{}])",
            self.id,
            self.details.trade_type(),
            self.total,
            self.stage
        )
    }
}
