//! # Trade Stage
//!
//! Trade lifecycle state machine.
//!
//! This module provides the [`TradeStage`] enum representing the lifecycle
//! of a trade with enforced stage transitions.
//!
//! # State Machine
//!
//! ```text
//! rfq_open → quoted → contracted → escrow_required → escrow_funded
//!     → production → pickup_scheduled → in_transit → delivered → settled
//!
//! any non-terminal ──→ cancelled
//! any non-terminal ──→ disputed ──→ disputed_resolved | cancelled
//! ```
//!
//! The spine is strictly linear: the only legal forward move is to the
//! single next spine stage. The two escape branches (`cancelled`,
//! `disputed`) are reachable from every non-terminal stage.
//!
//! # Examples
//!
//! ```
//! use trade_kernel::domain::value_objects::stage::TradeStage;
//!
//! let stage = TradeStage::RfqOpen;
//! assert!(stage.can_transition_to(TradeStage::Quoted));
//! assert!(stage.can_transition_to(TradeStage::Cancelled));
//! assert!(!stage.can_transition_to(TradeStage::Contracted));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trade lifecycle stage.
///
/// Represents the current commercial stage of a trade. Transitions are
/// enforced via [`can_transition_to`](TradeStage::can_transition_to).
///
/// # Terminal Stages
///
/// The following stages are terminal (no further transitions allowed):
/// - [`Settled`](TradeStage::Settled) - All milestones released
/// - [`Cancelled`](TradeStage::Cancelled) - Trade abandoned
/// - [`DisputedResolved`](TradeStage::DisputedResolved) - Dispute closed
///
/// # Examples
///
/// ```
/// use trade_kernel::domain::value_objects::stage::TradeStage;
///
/// assert!(!TradeStage::InTransit.is_terminal());
/// assert!(TradeStage::Settled.is_terminal());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TradeStage {
    /// RFQ published, awaiting supplier quotes.
    #[default]
    RfqOpen = 0,

    /// At least one quote received.
    Quoted = 1,

    /// A quote was accepted and the trade is contractually agreed.
    Contracted = 2,

    /// Awaiting the buyer's escrow deposit.
    EscrowRequired = 3,

    /// Escrow fully funded.
    EscrowFunded = 4,

    /// Goods in production.
    Production = 5,

    /// Pickup scheduled with the logistics partner.
    PickupScheduled = 6,

    /// Goods in transit.
    InTransit = 7,

    /// Goods delivered to the buyer.
    Delivered = 8,

    /// All escrow released, trade complete (terminal).
    Settled = 9,

    /// Trade cancelled (terminal).
    Cancelled = 10,

    /// Trade under dispute.
    Disputed = 11,

    /// Dispute resolved and trade closed (terminal).
    DisputedResolved = 12,
}

/// The linear spine of the stage graph, in order.
const SPINE: [TradeStage; 10] = [
    TradeStage::RfqOpen,
    TradeStage::Quoted,
    TradeStage::Contracted,
    TradeStage::EscrowRequired,
    TradeStage::EscrowFunded,
    TradeStage::Production,
    TradeStage::PickupScheduled,
    TradeStage::InTransit,
    TradeStage::Delivered,
    TradeStage::Settled,
];

impl TradeStage {
    /// Returns true if this is a terminal stage.
    ///
    /// Terminal stages cannot transition to any other stage.
    ///
    /// # Examples
    ///
    /// ```
    /// use trade_kernel::domain::value_objects::stage::TradeStage;
    ///
    /// assert!(TradeStage::Settled.is_terminal());
    /// assert!(TradeStage::Cancelled.is_terminal());
    /// assert!(TradeStage::DisputedResolved.is_terminal());
    /// assert!(!TradeStage::Disputed.is_terminal());
    /// ```
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Settled | Self::Cancelled | Self::DisputedResolved
        )
    }

    /// Returns this stage's position on the spine, if it lies on it.
    ///
    /// The escape stages (`Cancelled`, `Disputed`, `DisputedResolved`)
    /// have no spine index.
    ///
    /// # Examples
    ///
    /// ```
    /// use trade_kernel::domain::value_objects::stage::TradeStage;
    ///
    /// assert_eq!(TradeStage::RfqOpen.spine_index(), Some(0));
    /// assert_eq!(TradeStage::Settled.spine_index(), Some(9));
    /// assert_eq!(TradeStage::Disputed.spine_index(), None);
    /// ```
    #[must_use]
    pub fn spine_index(&self) -> Option<usize> {
        SPINE.iter().position(|stage| stage == self)
    }

    /// Returns the next stage on the spine, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use trade_kernel::domain::value_objects::stage::TradeStage;
    ///
    /// assert_eq!(TradeStage::RfqOpen.next_on_spine(), Some(TradeStage::Quoted));
    /// assert_eq!(TradeStage::Settled.next_on_spine(), None);
    /// assert_eq!(TradeStage::Disputed.next_on_spine(), None);
    /// ```
    #[must_use]
    pub fn next_on_spine(&self) -> Option<Self> {
        let index = self.spine_index()?;
        SPINE.get(index + 1).copied()
    }

    /// Returns true if this stage can transition to the target stage.
    ///
    /// Legal moves are:
    /// - the single next stage on the spine;
    /// - `Cancelled` from any non-terminal stage;
    /// - `Disputed` from any non-terminal stage except itself;
    /// - `DisputedResolved` from `Disputed` only.
    ///
    /// # Examples
    ///
    /// ```
    /// use trade_kernel::domain::value_objects::stage::TradeStage;
    ///
    /// // Spine advance
    /// assert!(TradeStage::Contracted.can_transition_to(TradeStage::EscrowRequired));
    ///
    /// // No skipping
    /// assert!(!TradeStage::Contracted.can_transition_to(TradeStage::EscrowFunded));
    ///
    /// // Escapes
    /// assert!(TradeStage::Production.can_transition_to(TradeStage::Disputed));
    /// assert!(TradeStage::Disputed.can_transition_to(TradeStage::DisputedResolved));
    ///
    /// // Terminal stages never transition
    /// assert!(!TradeStage::Settled.can_transition_to(TradeStage::Disputed));
    /// ```
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        match target {
            Self::Cancelled => true,
            Self::Disputed => *self != Self::Disputed,
            Self::DisputedResolved => *self == Self::Disputed,
            _ => self.next_on_spine() == Some(target),
        }
    }

    /// Returns the valid next stages from this stage.
    ///
    /// # Examples
    ///
    /// ```
    /// use trade_kernel::domain::value_objects::stage::TradeStage;
    ///
    /// let next = TradeStage::RfqOpen.valid_transitions();
    /// assert!(next.contains(&TradeStage::Quoted));
    /// assert!(next.contains(&TradeStage::Cancelled));
    /// assert!(next.contains(&TradeStage::Disputed));
    /// ```
    #[must_use]
    pub fn valid_transitions(&self) -> Vec<Self> {
        if self.is_terminal() {
            return Vec::new();
        }
        let mut targets = Vec::with_capacity(3);
        if let Some(next) = self.next_on_spine() {
            targets.push(next);
        }
        if *self == Self::Disputed {
            targets.push(Self::DisputedResolved);
        } else {
            targets.push(Self::Disputed);
        }
        targets.push(Self::Cancelled);
        targets
    }

    /// Returns true if this stage is an escape branch off the spine.
    #[inline]
    #[must_use]
    pub const fn is_escape(&self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::Disputed | Self::DisputedResolved
        )
    }

    /// Returns true if entering this stage affects escrow release
    /// (the stages gated by the document check).
    #[inline]
    #[must_use]
    pub const fn is_release_affecting(&self) -> bool {
        matches!(self, Self::Delivered | Self::Settled)
    }

    /// Returns the numeric value of this stage.
    #[inline]
    #[must_use]
    pub const fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Returns every stage, spine first then escapes.
    #[must_use]
    pub fn all() -> Vec<Self> {
        let mut stages = SPINE.to_vec();
        stages.extend([Self::Cancelled, Self::Disputed, Self::DisputedResolved]);
        stages
    }
}

impl fmt::Display for TradeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RfqOpen => "rfq_open",
            Self::Quoted => "quoted",
            Self::Contracted => "contracted",
            Self::EscrowRequired => "escrow_required",
            Self::EscrowFunded => "escrow_funded",
            Self::Production => "production",
            Self::PickupScheduled => "pickup_scheduled",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
            Self::Settled => "settled",
            Self::Cancelled => "cancelled",
            Self::Disputed => "disputed",
            Self::DisputedResolved => "disputed_resolved",
        };
        write!(f, "{}", s)
    }
}

/// Error returned when parsing an unknown stage name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTradeStageError(pub String);

impl fmt::Display for InvalidTradeStageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid trade stage: {}", self.0)
    }
}

impl std::error::Error for InvalidTradeStageError {}

impl FromStr for TradeStage {
    type Err = InvalidTradeStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rfq_open" => Ok(Self::RfqOpen),
            "quoted" => Ok(Self::Quoted),
            "contracted" => Ok(Self::Contracted),
            "escrow_required" => Ok(Self::EscrowRequired),
            "escrow_funded" => Ok(Self::EscrowFunded),
            "production" => Ok(Self::Production),
            "pickup_scheduled" => Ok(Self::PickupScheduled),
            "in_transit" => Ok(Self::InTransit),
            "delivered" => Ok(Self::Delivered),
            "settled" => Ok(Self::Settled),
            "cancelled" => Ok(Self::Cancelled),
            "disputed" => Ok(Self::Disputed),
            "disputed_resolved" => Ok(Self::DisputedResolved),
            other => Err(InvalidTradeStageError(other.to_string())),
        }
    }
}
