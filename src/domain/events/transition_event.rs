//! # Transition Events
//!
//! Append-only audit records of transition attempts.
//!
//! Every call to the transition engine produces exactly one
//! [`TransitionEvent`], successful or blocked. Events are immutable once
//! written; the audit ledger is the single source of truth for "why is
//! this trade stuck".

use crate::domain::value_objects::ids::{EventId, PartyId, TradeId};
use crate::domain::value_objects::reason::ReasonCode;
use crate::domain::value_objects::stage::TradeStage;
use crate::domain::value_objects::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a transition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionOutcomeKind {
    /// The transition committed.
    Success,
    /// The transition was blocked; the trade is unchanged.
    Blocked,
}

impl fmt::Display for TransitionOutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Blocked => "blocked",
        };
        write!(f, "{}", s)
    }
}

/// A single transition attempt, success or blocked.
///
/// # Invariants
///
/// - Immutable once written; the audit ledger only appends.
/// - A `Blocked` event always carries a reason code; a `Success` event
///   never does.
///
/// # Examples
///
/// ```
/// use trade_kernel::domain::events::transition_event::TransitionEvent;
/// use trade_kernel::domain::value_objects::{PartyId, ReasonCode, TradeId, TradeStage};
///
/// let event = TransitionEvent::blocked(
///     TradeId::new_v4(),
///     TradeStage::Contracted,
///     TradeStage::EscrowFunded,
///     ReasonCode::InvalidTransition,
///     PartyId::new("BUYER_1"),
/// );
/// assert!(event.is_blocked());
/// assert_eq!(event.reason_code(), Some(ReasonCode::InvalidTransition));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEvent {
    id: EventId,
    trade_id: TradeId,
    from_stage: TradeStage,
    to_stage: TradeStage,
    outcome: TransitionOutcomeKind,
    reason_code: Option<ReasonCode>,
    actor: PartyId,
    timestamp: Timestamp,
}

impl TransitionEvent {
    /// Creates a success event.
    #[must_use]
    pub fn success(
        trade_id: TradeId,
        from_stage: TradeStage,
        to_stage: TradeStage,
        actor: PartyId,
    ) -> Self {
        Self {
            id: EventId::new_v4(),
            trade_id,
            from_stage,
            to_stage,
            outcome: TransitionOutcomeKind::Success,
            reason_code: None,
            actor,
            timestamp: Timestamp::now(),
        }
    }

    /// Creates a blocked event with its reason code.
    #[must_use]
    pub fn blocked(
        trade_id: TradeId,
        from_stage: TradeStage,
        to_stage: TradeStage,
        reason_code: ReasonCode,
        actor: PartyId,
    ) -> Self {
        Self {
            id: EventId::new_v4(),
            trade_id,
            from_stage,
            to_stage,
            outcome: TransitionOutcomeKind::Blocked,
            reason_code: Some(reason_code),
            actor,
            timestamp: Timestamp::now(),
        }
    }

    /// Reconstructs an event from storage.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: EventId,
        trade_id: TradeId,
        from_stage: TradeStage,
        to_stage: TradeStage,
        outcome: TransitionOutcomeKind,
        reason_code: Option<ReasonCode>,
        actor: PartyId,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id,
            trade_id,
            from_stage,
            to_stage,
            outcome,
            reason_code,
            actor,
            timestamp,
        }
    }

    /// Returns the event ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> EventId {
        self.id
    }

    /// Returns the trade this attempt was made against.
    #[inline]
    #[must_use]
    pub fn trade_id(&self) -> TradeId {
        self.trade_id
    }

    /// Returns the stage the trade was in when the attempt was made.
    #[inline]
    #[must_use]
    pub fn from_stage(&self) -> TradeStage {
        self.from_stage
    }

    /// Returns the requested target stage.
    #[inline]
    #[must_use]
    pub fn to_stage(&self) -> TradeStage {
        self.to_stage
    }

    /// Returns the attempt outcome.
    #[inline]
    #[must_use]
    pub fn outcome(&self) -> TransitionOutcomeKind {
        self.outcome
    }

    /// Returns the reason code for a blocked attempt.
    #[inline]
    #[must_use]
    pub fn reason_code(&self) -> Option<ReasonCode> {
        self.reason_code
    }

    /// Returns the party that requested the transition.
    #[inline]
    #[must_use]
    pub fn actor(&self) -> &PartyId {
        &self.actor
    }

    /// Returns when the attempt was made.
    #[inline]
    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Returns true if the attempt committed.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome == TransitionOutcomeKind::Success
    }

    /// Returns true if the attempt was blocked.
    #[inline]
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.outcome == TransitionOutcomeKind::Blocked
    }
}

impl fmt::Display for TransitionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason_code {
            Some(reason) => write!(
                f,
                "{} {} -> {} [{}: {}]",
                self.trade_id, self.from_stage, self.to_stage, self.outcome, reason
            ),
            None => write!(
                f,
                "{} {} -> {} [{}]",
                self.trade_id, self.from_stage, self.to_stage, self.outcome
            ),
        }
    }
}
