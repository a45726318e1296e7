//! # Read Projector
//!
//! Pure, side-effect-free composition of kernel state into a UI-facing
//! view.
//!
//! The projector never stores independent state. It is recomputed on
//! every read, so a polling UI can never desynchronize from the kernel's
//! ground truth. The recommended next action comes from the first
//! failing guard if one exists, otherwise from the literal next stage on
//! the spine.

use crate::application::services::guard_evaluator::GuardFailure;
use crate::domain::entities::escrow::EscrowAccount;
use crate::domain::entities::trade::Trade;
use crate::domain::value_objects::reason::ReasonCode;
use crate::domain::value_objects::stage::TradeStage;
use serde::{Deserialize, Serialize};

/// The recommended next action for a trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextAction {
    /// Short title, suitable for a call-to-action button.
    pub title: String,
    /// The blocking reason, when the action remediates a failed guard.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<ReasonCode>,
}

/// UI-facing projection of a trade's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeProjection {
    /// Position on the spine, if the trade is on it.
    pub current_stage_index: Option<usize>,
    /// The recommended next action; `None` for terminal trades.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_action: Option<NextAction>,
    /// True once no further transitions are legal.
    pub is_terminal: bool,
}

/// Projects a trade, its escrow account, and the latest guard result
/// into a UI-facing view.
///
/// Pure function of its inputs.
///
/// # Examples
///
/// ```
/// use trade_kernel::application::services::projector::project;
/// use trade_kernel::domain::entities::escrow::EscrowAccount;
/// use trade_kernel::domain::entities::trade::Trade;
/// use trade_kernel::domain::value_objects::{Currency, Money, PartyId};
/// use rust_decimal::Decimal;
///
/// let total = Money::new(Decimal::new(5_000, 0), Currency::new("USD").unwrap()).unwrap();
/// let trade = Trade::new_rfq(
///     PartyId::new("BUYER_1"),
///     PartyId::new("SELLER_1"),
///     total,
///     "cocoa-beans-001",
///     100,
/// ).unwrap();
/// let escrow = EscrowAccount::new(trade.id(), trade.total().currency().clone());
///
/// let projection = project(&trade, &escrow, None);
/// assert_eq!(projection.current_stage_index, Some(0));
/// assert!(!projection.is_terminal);
/// ```
#[must_use]
pub fn project(
    trade: &Trade,
    escrow: &EscrowAccount,
    guard_failure: Option<&GuardFailure>,
) -> TradeProjection {
    let stage = trade.stage();
    TradeProjection {
        current_stage_index: stage.spine_index(),
        next_action: next_action(trade, escrow, guard_failure),
        is_terminal: stage.is_terminal(),
    }
}

fn next_action(
    trade: &Trade,
    escrow: &EscrowAccount,
    guard_failure: Option<&GuardFailure>,
) -> Option<NextAction> {
    let stage = trade.stage();
    if stage.is_terminal() {
        return None;
    }

    if let Some(failure) = guard_failure {
        let title = failure
            .required_actions
            .first()
            .cloned()
            .unwrap_or_else(|| failure.reason_code.description().to_string());
        return Some(NextAction {
            title,
            reason_code: Some(failure.reason_code),
        });
    }

    let Some(next) = stage.next_on_spine() else {
        // Off-spine and non-terminal: the dispute branch.
        return Some(NextAction {
            title: "resolve the dispute".to_string(),
            reason_code: None,
        });
    };

    let title = match next {
        TradeStage::EscrowFunded if !escrow.is_funded() => {
            format!("fund escrow of {}", trade.total())
        }
        TradeStage::Settled => match escrow.remaining().ok() {
            Some(remaining) if !remaining.is_zero() => {
                format!("confirm settlement, releasing {remaining}")
            }
            _ => format!("advance to {next}"),
        },
        other => format!("advance to {other}"),
    };
    Some(NextAction {
        title,
        reason_code: None,
    })
}
