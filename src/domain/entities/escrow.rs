//! # Escrow Account
//!
//! Per-trade record of held and released funds.
//!
//! One escrow account exists per trade. It is mutated only by the escrow
//! ledger as a side effect of successful transitions, and it enforces the
//! monetary invariants locally: the released amount never exceeds the
//! held amount, and no milestone is ever released twice.
//!
//! # Examples
//!
//! ```
//! use trade_kernel::domain::entities::escrow::EscrowAccount;
//! use trade_kernel::domain::value_objects::{Currency, MilestoneId, Money, TradeId};
//! use rust_decimal::Decimal;
//!
//! let usd = Currency::new("USD").unwrap();
//! let mut escrow = EscrowAccount::new(TradeId::new_v4(), usd.clone());
//!
//! escrow.hold(Money::new(Decimal::new(5_000, 0), usd.clone()).unwrap()).unwrap();
//! escrow
//!     .release(
//!         MilestoneId::new("transit"),
//!         Money::new(Decimal::new(1_500, 0), usd).unwrap(),
//!     )
//!     .unwrap();
//!
//! assert_eq!(escrow.released().amount(), Decimal::new(1_500, 0));
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::ids::{MilestoneId, TradeId};
use crate::domain::value_objects::money::{Currency, Money};
use crate::domain::value_objects::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Read view of an escrow account, consumed by progress displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowView {
    /// Amount currently held by the custodian.
    pub held_amount: Money,
    /// Amount released so far.
    pub released_amount: Money,
    /// The most recently released milestone, if any.
    pub current_milestone: Option<MilestoneId>,
}

/// The escrow account of a single trade.
///
/// # Invariants
///
/// - `released <= held` at all times.
/// - Each milestone identifier appears at most once in the released set.
/// - A hold can only be placed while the held amount is zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowAccount {
    /// The trade this account belongs to.
    trade_id: TradeId,
    /// Amount held by the custodian.
    held: Money,
    /// Amount released so far.
    released: Money,
    /// Milestones released, in release order.
    released_milestones: Vec<MilestoneId>,
    /// When this account was last updated.
    updated_at: Timestamp,
}

impl EscrowAccount {
    /// Creates an empty escrow account for a trade.
    #[must_use]
    pub fn new(trade_id: TradeId, currency: Currency) -> Self {
        Self {
            trade_id,
            held: Money::zero(currency.clone()),
            released: Money::zero(currency),
            released_milestones: Vec::new(),
            updated_at: Timestamp::now(),
        }
    }

    /// Reconstructs an account from storage.
    #[must_use]
    pub fn from_parts(
        trade_id: TradeId,
        held: Money,
        released: Money,
        released_milestones: Vec<MilestoneId>,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            trade_id,
            held,
            released,
            released_milestones,
            updated_at,
        }
    }

    /// Returns the trade this account belongs to.
    #[inline]
    #[must_use]
    pub fn trade_id(&self) -> TradeId {
        self.trade_id
    }

    /// Returns the held amount.
    #[inline]
    #[must_use]
    pub fn held(&self) -> &Money {
        &self.held
    }

    /// Returns the released amount.
    #[inline]
    #[must_use]
    pub fn released(&self) -> &Money {
        &self.released
    }

    /// Returns the released milestones in release order.
    #[inline]
    #[must_use]
    pub fn released_milestones(&self) -> &[MilestoneId] {
        &self.released_milestones
    }

    /// Returns when this account was last updated.
    #[inline]
    #[must_use]
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Returns the amount still held and unreleased.
    ///
    /// # Errors
    ///
    /// Returns an arithmetic error if the invariant `released <= held`
    /// has been violated in storage.
    pub fn remaining(&self) -> DomainResult<Money> {
        self.held.safe_sub(&self.released)
    }

    /// Returns true if a hold has been placed.
    #[inline]
    #[must_use]
    pub fn is_funded(&self) -> bool {
        !self.held.is_zero()
    }

    /// Returns true if everything held has been released.
    #[must_use]
    pub fn is_fully_released(&self) -> bool {
        self.is_funded() && self.held == self.released
    }

    /// Places a hold for the given amount.
    ///
    /// Legal only while the held amount is zero: there is no double-hold
    /// and no top-up.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::DoubleHold`] if funds are already held,
    /// [`DomainError::InvalidAmount`] for a zero amount, and
    /// [`DomainError::CurrencyMismatch`] for a foreign currency.
    pub fn hold(&mut self, amount: Money) -> DomainResult<()> {
        if self.is_funded() {
            return Err(DomainError::DoubleHold(self.trade_id.to_string()));
        }
        if amount.is_zero() {
            return Err(DomainError::InvalidAmount(
                "hold amount must be positive".to_string(),
            ));
        }
        if amount.currency() != self.held.currency() {
            return Err(DomainError::CurrencyMismatch {
                left: self.held.currency().clone(),
                right: amount.currency().clone(),
            });
        }
        self.held = amount;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Releases `amount` against the given milestone.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::MilestoneAlreadyReleased`] if the milestone
    /// was released before and [`DomainError::ReleaseExceedsHeld`] if the
    /// release would push the released total past the held amount.
    pub fn release(&mut self, milestone: MilestoneId, amount: Money) -> DomainResult<()> {
        if self.released_milestones.contains(&milestone) {
            return Err(DomainError::MilestoneAlreadyReleased(milestone.to_string()));
        }
        let new_released = self.released.safe_add(&amount)?;
        if new_released.amount() > self.held.amount() {
            return Err(DomainError::ReleaseExceedsHeld {
                requested: amount.to_string(),
                held: self.held.to_string(),
                released: self.released.to_string(),
            });
        }
        self.released = new_released;
        self.released_milestones.push(milestone);
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Returns the progress-display view of this account.
    #[must_use]
    pub fn view(&self) -> EscrowView {
        EscrowView {
            held_amount: self.held.clone(),
            released_amount: self.released.clone(),
            current_milestone: self.released_milestones.last().cloned(),
        }
    }
}

impl fmt::Display for EscrowAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Escrow({} held {} released {})",
            self.trade_id, self.held, self.released
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn usd() -> Currency {
        Currency::new("USD").unwrap()
    }

    fn money(value: i64) -> Money {
        Money::new(Decimal::new(value, 0), usd()).unwrap()
    }

    fn funded_account() -> EscrowAccount {
        let mut escrow = EscrowAccount::new(TradeId::new_v4(), usd());
        escrow.hold(money(5_000)).unwrap();
        escrow
    }

    mod hold {
        use super::*;

        #[test]
        fn hold_sets_held_amount() {
            let escrow = funded_account();
            assert!(escrow.is_funded());
            assert_eq!(escrow.held().amount(), Decimal::new(5_000, 0));
            assert!(escrow.released().is_zero());
        }

        #[test]
        fn double_hold_is_rejected() {
            let mut escrow = funded_account();
            let result = escrow.hold(money(1_000));
            assert!(matches!(result, Err(DomainError::DoubleHold(_))));
            assert_eq!(escrow.held().amount(), Decimal::new(5_000, 0));
        }

        #[test]
        fn zero_hold_is_rejected() {
            let mut escrow = EscrowAccount::new(TradeId::new_v4(), usd());
            assert!(escrow.hold(money(0)).is_err());
        }

        #[test]
        fn foreign_currency_hold_is_rejected() {
            let mut escrow = EscrowAccount::new(TradeId::new_v4(), usd());
            let eur = Money::new(Decimal::new(100, 0), Currency::new("EUR").unwrap()).unwrap();
            assert!(matches!(
                escrow.hold(eur),
                Err(DomainError::CurrencyMismatch { .. })
            ));
        }
    }

    mod release {
        use super::*;

        #[test]
        fn release_increments_released() {
            let mut escrow = funded_account();
            escrow
                .release(MilestoneId::new("transit"), money(1_500))
                .unwrap();
            assert_eq!(escrow.released().amount(), Decimal::new(1_500, 0));
            assert_eq!(escrow.released_milestones().len(), 1);
        }

        #[test]
        fn same_milestone_twice_is_rejected() {
            let mut escrow = funded_account();
            escrow
                .release(MilestoneId::new("transit"), money(1_500))
                .unwrap();
            let result = escrow.release(MilestoneId::new("transit"), money(100));
            assert!(matches!(
                result,
                Err(DomainError::MilestoneAlreadyReleased(_))
            ));
            assert_eq!(escrow.released().amount(), Decimal::new(1_500, 0));
        }

        #[test]
        fn release_exceeding_held_is_rejected() {
            let mut escrow = funded_account();
            let result = escrow.release(MilestoneId::new("transit"), money(5_001));
            assert!(matches!(result, Err(DomainError::ReleaseExceedsHeld { .. })));
            assert!(escrow.released().is_zero());
        }

        #[test]
        fn cumulative_release_cannot_exceed_held() {
            let mut escrow = funded_account();
            escrow
                .release(MilestoneId::new("transit"), money(3_000))
                .unwrap();
            let result = escrow.release(MilestoneId::new("final"), money(2_001));
            assert!(matches!(result, Err(DomainError::ReleaseExceedsHeld { .. })));
        }

        #[test]
        fn full_release_settles_account() {
            let mut escrow = funded_account();
            escrow
                .release(MilestoneId::new("transit"), money(1_500))
                .unwrap();
            escrow
                .release(MilestoneId::new("final"), money(3_500))
                .unwrap();
            assert!(escrow.is_fully_released());
            assert!(escrow.remaining().unwrap().is_zero());
        }
    }

    mod view {
        use super::*;

        #[test]
        fn view_tracks_current_milestone() {
            let mut escrow = funded_account();
            assert_eq!(escrow.view().current_milestone, None);

            escrow
                .release(MilestoneId::new("transit"), money(1_500))
                .unwrap();
            assert_eq!(
                escrow.view().current_milestone,
                Some(MilestoneId::new("transit"))
            );

            escrow
                .release(MilestoneId::new("final"), money(3_500))
                .unwrap();
            assert_eq!(
                escrow.view().current_milestone,
                Some(MilestoneId::new("final"))
            );
        }

        #[test]
        fn empty_account_is_not_fully_released() {
            let escrow = EscrowAccount::new(TradeId::new_v4(), usd());
            assert!(!escrow.is_fully_released());
            assert!(!escrow.is_funded());
        }
    }

    mod serde_roundtrip {
        use super::*;

        #[test]
        fn account_roundtrip() {
            let mut escrow = funded_account();
            escrow
                .release(MilestoneId::new("transit"), money(1_500))
                .unwrap();

            let json = serde_json::to_string(&escrow).unwrap();
            let deserialized: EscrowAccount = serde_json::from_str(&json).unwrap();
            assert_eq!(escrow, deserialized);
        }
    }
}
