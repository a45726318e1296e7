//! # Quote Entity
//!
//! A supplier's quote against an RFQ trade.
//!
//! Quotes are created by the supplier collaborator. Once a quote is
//! accepted the kernel only ever references it; the quote-selection gate
//! verifies its status and linkage, never mutates it.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::ids::{PartyId, QuoteId, TradeId};
use crate::domain::value_objects::money::Money;
use crate::domain::value_objects::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quote lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    /// Submitted by the supplier, awaiting the buyer's decision.
    #[default]
    Submitted,
    /// Accepted by the buyer.
    Accepted,
    /// Rejected by the buyer.
    Rejected,
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Submitted => "submitted",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        };
        write!(f, "{}", s)
    }
}

/// International commercial terms agreed in the quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Incoterms {
    /// Ex Works.
    Exw,
    /// Free On Board.
    Fob,
    /// Cost, Insurance and Freight.
    Cif,
    /// Delivered At Place.
    Dap,
    /// Delivered Duty Paid.
    Ddp,
}

impl fmt::Display for Incoterms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Exw => "EXW",
            Self::Fob => "FOB",
            Self::Cif => "CIF",
            Self::Dap => "DAP",
            Self::Ddp => "DDP",
        };
        write!(f, "{}", s)
    }
}

/// A supplier quote.
///
/// # Examples
///
/// ```
/// use trade_kernel::domain::entities::quote::{Incoterms, Quote, QuoteStatus};
/// use trade_kernel::domain::value_objects::{Currency, Money, PartyId, TradeId};
/// use rust_decimal::Decimal;
///
/// let usd = Currency::new("USD").unwrap();
/// let mut quote = Quote::new(
///     TradeId::new_v4(),
///     PartyId::new("SUPPLIER_1"),
///     Money::new(Decimal::new(50, 0), usd.clone()).unwrap(),
///     Money::new(Decimal::new(5_000, 0), usd).unwrap(),
///     14,
///     Incoterms::Fob,
/// );
///
/// assert_eq!(quote.status(), QuoteStatus::Submitted);
/// quote.accept().unwrap();
/// assert!(quote.is_accepted());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Unique identifier for this quote.
    id: QuoteId,
    /// The trade this quote answers.
    trade_id: TradeId,
    /// The quoting supplier.
    supplier: PartyId,
    /// Price per catalog unit.
    unit_price: Money,
    /// Total quoted price.
    total_price: Money,
    /// Quoted lead time in days.
    lead_time_days: u32,
    /// Agreed commercial terms.
    incoterms: Incoterms,
    /// Current status.
    status: QuoteStatus,
    /// When this quote was submitted.
    created_at: Timestamp,
}

impl Quote {
    /// Creates a newly submitted quote.
    #[must_use]
    pub fn new(
        trade_id: TradeId,
        supplier: PartyId,
        unit_price: Money,
        total_price: Money,
        lead_time_days: u32,
        incoterms: Incoterms,
    ) -> Self {
        Self {
            id: QuoteId::new_v4(),
            trade_id,
            supplier,
            unit_price,
            total_price,
            lead_time_days,
            incoterms,
            status: QuoteStatus::Submitted,
            created_at: Timestamp::now(),
        }
    }

    /// Reconstructs a quote from storage.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: QuoteId,
        trade_id: TradeId,
        supplier: PartyId,
        unit_price: Money,
        total_price: Money,
        lead_time_days: u32,
        incoterms: Incoterms,
        status: QuoteStatus,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            trade_id,
            supplier,
            unit_price,
            total_price,
            lead_time_days,
            incoterms,
            status,
            created_at,
        }
    }

    /// Returns the quote ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> QuoteId {
        self.id
    }

    /// Returns the trade this quote answers.
    #[inline]
    #[must_use]
    pub fn trade_id(&self) -> TradeId {
        self.trade_id
    }

    /// Returns the quoting supplier.
    #[inline]
    #[must_use]
    pub fn supplier(&self) -> &PartyId {
        &self.supplier
    }

    /// Returns the price per unit.
    #[inline]
    #[must_use]
    pub fn unit_price(&self) -> &Money {
        &self.unit_price
    }

    /// Returns the total quoted price.
    #[inline]
    #[must_use]
    pub fn total_price(&self) -> &Money {
        &self.total_price
    }

    /// Returns the quoted lead time in days.
    #[inline]
    #[must_use]
    pub fn lead_time_days(&self) -> u32 {
        self.lead_time_days
    }

    /// Returns the agreed commercial terms.
    #[inline]
    #[must_use]
    pub fn incoterms(&self) -> Incoterms {
        self.incoterms
    }

    /// Returns the current status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> QuoteStatus {
        self.status
    }

    /// Returns when this quote was submitted.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns true if the quote was accepted.
    #[inline]
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.status == QuoteStatus::Accepted
    }

    /// Accepts the quote.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::OperationNotAllowed`] unless the quote is
    /// still `Submitted`.
    pub fn accept(&mut self) -> DomainResult<()> {
        if self.status != QuoteStatus::Submitted {
            return Err(DomainError::OperationNotAllowed(format!(
                "cannot accept a {} quote",
                self.status
            )));
        }
        self.status = QuoteStatus::Accepted;
        Ok(())
    }

    /// Rejects the quote.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::OperationNotAllowed`] unless the quote is
    /// still `Submitted`.
    pub fn reject(&mut self) -> DomainResult<()> {
        if self.status != QuoteStatus::Submitted {
            return Err(DomainError::OperationNotAllowed(format!(
                "cannot reject a {} quote",
                self.status
            )));
        }
        self.status = QuoteStatus::Rejected;
        Ok(())
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Quote({} {} @ {} [{}])",
            self.id, self.total_price, self.incoterms, self.status
        )
    }
}
