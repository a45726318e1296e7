//! # Monetary Value Objects
//!
//! Currency-tagged monetary amounts with checked arithmetic.
//!
//! This module provides [`Currency`], a validated ISO-4217 style currency
//! code, and [`Money`], a non-negative decimal amount tagged with its
//! currency. All arithmetic is checked: overflow, underflow, and
//! cross-currency operations are rejected instead of silently corrupting
//! escrow balances.
//!
//! # Examples
//!
//! ```
//! use trade_kernel::domain::value_objects::money::{Currency, Money};
//! use rust_decimal::Decimal;
//!
//! let usd = Currency::new("USD").unwrap();
//! let held = Money::new(Decimal::new(5_000, 0), usd.clone()).unwrap();
//! let release = held.percentage(3_000).unwrap(); // 30.00%
//! assert_eq!(release.amount(), Decimal::new(1_500, 0));
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Basis points in one whole (100%).
const BASIS_POINTS_SCALE: i64 = 10_000;

/// A validated currency code.
///
/// Three uppercase ASCII letters, ISO-4217 style (`USD`, `EUR`, `NGN`).
///
/// # Examples
///
/// ```
/// use trade_kernel::domain::value_objects::money::Currency;
///
/// let usd = Currency::new("USD").unwrap();
/// assert_eq!(usd.as_str(), "USD");
///
/// assert!(Currency::new("usd").is_err());
/// assert!(Currency::new("DOLLARS").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Creates a validated currency code.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidCurrency`] unless the code is exactly
    /// three uppercase ASCII letters.
    pub fn new(code: impl Into<String>) -> DomainResult<Self> {
        let code = code.into();
        if code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase()) {
            Ok(Self(code))
        } else {
            Err(DomainError::InvalidCurrency(code))
        }
    }

    /// Returns the currency code as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Currency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

/// A non-negative monetary amount tagged with its currency.
///
/// # Invariants
///
/// - The amount is always >= 0.
/// - Arithmetic never mixes currencies.
///
/// # Examples
///
/// ```
/// use trade_kernel::domain::value_objects::money::{Currency, Money};
/// use rust_decimal::Decimal;
///
/// let usd = Currency::new("USD").unwrap();
/// let a = Money::new(Decimal::new(100, 0), usd.clone()).unwrap();
/// let b = Money::new(Decimal::new(50, 0), usd).unwrap();
///
/// let sum = a.safe_add(&b).unwrap();
/// assert_eq!(sum.amount(), Decimal::new(150, 0));
/// assert!(a.safe_sub(&sum).is_err()); // would go negative
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// The decimal amount.
    amount: Decimal,
    /// The currency the amount is denominated in.
    currency: Currency,
}

impl Money {
    /// Creates a new monetary amount.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidAmount`] if the amount is negative.
    pub fn new(amount: Decimal, currency: Currency) -> DomainResult<Self> {
        if amount.is_sign_negative() {
            return Err(DomainError::InvalidAmount(format!(
                "amount cannot be negative: {amount}"
            )));
        }
        Ok(Self { amount, currency })
    }

    /// Creates a zero amount in the given currency.
    #[must_use]
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Returns the decimal amount.
    #[inline]
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency.
    #[inline]
    #[must_use]
    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    /// Returns true if the amount is zero.
    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    fn require_same_currency(&self, other: &Self) -> DomainResult<()> {
        if self.currency == other.currency {
            Ok(())
        } else {
            Err(DomainError::CurrencyMismatch {
                left: self.currency.clone(),
                right: other.currency.clone(),
            })
        }
    }

    /// Safely adds another amount of the same currency.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::CurrencyMismatch`] for cross-currency
    /// addition and [`DomainError::Overflow`] if the result overflows.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn safe_add(&self, rhs: &Self) -> DomainResult<Self> {
        self.require_same_currency(rhs)?;
        let amount = self
            .amount
            .checked_add(rhs.amount)
            .ok_or(DomainError::Overflow)?;
        Ok(Self {
            amount,
            currency: self.currency.clone(),
        })
    }

    /// Safely subtracts another amount of the same currency.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::CurrencyMismatch`] for cross-currency
    /// subtraction and [`DomainError::Underflow`] if the result would be
    /// negative.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn safe_sub(&self, rhs: &Self) -> DomainResult<Self> {
        self.require_same_currency(rhs)?;
        let amount = self
            .amount
            .checked_sub(rhs.amount)
            .ok_or(DomainError::Underflow)?;
        if amount.is_sign_negative() {
            return Err(DomainError::Underflow);
        }
        Ok(Self {
            amount,
            currency: self.currency.clone(),
        })
    }

    /// Returns the given share of this amount, expressed in basis points.
    ///
    /// 10 000 basis points are 100%. The result is rounded to two decimal
    /// places with banker's rounding.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidAmount`] if `basis_points` exceeds
    /// 10 000 and [`DomainError::Overflow`] if the multiplication
    /// overflows.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn percentage(&self, basis_points: u16) -> DomainResult<Self> {
        if i64::from(basis_points) > BASIS_POINTS_SCALE {
            return Err(DomainError::InvalidAmount(format!(
                "basis points out of range: {basis_points}"
            )));
        }
        let fraction = Decimal::new(i64::from(basis_points), 0)
            .checked_div(Decimal::new(BASIS_POINTS_SCALE, 0))
            .ok_or(DomainError::Overflow)?;
        let amount = self
            .amount
            .checked_mul(fraction)
            .ok_or(DomainError::Overflow)?
            .round_dp(2);
        Ok(Self {
            amount,
            currency: self.currency.clone(),
        })
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}
