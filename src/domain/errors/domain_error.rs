//! # Domain Errors
//!
//! Typed domain error definitions.
//!
//! This module provides the [`DomainError`] enum for representing
//! domain-level errors with numeric error codes.
//!
//! # Error Code Ranges
//!
//! - **1000-1999**: Validation errors
//! - **2000-2999**: State errors
//! - **3000-3999**: Escrow errors
//! - **4000-4999**: Arithmetic errors
//!
//! # Examples
//!
//! ```
//! use trade_kernel::domain::errors::DomainError;
//!
//! let error = DomainError::InvalidAmount("amount cannot be negative".to_string());
//! assert_eq!(error.code(), 1001);
//! ```

use crate::domain::value_objects::money::Currency;
use crate::domain::value_objects::stage::TradeStage;
use thiserror::Error;

/// Domain-level error with numeric error codes.
///
/// Provides typed errors for domain operations with consistent
/// error codes for logging and API responses.
///
/// # Error Code Ranges
///
/// | Range | Category |
/// |-------|----------|
/// | 1000-1999 | Validation errors |
/// | 2000-2999 | State errors |
/// | 3000-3999 | Escrow errors |
/// | 4000-4999 | Arithmetic errors |
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors (1000-1999)
    // ========================================================================
    /// Invalid monetary amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Invalid currency code.
    #[error("invalid currency code: {0}")]
    InvalidCurrency(String),

    /// Invalid quantity value.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Invalid milestone schedule.
    #[error("invalid milestone schedule: {0}")]
    InvalidMilestoneSchedule(String),

    /// Generic validation error.
    #[error("validation error: {0}")]
    Validation(String),

    // ========================================================================
    // State Errors (2000-2999)
    // ========================================================================
    /// Illegal stage transition attempted.
    #[error("invalid stage transition from {from} to {to}")]
    InvalidStageTransition {
        /// The current stage.
        from: TradeStage,
        /// The attempted target stage.
        to: TradeStage,
    },

    /// Trade not found.
    #[error("trade not found: {0}")]
    TradeNotFound(String),

    /// Quote not found.
    #[error("quote not found: {0}")]
    QuoteNotFound(String),

    /// Escrow account not found.
    #[error("escrow account not found for trade: {0}")]
    EscrowNotFound(String),

    /// Entity already exists.
    #[error("entity already exists: {0}")]
    AlreadyExists(String),

    /// Operation not allowed in current state.
    #[error("operation not allowed: {0}")]
    OperationNotAllowed(String),

    // ========================================================================
    // Escrow Errors (3000-3999)
    // ========================================================================
    /// A hold already exists for the trade.
    #[error("escrow already holds funds for trade: {0}")]
    DoubleHold(String),

    /// The milestone has already been released.
    #[error("milestone already released: {0}")]
    MilestoneAlreadyReleased(String),

    /// The release would exceed the held amount.
    #[error("release of {requested} would exceed held amount ({held} held, {released} released)")]
    ReleaseExceedsHeld {
        /// The requested release amount.
        requested: String,
        /// The held amount.
        held: String,
        /// The already-released amount.
        released: String,
    },

    // ========================================================================
    // Arithmetic Errors (4000-4999)
    // ========================================================================
    /// Arithmetic overflow.
    #[error("arithmetic overflow")]
    Overflow,

    /// Arithmetic underflow.
    #[error("arithmetic underflow")]
    Underflow,

    /// Operands are denominated in different currencies.
    #[error("currency mismatch: {left} vs {right}")]
    CurrencyMismatch {
        /// Currency of the left operand.
        left: Currency,
        /// Currency of the right operand.
        right: Currency,
    },
}

impl DomainError {
    /// Returns the numeric error code.
    ///
    /// # Examples
    ///
    /// ```
    /// use trade_kernel::domain::errors::DomainError;
    ///
    /// assert_eq!(DomainError::InvalidAmount("test".to_string()).code(), 1001);
    /// assert_eq!(DomainError::Overflow.code(), 4001);
    /// ```
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            // Validation errors (1000-1999)
            Self::InvalidAmount(_) => 1001,
            Self::InvalidCurrency(_) => 1002,
            Self::InvalidQuantity(_) => 1003,
            Self::InvalidMilestoneSchedule(_) => 1004,
            Self::Validation(_) => 1099,

            // State errors (2000-2999)
            Self::InvalidStageTransition { .. } => 2001,
            Self::TradeNotFound(_) => 2002,
            Self::QuoteNotFound(_) => 2003,
            Self::EscrowNotFound(_) => 2004,
            Self::AlreadyExists(_) => 2005,
            Self::OperationNotAllowed(_) => 2099,

            // Escrow errors (3000-3999)
            Self::DoubleHold(_) => 3001,
            Self::MilestoneAlreadyReleased(_) => 3002,
            Self::ReleaseExceedsHeld { .. } => 3003,

            // Arithmetic errors (4000-4999)
            Self::Overflow => 4001,
            Self::Underflow => 4002,
            Self::CurrencyMismatch { .. } => 4003,
        }
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.code() {
            1000..=1999 => "validation",
            2000..=2999 => "state",
            3000..=3999 => "escrow",
            4000..=4999 => "arithmetic",
            _ => "unknown",
        }
    }

    /// Returns true if this is a validation error.
    #[inline]
    #[must_use]
    pub const fn is_validation_error(&self) -> bool {
        matches!(self.code(), 1000..=1999)
    }

    /// Returns true if this is a state error.
    #[inline]
    #[must_use]
    pub const fn is_state_error(&self) -> bool {
        matches!(self.code(), 2000..=2999)
    }

    /// Returns true if this is an escrow error.
    #[inline]
    #[must_use]
    pub const fn is_escrow_error(&self) -> bool {
        matches!(self.code(), 3000..=3999)
    }

    /// Returns true if this is an arithmetic error.
    #[inline]
    #[must_use]
    pub const fn is_arithmetic_error(&self) -> bool {
        matches!(self.code(), 4000..=4999)
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
