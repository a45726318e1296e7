//! # Application Errors
//!
//! Error types for the application layer.
//!
//! These are infrastructure-level failures that can occur while driving
//! the kernel: missing aggregates, store failures, collaborator
//! failures, and losing the per-trade write race. Business-rule
//! rejections are *not* errors; they travel as structured
//! [`TransitionOutcome::Rejected`](crate::application::use_cases::transition_trade::TransitionOutcome)
//! values so every caller always has a reason code to act on.

use crate::application::services::retry::Retryable;
use crate::domain::errors::DomainError;
use crate::infrastructure::persistence::traits::StoreError;
use thiserror::Error;

/// Error returned by collaborator calls (compliance provider, escrow
/// custodian).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    /// The collaborator did not respond within the bounded timeout.
    #[error("collaborator call timed out: {0}")]
    Timeout(String),

    /// The collaborator is unreachable or returned a failure.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    /// The collaborator returned a response the kernel cannot interpret.
    #[error("invalid collaborator response: {0}")]
    InvalidResponse(String),
}

/// Application layer error.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Trade not found.
    #[error("trade not found: {0}")]
    TradeNotFound(String),

    /// Escrow account missing for an existing trade.
    #[error("escrow account not found for trade: {0}")]
    EscrowNotFound(String),

    /// Another transition committed first for the same trade.
    #[error("concurrent transition in progress for trade: {0}")]
    ConcurrencyConflict(String),

    /// Domain rule violation.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// Store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Collaborator failure outside the guarded transition path.
    #[error("collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    /// Request validation failed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this is a concurrency conflict.
    #[inline]
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict(_))
    }
}

impl Retryable for ApplicationError {
    fn is_retryable(&self) -> bool {
        self.is_conflict()
    }
}

/// Result type for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_is_retryable() {
        let err = ApplicationError::ConcurrencyConflict("t-1".to_string());
        assert!(err.is_conflict());
        assert!(err.is_retryable());
    }

    #[test]
    fn other_errors_are_not_retryable() {
        assert!(!ApplicationError::TradeNotFound("t-1".to_string()).is_retryable());
        assert!(!ApplicationError::validation("bad request").is_retryable());
        assert!(!ApplicationError::Collaborator(CollaboratorError::Timeout(
            "compliance".to_string()
        ))
        .is_retryable());
    }

    #[test]
    fn from_domain_error() {
        let err: ApplicationError = DomainError::Overflow.into();
        assert!(err.to_string().contains("overflow"));
    }

    #[test]
    fn from_store_error() {
        let err: ApplicationError = StoreError::query("boom").into();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn collaborator_error_display() {
        let err = CollaboratorError::Timeout("compliance profile lookup".to_string());
        assert_eq!(
            err.to_string(),
            "collaborator call timed out: compliance profile lookup"
        );
    }
}
