//! # Kernel Store Trait
//!
//! Port definition for kernel persistence.
//!
//! The store owns the persisted layout from the external contract: one
//! row per trade, one row per escrow account keyed by trade id, one
//! append-only row per transition event. The store's
//! [`commit_transition`](KernelStore::commit_transition) is the atomic
//! write path of the transition engine: trade write, escrow write, and
//! audit append apply together or not at all, guarded by a version
//! compare-and-swap on the trade row.

use crate::domain::entities::escrow::EscrowAccount;
use crate::domain::entities::quote::Quote;
use crate::domain::entities::trade::Trade;
use crate::domain::events::transition_event::TransitionEvent;
use crate::domain::value_objects::ids::{QuoteId, TradeId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The stored trade version did not match the expected version.
    #[error("version conflict on {entity} {id}: expected {expected}, found {actual}")]
    VersionConflict {
        /// The entity kind.
        entity: &'static str,
        /// The entity identifier.
        id: String,
        /// The version the writer expected.
        expected: u64,
        /// The version actually stored.
        actual: u64,
    },

    /// The entity already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Failed to serialize or deserialize persisted state.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Database connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Query execution error.
    #[error("query error: {0}")]
    Query(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Creates a version conflict error.
    #[must_use]
    pub fn version_conflict(
        entity: &'static str,
        id: impl Into<String>,
        expected: u64,
        actual: u64,
    ) -> Self {
        Self::VersionConflict {
            entity,
            id: id.into(),
            expected,
            actual,
        }
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error.
    #[must_use]
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if this is a version conflict.
    #[inline]
    #[must_use]
    pub const fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A transition event as persisted, with its assigned sequence number.
///
/// Sequence numbers are global and strictly increasing across the whole
/// ledger, making audit replay deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// Global, strictly increasing sequence number.
    pub sequence: u64,
    /// The recorded transition attempt.
    pub event: TransitionEvent,
}

impl fmt::Display for RecordedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.sequence, self.event)
    }
}

/// Trait for kernel persistence.
///
/// Trades, escrow accounts, and quotes are row-per-entity; transition
/// events are append-only; they can only be added, never modified or
/// deleted.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` for use in async contexts.
#[async_trait]
pub trait KernelStore: Send + Sync + fmt::Debug {
    /// Inserts a new trade together with its empty escrow account.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] if the trade id is taken.
    async fn insert_trade(&self, trade: &Trade, escrow: &EscrowAccount) -> StoreResult<()>;

    /// Fetches a trade by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the trade cannot be read.
    async fn get_trade(&self, id: &TradeId) -> StoreResult<Option<Trade>>;

    /// Fetches the escrow account of a trade.
    ///
    /// # Errors
    ///
    /// Returns an error if the account cannot be read.
    async fn get_escrow(&self, trade_id: &TradeId) -> StoreResult<Option<EscrowAccount>>;

    /// Saves an escrow account outside the transition path (funding).
    ///
    /// # Errors
    ///
    /// Returns an error if the account cannot be written.
    async fn save_escrow(&self, escrow: &EscrowAccount) -> StoreResult<()>;

    /// Saves a quote written by the supplier collaborator.
    ///
    /// # Errors
    ///
    /// Returns an error if the quote cannot be written.
    async fn save_quote(&self, quote: &Quote) -> StoreResult<()>;

    /// Fetches a quote by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the quote cannot be read.
    async fn get_quote(&self, id: &QuoteId) -> StoreResult<Option<Quote>>;

    /// Appends an audit event outside the transition commit (blocked
    /// attempts), assigning its sequence number.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be appended.
    async fn append_event(&self, event: TransitionEvent) -> StoreResult<RecordedEvent>;

    /// Atomically commits a successful transition: the trade write, the
    /// escrow write, and the success event apply together or not at all.
    ///
    /// The stored trade's version must equal `expected_version` at commit
    /// time; the caller passes the version it read before mutating.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::VersionConflict`] if another transition
    /// committed first.
    async fn commit_transition(
        &self,
        expected_version: u64,
        trade: &Trade,
        escrow: &EscrowAccount,
        event: TransitionEvent,
    ) -> StoreResult<RecordedEvent>;

    /// Returns the audit tail of a trade, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the tail cannot be read.
    async fn tail(&self, trade_id: &TradeId, limit: usize) -> StoreResult<Vec<RecordedEvent>>;

    /// Returns the total number of recorded events.
    ///
    /// # Errors
    ///
    /// Returns an error if the count cannot be read.
    async fn count_events(&self) -> StoreResult<u64>;
}
