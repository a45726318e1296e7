//! # Value Objects
//!
//! Immutable types with validation and domain semantics.
//!
//! ## Identity Types
//!
//! - [`TradeId`], [`QuoteId`], [`EventId`]: UUID-based identifiers
//! - [`PartyId`], [`MilestoneId`]: String-based identifiers
//!
//! ## Monetary Types
//!
//! - [`Money`]: Currency-tagged decimal amount with checked arithmetic
//! - [`Currency`]: Validated ISO-4217 style currency code
//!
//! ## Lifecycle Types
//!
//! - [`TradeStage`]: Trade lifecycle state machine
//! - [`MilestoneSchedule`]: Fixed stage-entry → release-share mapping
//! - [`ReasonCode`]: Machine-readable blocked-transition causes
//!
//! ## Compliance Types
//!
//! - [`KycStatus`], [`Certificate`], [`ComplianceProfile`]: Read-only
//!   view of collaborator-owned compliance data

pub mod compliance;
pub mod ids;
pub mod milestone;
pub mod money;
pub mod reason;
pub mod stage;
pub mod timestamp;

pub use compliance::{Certificate, CertificateType, ComplianceProfile, KycStatus};
pub use ids::{EventId, MilestoneId, PartyId, QuoteId, TradeId};
pub use milestone::{MilestoneSchedule, ScheduledRelease};
pub use money::{Currency, Money};
pub use reason::{InvalidReasonCodeError, ReasonCode};
pub use stage::{InvalidTradeStageError, TradeStage};
pub use timestamp::Timestamp;
