//! # Application Services
//!
//! Guard evaluation, escrow orchestration, projection, locking, and
//! retry policy.

pub mod escrow_ledger;
pub mod guard_evaluator;
pub mod locks;
pub mod projector;
pub mod retry;

pub use escrow_ledger::{plan_releases, EscrowCustodian, EscrowLedger, PlannedRelease};
pub use guard_evaluator::{ComplianceProvider, GuardEvaluator, GuardFailure, GuardResult};
pub use locks::TradeLocks;
pub use projector::{project, NextAction, TradeProjection};
pub use retry::{execute_with_retry, RetryPolicy, Retryable};
