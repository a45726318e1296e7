//! # Trade Lifecycle Kernel
//!
//! State machine kernel for a multi-party B2B trade marketplace: a trade
//! (RFQ or direct order) progresses through a fixed sequence of
//! commercial stages, gated by compliance and funding preconditions,
//! with escrow released only in lockstep with verified milestones, and
//! every attempted transition recorded in an immutable audit trail.
//!
//! ## Architecture
//!
//! This crate follows Domain-Driven Design with a layered architecture:
//!
//! - **Domain Layer** (`domain`): Entities, value objects, domain errors, and transition events
//! - **Application Layer** (`application`): The transition engine, guard evaluator, escrow ledger,
//!   read projector, and use cases
//! - **Infrastructure Layer** (`infrastructure`): Persistence and collaborator adapters
//! - **API Layer** (`api`): The REST interface
//!
//! ## Example
//!
//! ```rust,ignore
//! use trade_kernel::application::use_cases::transition_trade::{
//!     TransitionEngine, TransitionMetadata,
//! };
//! use trade_kernel::domain::value_objects::{PartyId, TradeStage};
//!
//! // Request a transition
//! let outcome = engine
//!     .transition(trade_id, TradeStage::Contracted, metadata)
//!     .await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
