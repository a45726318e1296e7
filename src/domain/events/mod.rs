//! # Domain Events
//!
//! Append-only transition records forming the audit trail.

pub mod transition_event;

pub use transition_event::{TransitionEvent, TransitionOutcomeKind};
