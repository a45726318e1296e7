//! # Application Layer
//!
//! Use cases, guard evaluation, escrow orchestration, and projection.
//! All collaborator and persistence dependencies enter through injected
//! trait objects; the layer holds no process-wide state.

pub mod error;
pub mod services;
pub mod use_cases;
