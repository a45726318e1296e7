//! # Domain Errors
//!
//! Typed errors for domain operations.

pub mod domain_error;

pub use domain_error::{DomainError, DomainResult};
