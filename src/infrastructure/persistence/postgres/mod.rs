//! # PostgreSQL Persistence
//!
//! Store implementation backed by sqlx.

pub mod store;

pub use store::PostgresKernelStore;
