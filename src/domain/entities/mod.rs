//! # Domain Entities
//!
//! Aggregates with identity and lifecycle.
//!
//! - [`Trade`]: the trade aggregate, mutated only by the transition engine
//! - [`Quote`]: a supplier quote, referenced but never mutated once accepted
//! - [`EscrowAccount`]: per-trade held/released funds

pub mod escrow;
pub mod quote;
pub mod trade;

pub use escrow::{EscrowAccount, EscrowView};
pub use quote::{Incoterms, Quote, QuoteStatus};
pub use trade::{Trade, TradeDetails, TradeType};
