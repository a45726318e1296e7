//! # Use Cases
//!
//! The kernel's operations: trade creation, transition requests, and
//! state reads.

pub mod create_trade;
pub mod get_trade_state;
pub mod transition_trade;

pub use create_trade::{CreateTrade, CreateTradeRequest};
pub use get_trade_state::{GetTradeState, TradeStateView};
pub use transition_trade::{
    Rejection, TransitionEngine, TransitionMetadata, TransitionNotice, TransitionNotifier,
    TransitionOutcome,
};
