//! # Create Trade Use Case
//!
//! Brings a trade into existence in its initial stage, with its escrow
//! account and fixed milestone schedule.
//!
//! RFQ trades start at `rfq_open`; direct orders start at `contracted`.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::domain::entities::escrow::EscrowAccount;
use crate::domain::entities::trade::{Trade, TradeType};
use crate::domain::value_objects::ids::PartyId;
use crate::domain::value_objects::money::{Currency, Money};
use crate::infrastructure::persistence::traits::KernelStore;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Request to create a trade.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTradeRequest {
    /// The trade type.
    pub trade_type: TradeType,
    /// The buying party.
    pub buyer: String,
    /// The selling party.
    pub seller: String,
    /// Total trade amount.
    pub amount: Decimal,
    /// Currency code of the amount.
    pub currency: String,
    /// Catalog reference of the product.
    pub product_ref: String,
    /// Quantity in catalog units.
    pub quantity: u64,
}

/// Use case creating trades.
#[derive(Debug, Clone)]
pub struct CreateTrade {
    store: Arc<dyn KernelStore>,
}

impl CreateTrade {
    /// Creates the use case.
    #[must_use]
    pub fn new(store: Arc<dyn KernelStore>) -> Self {
        Self { store }
    }

    /// Creates a trade and its empty escrow account.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the parties are empty, and domain
    /// errors for invalid amount, currency, or quantity.
    pub async fn execute(&self, request: CreateTradeRequest) -> ApplicationResult<Trade> {
        if request.buyer.trim().is_empty() {
            return Err(ApplicationError::validation("buyer must not be empty"));
        }
        if request.seller.trim().is_empty() {
            return Err(ApplicationError::validation("seller must not be empty"));
        }
        if request.buyer == request.seller {
            return Err(ApplicationError::validation(
                "buyer and seller must be different parties",
            ));
        }

        let currency = Currency::new(request.currency)?;
        let total = Money::new(request.amount, currency.clone())?;
        let buyer = PartyId::new(request.buyer);
        let seller = PartyId::new(request.seller);

        let trade = match request.trade_type {
            TradeType::Rfq => {
                Trade::new_rfq(buyer, seller, total, request.product_ref, request.quantity)?
            }
            TradeType::DirectOrder => Trade::new_direct_order(
                buyer,
                seller,
                total,
                request.product_ref,
                request.quantity,
            )?,
        };

        let escrow = EscrowAccount::new(trade.id(), currency);
        self.store.insert_trade(&trade, &escrow).await?;

        info!(
            trade_id = %trade.id(),
            trade_type = %trade.trade_type(),
            stage = %trade.stage(),
            "trade created"
        );
        Ok(trade)
    }
}
