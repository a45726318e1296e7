//! # Escrow Custodian Adapters
//!
//! Implementations of [`EscrowCustodian`].
//!
//! - [`InMemoryCustodian`]: records holds and releases in memory; used
//!   in tests and single-node deployments. Can be configured to delay or
//!   fail for failure-path testing.
//! - [`HttpCustodian`]: drives the hosted custodian service over HTTP.

use crate::application::error::CollaboratorError;
use crate::application::services::escrow_ledger::EscrowCustodian;
use crate::domain::value_objects::ids::{MilestoneId, TradeId};
use crate::domain::value_objects::money::Money;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// A custodian-side movement, as recorded by [`InMemoryCustodian`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustodianMovement {
    /// A hold was placed.
    Hold {
        /// The amount held.
        amount: Money,
    },
    /// A milestone release was executed.
    Release {
        /// The released milestone.
        milestone: MilestoneId,
        /// The released amount.
        amount: Money,
    },
}

/// In-memory implementation of [`EscrowCustodian`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryCustodian {
    movements: Arc<RwLock<HashMap<TradeId, Vec<CustodianMovement>>>>,
    delay: Option<Duration>,
    fail: bool,
}

impl InMemoryCustodian {
    /// Creates a new custodian with no recorded movements.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures an artificial delay on every call, for timeout tests.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Configures every call to fail, for failure-path tests.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Returns the movements recorded for a trade.
    pub async fn movements(&self, trade_id: TradeId) -> Vec<CustodianMovement> {
        let movements = self.movements.read().await;
        movements.get(&trade_id).cloned().unwrap_or_default()
    }

    async fn simulate(&self) -> Result<(), CollaboratorError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(CollaboratorError::Unavailable(
                "custodian configured to fail".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl EscrowCustodian for InMemoryCustodian {
    async fn hold(&self, trade_id: TradeId, amount: &Money) -> Result<(), CollaboratorError> {
        self.simulate().await?;
        let mut movements = self.movements.write().await;
        movements
            .entry(trade_id)
            .or_default()
            .push(CustodianMovement::Hold {
                amount: amount.clone(),
            });
        Ok(())
    }

    async fn release(
        &self,
        trade_id: TradeId,
        milestone: &MilestoneId,
        amount: &Money,
    ) -> Result<(), CollaboratorError> {
        self.simulate().await?;
        let mut movements = self.movements.write().await;
        movements
            .entry(trade_id)
            .or_default()
            .push(CustodianMovement::Release {
                milestone: milestone.clone(),
                amount: amount.clone(),
            });
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct HoldRequest<'a> {
    amount: &'a Money,
}

#[derive(Debug, Serialize)]
struct ReleaseRequest<'a> {
    milestone: &'a MilestoneId,
    amount: &'a Money,
}

/// HTTP implementation of [`EscrowCustodian`].
///
/// Posts to `{base_url}/escrow/{trade_id}/hold` and
/// `{base_url}/escrow/{trade_id}/release`.
#[derive(Debug, Clone)]
pub struct HttpCustodian {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCustodian {
    /// Creates a custodian client against the given base URL.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError::Unavailable`] if the HTTP client
    /// cannot be constructed.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CollaboratorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CollaboratorError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn post<T: Serialize + Sync>(
        &self,
        url: String,
        body: &T,
    ) -> Result<(), CollaboratorError> {
        let response = self.client.post(&url).json(body).send().await.map_err(|e| {
            if e.is_timeout() {
                CollaboratorError::Timeout(url.clone())
            } else {
                CollaboratorError::Unavailable(e.to_string())
            }
        })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CollaboratorError::Unavailable(format!(
                "{url} returned {}",
                response.status()
            )))
        }
    }
}

#[async_trait]
impl EscrowCustodian for HttpCustodian {
    async fn hold(&self, trade_id: TradeId, amount: &Money) -> Result<(), CollaboratorError> {
        let url = format!("{}/escrow/{}/hold", self.base_url, trade_id);
        self.post(url, &HoldRequest { amount }).await
    }

    async fn release(
        &self,
        trade_id: TradeId,
        milestone: &MilestoneId,
        amount: &Money,
    ) -> Result<(), CollaboratorError> {
        let url = format!("{}/escrow/{}/release", self.base_url, trade_id);
        self.post(url, &ReleaseRequest { milestone, amount }).await
    }
}
