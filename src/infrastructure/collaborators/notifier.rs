//! # Transition Notifier Adapters
//!
//! Implementations of [`TransitionNotifier`].
//!
//! The kernel emits a `{trade_id, from, to}` notice on every successful
//! transition; an external dispatcher turns notices into buyer/seller
//! messages. The kernel never formats or sends messages itself.

use crate::application::error::CollaboratorError;
use crate::application::use_cases::transition_trade::{TransitionNotice, TransitionNotifier};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Notifier that only logs notices.
///
/// The default for deployments where the notification dispatcher tails
/// the audit ledger instead of consuming a push channel.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl TracingNotifier {
    /// Creates a new tracing notifier.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TransitionNotifier for TracingNotifier {
    async fn notify(&self, notice: TransitionNotice) -> Result<(), CollaboratorError> {
        info!(
            trade_id = %notice.trade_id,
            from = %notice.from_stage,
            to = %notice.to_stage,
            "trade transitioned"
        );
        Ok(())
    }
}

/// Notifier that records every notice, for tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    notices: Arc<RwLock<Vec<TransitionNotice>>>,
}

impl RecordingNotifier {
    /// Creates a new recording notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all notices recorded so far.
    pub async fn notices(&self) -> Vec<TransitionNotice> {
        self.notices.read().await.clone()
    }
}

#[async_trait]
impl TransitionNotifier for RecordingNotifier {
    async fn notify(&self, notice: TransitionNotice) -> Result<(), CollaboratorError> {
        self.notices.write().await.push(notice);
        Ok(())
    }
}
