//! # Compliance Collaborator Adapters
//!
//! Implementations of [`ComplianceProvider`].
//!
//! - [`StaticComplianceProvider`]: in-memory profiles for tests and
//!   single-node deployments.
//! - [`HttpComplianceProvider`]: fetches profiles from the hosted
//!   compliance service over HTTP.

use crate::application::error::CollaboratorError;
use crate::application::services::guard_evaluator::ComplianceProvider;
use crate::domain::value_objects::compliance::ComplianceProfile;
use crate::domain::value_objects::ids::PartyId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// In-memory implementation of [`ComplianceProvider`].
///
/// Profiles are registered up front; lookups for unknown parties fail as
/// unavailable, mirroring how the hosted service answers for unknown
/// ids.
#[derive(Debug, Clone, Default)]
pub struct StaticComplianceProvider {
    profiles: Arc<RwLock<HashMap<String, ComplianceProfile>>>,
}

impl StaticComplianceProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a party's profile.
    pub async fn put(&self, profile: ComplianceProfile) {
        let mut profiles = self.profiles.write().await;
        profiles.insert(profile.party_id().to_string(), profile);
    }
}

#[async_trait]
impl ComplianceProvider for StaticComplianceProvider {
    async fn profile(&self, party: &PartyId) -> Result<ComplianceProfile, CollaboratorError> {
        let profiles = self.profiles.read().await;
        profiles
            .get(party.as_str())
            .cloned()
            .ok_or_else(|| CollaboratorError::Unavailable(format!("no profile for {party}")))
    }
}

/// HTTP implementation of [`ComplianceProvider`].
///
/// Fetches `GET {base_url}/parties/{party_id}/compliance` and expects
/// the JSON shape of [`ComplianceProfile`]. The request timeout is the
/// outer bound; the guard evaluator applies its own tighter timeout on
/// top.
#[derive(Debug, Clone)]
pub struct HttpComplianceProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpComplianceProvider {
    /// Creates a provider against the given base URL.
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
}

#[async_trait]
impl ComplianceProvider for HttpComplianceProvider {
    async fn profile(&self, party: &PartyId) -> Result<ComplianceProfile, CollaboratorError> {
        let url = format!("{}/parties/{}/compliance", self.base_url, party);
        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                CollaboratorError::Timeout(url.clone())
            } else {
                CollaboratorError::Unavailable(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(CollaboratorError::Unavailable(format!(
                "{url} returned {}",
                response.status()
            )));
        }

        response
            .json::<ComplianceProfile>()
            .await
            .map_err(|e| CollaboratorError::InvalidResponse(e.to_string()))
    }
}
