//! # Compliance Value Objects
//!
//! Read-only view of a party's compliance standing.
//!
//! The kernel never owns compliance data: profiles are fetched from the
//! external compliance collaborator and consulted by the guard evaluator.
//! This module provides the shapes of that data: [`KycStatus`],
//! [`Certificate`], and [`ComplianceProfile`].

use crate::domain::value_objects::ids::PartyId;
use crate::domain::value_objects::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// KYC (Know Your Customer) verification status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    /// Verification has not completed.
    #[default]
    Pending,
    /// Verification passed.
    Verified,
    /// Verification was rejected.
    Rejected,
}

impl KycStatus {
    /// Returns true if this status clears the compliance gate.
    #[inline]
    #[must_use]
    pub const fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

impl fmt::Display for KycStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        };
        write!(f, "{}", s)
    }
}

/// Certificate category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateType {
    /// Preferential-origin document (e.g. AfCFTA certificate) gating
    /// tariff treatment and final fund release.
    PreferentialOrigin,
    /// Third-party quality inspection report.
    QualityInspection,
    /// Export license.
    ExportLicense,
}

impl fmt::Display for CertificateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PreferentialOrigin => "preferential_origin",
            Self::QualityInspection => "quality_inspection",
            Self::ExportLicense => "export_license",
        };
        write!(f, "{}", s)
    }
}

/// A certificate held by a party, with its expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// The certificate category.
    pub cert_type: CertificateType,
    /// When the certificate expires.
    pub expires_at: Timestamp,
}

impl Certificate {
    /// Creates a new certificate.
    #[must_use]
    pub fn new(cert_type: CertificateType, expires_at: Timestamp) -> Self {
        Self {
            cert_type,
            expires_at,
        }
    }

    /// Returns true if the certificate is valid (unexpired) at `now`.
    #[inline]
    #[must_use]
    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        now.is_before(self.expires_at)
    }
}

/// A party's compliance profile.
///
/// Owned by the external compliance collaborator; read-only to the
/// kernel.
///
/// # Examples
///
/// ```
/// use trade_kernel::domain::value_objects::compliance::{
///     Certificate, CertificateType, ComplianceProfile, KycStatus,
/// };
/// use trade_kernel::domain::value_objects::ids::PartyId;
/// use trade_kernel::domain::value_objects::timestamp::Timestamp;
///
/// let profile = ComplianceProfile::new(
///     PartyId::new("SELLER_1"),
///     KycStatus::Verified,
///     vec![Certificate::new(
///         CertificateType::PreferentialOrigin,
///         Timestamp::now().add_secs(86_400),
///     )],
/// );
///
/// assert!(profile.kyc_status().is_verified());
/// assert!(profile.has_valid_certificate(CertificateType::PreferentialOrigin, Timestamp::now()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceProfile {
    party_id: PartyId,
    kyc_status: KycStatus,
    certificates: Vec<Certificate>,
}

impl ComplianceProfile {
    /// Creates a new compliance profile.
    #[must_use]
    pub fn new(party_id: PartyId, kyc_status: KycStatus, certificates: Vec<Certificate>) -> Self {
        Self {
            party_id,
            kyc_status,
            certificates,
        }
    }

    /// Returns the party this profile belongs to.
    #[inline]
    #[must_use]
    pub fn party_id(&self) -> &PartyId {
        &self.party_id
    }

    /// Returns the KYC status.
    #[inline]
    #[must_use]
    pub fn kyc_status(&self) -> KycStatus {
        self.kyc_status
    }

    /// Returns the certificates on file.
    #[inline]
    #[must_use]
    pub fn certificates(&self) -> &[Certificate] {
        &self.certificates
    }

    /// Returns true if the party holds an unexpired certificate of the
    /// given type at `now`.
    #[must_use]
    pub fn has_valid_certificate(&self, cert_type: CertificateType, now: Timestamp) -> bool {
        self.certificates
            .iter()
            .any(|cert| cert.cert_type == cert_type && cert.is_valid_at(now))
    }
}
