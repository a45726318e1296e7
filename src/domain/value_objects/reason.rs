//! # Reason Codes
//!
//! Machine-readable causes for blocked transitions.
//!
//! Every rejected transition carries exactly one [`ReasonCode`]: the
//! first failing check wins, giving the caller one actionable cause
//! instead of an exhaustive list.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Why a transition was blocked.
///
/// Serialized in SCREAMING_SNAKE_CASE; this is the wire contract the
/// trade workspace UI keys its remediation banners on.
///
/// # Examples
///
/// ```
/// use trade_kernel::domain::value_objects::reason::ReasonCode;
///
/// let json = serde_json::to_string(&ReasonCode::FundingRequired).unwrap();
/// assert_eq!(json, "\"FUNDING_REQUIRED\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    /// A party's KYC verification is not complete.
    CompliancePending,
    /// Entering `contracted` requires an accepted quote reference.
    QuoteRequired,
    /// Entering `escrow_funded` requires the full amount on hold.
    FundingRequired,
    /// A release-affecting stage requires an unexpired certificate.
    CertificateMissing,
    /// A collaborator call did not respond in time.
    ExternalTimeout,
    /// The requested target is not a legal next stage.
    InvalidTransition,
    /// Another transition committed first for the same trade.
    ConcurrencyConflict,
}

impl ReasonCode {
    /// Returns a short human-readable description of the cause.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::CompliancePending => "a party's KYC verification is pending",
            Self::QuoteRequired => "an accepted quote is required",
            Self::FundingRequired => "the escrow hold does not cover the trade amount",
            Self::CertificateMissing => "a required certificate is missing or expired",
            Self::ExternalTimeout => "an external collaborator did not respond in time",
            Self::InvalidTransition => "the requested stage is not a legal next stage",
            Self::ConcurrencyConflict => "another transition committed first",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CompliancePending => "COMPLIANCE_PENDING",
            Self::QuoteRequired => "QUOTE_REQUIRED",
            Self::FundingRequired => "FUNDING_REQUIRED",
            Self::CertificateMissing => "CERTIFICATE_MISSING",
            Self::ExternalTimeout => "EXTERNAL_TIMEOUT",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::ConcurrencyConflict => "CONCURRENCY_CONFLICT",
        };
        write!(f, "{}", s)
    }
}

/// Error returned when parsing an unknown reason code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidReasonCodeError(pub String);

impl fmt::Display for InvalidReasonCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid reason code: {}", self.0)
    }
}

impl std::error::Error for InvalidReasonCodeError {}

impl FromStr for ReasonCode {
    type Err = InvalidReasonCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COMPLIANCE_PENDING" => Ok(Self::CompliancePending),
            "QUOTE_REQUIRED" => Ok(Self::QuoteRequired),
            "FUNDING_REQUIRED" => Ok(Self::FundingRequired),
            "CERTIFICATE_MISSING" => Ok(Self::CertificateMissing),
            "EXTERNAL_TIMEOUT" => Ok(Self::ExternalTimeout),
            "INVALID_TRANSITION" => Ok(Self::InvalidTransition),
            "CONCURRENCY_CONFLICT" => Ok(Self::ConcurrencyConflict),
            other => Err(InvalidReasonCodeError(other.to_string())),
        }
    }
}
