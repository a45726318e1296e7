//! # Milestone Schedule
//!
//! Fixed stage-entry to escrow-release mappings.
//!
//! A trade's [`MilestoneSchedule`] is set at creation and never
//! renegotiated mid-flight. Each scheduled release names the stage whose
//! entry triggers it and the share of the held amount it releases, in
//! basis points. Entering [`TradeStage::Settled`] always releases the
//! remainder under the reserved [`final`](MilestoneSchedule::FINAL)
//! milestone, so the schedule itself only lists partial releases.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::ids::MilestoneId;
use crate::domain::value_objects::stage::TradeStage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Basis points in one whole (100%).
const FULL_BASIS_POINTS: u32 = 10_000;

/// A single scheduled partial release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledRelease {
    /// The milestone released when the stage is entered.
    pub milestone: MilestoneId,
    /// The stage whose entry triggers the release.
    pub on_entry: TradeStage,
    /// The share of the held amount to release, in basis points.
    pub basis_points: u16,
}

/// The fixed release schedule of a trade.
///
/// # Invariants
///
/// - Scheduled partial releases sum to at most 10 000 basis points.
/// - Every trigger stage lies on the spine between `escrow_funded`
///   (exclusive) and `settled` (exclusive).
/// - Milestone identifiers are unique and never reuse the reserved
///   `final` identifier.
///
/// # Examples
///
/// ```
/// use trade_kernel::domain::value_objects::milestone::MilestoneSchedule;
/// use trade_kernel::domain::value_objects::stage::TradeStage;
///
/// let schedule = MilestoneSchedule::standard();
/// let due = schedule.releases_on(TradeStage::InTransit);
/// assert_eq!(due.len(), 1);
/// assert_eq!(due[0].basis_points, 3_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneSchedule {
    releases: Vec<ScheduledRelease>,
}

impl MilestoneSchedule {
    /// Reserved identifier for the remainder released on settlement.
    pub const FINAL: &'static str = "final";

    /// The standard schedule: 30% released on entering `in_transit`,
    /// the remainder on settlement.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            releases: vec![ScheduledRelease {
                milestone: MilestoneId::new("transit"),
                on_entry: TradeStage::InTransit,
                basis_points: 3_000,
            }],
        }
    }

    /// Creates a validated schedule from explicit partial releases.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidMilestoneSchedule`] if the shares
    /// exceed 100%, a trigger stage is not a spine stage strictly between
    /// `escrow_funded` and `settled`, a milestone identifier repeats, or
    /// the reserved `final` identifier is used.
    pub fn new(releases: Vec<ScheduledRelease>) -> DomainResult<Self> {
        let mut total: u32 = 0;
        for (i, release) in releases.iter().enumerate() {
            total += u32::from(release.basis_points);

            let funded_index = TradeStage::EscrowFunded
                .spine_index()
                .unwrap_or_default();
            let settled_index = TradeStage::Settled.spine_index().unwrap_or_default();
            match release.on_entry.spine_index() {
                Some(index) if index > funded_index && index < settled_index => {}
                _ => {
                    return Err(DomainError::InvalidMilestoneSchedule(format!(
                        "stage {} cannot trigger a release",
                        release.on_entry
                    )));
                }
            }

            if release.milestone.as_str() == Self::FINAL {
                return Err(DomainError::InvalidMilestoneSchedule(format!(
                    "milestone identifier {} is reserved",
                    Self::FINAL
                )));
            }
            if releases[..i]
                .iter()
                .any(|earlier| earlier.milestone == release.milestone)
            {
                return Err(DomainError::InvalidMilestoneSchedule(format!(
                    "duplicate milestone identifier {}",
                    release.milestone
                )));
            }
        }
        if total > FULL_BASIS_POINTS {
            return Err(DomainError::InvalidMilestoneSchedule(format!(
                "scheduled releases exceed 100%: {total} basis points"
            )));
        }
        Ok(Self { releases })
    }

    /// Returns the partial releases triggered by entering `stage`.
    #[must_use]
    pub fn releases_on(&self, stage: TradeStage) -> Vec<&ScheduledRelease> {
        self.releases
            .iter()
            .filter(|release| release.on_entry == stage)
            .collect()
    }

    /// Returns the milestone released as the settlement remainder.
    #[must_use]
    pub fn final_milestone() -> MilestoneId {
        MilestoneId::new(Self::FINAL)
    }

    /// Returns all scheduled partial releases.
    #[must_use]
    pub fn releases(&self) -> &[ScheduledRelease] {
        &self.releases
    }
}

impl fmt::Display for MilestoneSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for release in &self.releases {
            write!(
                f,
                "[{} @ {} = {}bp]",
                release.milestone, release.on_entry, release.basis_points
            )?;
        }
        write!(f, "[{} @ {} = remainder]", Self::FINAL, TradeStage::Settled)
    }
}
