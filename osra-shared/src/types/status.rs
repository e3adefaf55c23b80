//! Orphan and sponsorship statuses.
//!
//! Statuses are stored in lookup tables keyed by name. Each table is mirrored by an
//! enum here, so a status is always one of the known rows and the stored name is a
//! fixed mapping rather than free text.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a status lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    /// Active/inactive lifecycle of the record.
    Orphan,
    /// Sponsored/unsponsored state of the record.
    Sponsorship,
}

impl StatusCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCategory::Orphan => "orphan",
            StatusCategory::Sponsorship => "sponsorship",
        }
    }

    /// Names of every row the lookup table is seeded with.
    pub fn names(&self) -> Vec<&'static str> {
        match self {
            StatusCategory::Orphan => OrphanStatus::ALL.iter().map(|s| s.name()).collect(),
            StatusCategory::Sponsorship => OrphanSponsorshipStatus::ALL
                .iter()
                .map(|s| s.name())
                .collect(),
        }
    }
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An enum mirroring one status lookup table.
pub trait Status: Copy + PartialEq + Send + Sync + 'static {
    /// The lookup table this status lives in.
    const CATEGORY: StatusCategory;
    /// Every row of the lookup table.
    const ALL: &'static [Self];

    /// The stored name of the status.
    fn name(&self) -> &'static str;

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|status| status.name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrphanStatus {
    Active,
    Inactive,
    #[serde(rename = "On Hold")]
    OnHold,
    #[serde(rename = "Under Revision")]
    UnderRevision,
}

impl Status for OrphanStatus {
    const CATEGORY: StatusCategory = StatusCategory::Orphan;
    const ALL: &'static [Self] = &[
        OrphanStatus::Active,
        OrphanStatus::Inactive,
        OrphanStatus::OnHold,
        OrphanStatus::UnderRevision,
    ];

    fn name(&self) -> &'static str {
        match self {
            OrphanStatus::Active => "Active",
            OrphanStatus::Inactive => "Inactive",
            OrphanStatus::OnHold => "On Hold",
            OrphanStatus::UnderRevision => "Under Revision",
        }
    }
}

impl fmt::Display for OrphanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrphanSponsorshipStatus {
    Unsponsored,
    Sponsored,
    #[serde(rename = "Previously Sponsored")]
    PreviouslySponsored,
    #[serde(rename = "On Hold")]
    OnHold,
}

impl Status for OrphanSponsorshipStatus {
    const CATEGORY: StatusCategory = StatusCategory::Sponsorship;
    const ALL: &'static [Self] = &[
        OrphanSponsorshipStatus::Unsponsored,
        OrphanSponsorshipStatus::Sponsored,
        OrphanSponsorshipStatus::PreviouslySponsored,
        OrphanSponsorshipStatus::OnHold,
    ];

    fn name(&self) -> &'static str {
        match self {
            OrphanSponsorshipStatus::Unsponsored => "Unsponsored",
            OrphanSponsorshipStatus::Sponsored => "Sponsored",
            OrphanSponsorshipStatus::PreviouslySponsored => "Previously Sponsored",
            OrphanSponsorshipStatus::OnHold => "On Hold",
        }
    }
}

impl fmt::Display for OrphanSponsorshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolved row of a status lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRef {
    pub id: i32,
    pub category: StatusCategory,
    pub name: String,
}

impl StatusRef {
    /// Convert the row into its enum, if it belongs to `S`'s table and names a known status.
    pub fn resolve<S: Status>(&self) -> Option<S> {
        if self.category != S::CATEGORY {
            return None;
        }
        S::from_name(&self.name)
    }
}
