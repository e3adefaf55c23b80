//! Declarative filters over the orphan collection.

use serde::{Deserialize, Serialize};

use crate::types::{Orphan, OrphanSponsorshipStatus, OrphanStatus, Priority};

/// A conjunction of collection predicates.
///
/// Each enabled predicate narrows the result; the empty filter matches every record.
/// Stores translate the same flags into their own query language, and `matches`
/// gives the reference semantics.
///
/// # Example
///
/// ```
/// use osra_shared::OrphanFilter;
///
/// let filter = OrphanFilter::new().active().unsponsored();
/// assert_eq!(filter, OrphanFilter::eligible());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrphanFilter {
    /// Status is "Active".
    pub active: bool,
    /// Sponsorship status is "Unsponsored".
    pub unsponsored: bool,
    /// Priority is "High".
    pub high_priority: bool,
}

impl OrphanFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active and unsponsored: the records that can take a new sponsor.
    pub fn eligible() -> Self {
        Self::new().active().unsponsored()
    }

    pub fn active(mut self) -> Self {
        self.active = true;
        self
    }

    pub fn unsponsored(mut self) -> Self {
        self.unsponsored = true;
        self
    }

    pub fn high_priority(mut self) -> Self {
        self.high_priority = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        !(self.active || self.unsponsored || self.high_priority)
    }

    pub fn matches(&self, orphan: &Orphan) -> bool {
        (!self.active || orphan.orphan_status == Some(OrphanStatus::Active))
            && (!self.unsponsored
                || orphan.orphan_sponsorship_status == Some(OrphanSponsorshipStatus::Unsponsored))
            && (!self.high_priority || orphan.priority() == Some(Priority::High))
    }
}
