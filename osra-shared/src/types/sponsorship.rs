//! Sponsors and the join records linking them to orphans.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sponsor {
    pub id: Uuid,
    pub name: String,
}

/// Links one sponsor to one orphan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sponsorship {
    pub id: Uuid,
    pub orphan_id: Uuid,
    pub sponsor_id: Uuid,
    pub start_date: NaiveDate,
    pub active: bool,
}

impl Sponsorship {
    pub fn new(orphan_id: Uuid, sponsor_id: Uuid, start_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            orphan_id,
            sponsor_id,
            start_date,
            active: true,
        }
    }
}
