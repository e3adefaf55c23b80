//! The orphan record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    Address, AddressChange, FieldValue, Gender, OrphanSponsorshipStatus, OrphanStatus, Priority,
};

/// One beneficiary record.
///
/// Every caller-supplied field is optional so that incomplete input can be held,
/// validated and reported on. `osra_num` and `sequential_id` are assigned once when
/// the record is first persisted and are never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Orphan {
    pub id: Uuid,
    pub osra_num: Option<String>,
    pub sequential_id: Option<i64>,

    pub name: Option<String>,
    pub father_name: Option<String>,
    pub father_is_martyr: Option<bool>,
    pub father_date_of_death: Option<FieldValue<NaiveDate>>,
    pub mother_name: Option<String>,
    pub mother_alive: Option<bool>,
    pub date_of_birth: Option<FieldValue<NaiveDate>>,
    pub gender: Option<FieldValue<Gender>>,
    pub contact_number: Option<String>,
    pub sponsored_by_another_org: Option<bool>,
    pub minor_siblings_count: Option<i32>,

    pub original_address: Option<Address>,
    pub current_address: Option<Address>,

    pub orphan_status: Option<OrphanStatus>,
    pub orphan_sponsorship_status: Option<OrphanSponsorshipStatus>,
    pub priority: Option<FieldValue<Priority>>,
    pub orphan_list_id: Option<Uuid>,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Orphan {
    /// Create an empty, unpersisted record with a fresh id.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            osra_num: None,
            sequential_id: None,
            name: None,
            father_name: None,
            father_is_martyr: None,
            father_date_of_death: None,
            mother_name: None,
            mother_alive: None,
            date_of_birth: None,
            gender: None,
            contact_number: None,
            sponsored_by_another_org: None,
            minor_siblings_count: None,
            original_address: None,
            current_address: None,
            orphan_status: None,
            orphan_sponsorship_status: None,
            priority: None,
            orphan_list_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// The child's name followed by the father's name.
    ///
    /// # Example
    ///
    /// ```
    /// use osra_shared::Orphan;
    ///
    /// let mut orphan = Orphan::new();
    /// orphan.name = Some("Omar".to_string());
    /// orphan.father_name = Some("Hassan".to_string());
    /// assert_eq!(orphan.full_name(), "Omar Hassan");
    /// ```
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.name.as_deref().unwrap_or_default(),
            self.father_name.as_deref().unwrap_or_default()
        )
    }

    /// Whether the record has been written to the store.
    pub fn is_persisted(&self) -> bool {
        self.created_at.is_some()
    }

    pub fn priority(&self) -> Option<Priority> {
        self.priority.as_ref().and_then(FieldValue::valid).copied()
    }

    pub fn date_of_birth(&self) -> Option<NaiveDate> {
        self.date_of_birth.as_ref().and_then(FieldValue::valid).copied()
    }

    pub fn father_date_of_death(&self) -> Option<NaiveDate> {
        self.father_date_of_death
            .as_ref()
            .and_then(FieldValue::valid)
            .copied()
    }

    /// Apply a direct field update, including nested address changes.
    ///
    /// The OSRA number, sequence number and timestamps are not touched.
    pub fn apply(&mut self, update: OrphanUpdate) {
        let OrphanUpdate {
            name,
            father_name,
            father_is_martyr,
            father_date_of_death,
            mother_name,
            mother_alive,
            date_of_birth,
            gender,
            contact_number,
            sponsored_by_another_org,
            minor_siblings_count,
            original_address,
            current_address,
            orphan_status,
            orphan_sponsorship_status,
            priority,
            orphan_list_id,
        } = update;

        set_if_some(&mut self.name, name);
        set_if_some(&mut self.father_name, father_name);
        set_if_some(&mut self.father_is_martyr, father_is_martyr);
        set_if_some(&mut self.father_date_of_death, father_date_of_death);
        set_if_some(&mut self.mother_name, mother_name);
        set_if_some(&mut self.mother_alive, mother_alive);
        set_if_some(&mut self.date_of_birth, date_of_birth);
        set_if_some(&mut self.gender, gender);
        set_if_some(&mut self.contact_number, contact_number);
        set_if_some(&mut self.sponsored_by_another_org, sponsored_by_another_org);
        set_if_some(&mut self.minor_siblings_count, minor_siblings_count);
        set_if_some(&mut self.orphan_status, orphan_status);
        set_if_some(&mut self.orphan_sponsorship_status, orphan_sponsorship_status);
        set_if_some(&mut self.priority, priority);
        set_if_some(&mut self.orphan_list_id, orphan_list_id);

        original_address.apply_to(&mut self.original_address);
        current_address.apply_to(&mut self.current_address);
    }
}

impl Default for Orphan {
    fn default() -> Self {
        Self::new()
    }
}

fn set_if_some<T>(slot: &mut Option<T>, value: Option<T>) {
    if let Some(value) = value {
        *slot = Some(value);
    }
}

/// A partial update of an orphan record. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrphanUpdate {
    pub name: Option<String>,
    pub father_name: Option<String>,
    pub father_is_martyr: Option<bool>,
    pub father_date_of_death: Option<FieldValue<NaiveDate>>,
    pub mother_name: Option<String>,
    pub mother_alive: Option<bool>,
    pub date_of_birth: Option<FieldValue<NaiveDate>>,
    pub gender: Option<FieldValue<Gender>>,
    pub contact_number: Option<String>,
    pub sponsored_by_another_org: Option<bool>,
    pub minor_siblings_count: Option<i32>,
    pub original_address: AddressChange,
    pub current_address: AddressChange,
    pub orphan_status: Option<OrphanStatus>,
    pub orphan_sponsorship_status: Option<OrphanSponsorshipStatus>,
    pub priority: Option<FieldValue<Priority>>,
    pub orphan_list_id: Option<Uuid>,
}
