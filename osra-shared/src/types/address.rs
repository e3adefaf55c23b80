//! Addresses owned by an orphan record.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::{require_text, ValidationErrors};

/// A postal address. An orphan owns two of these: where the child was
/// originally registered and where the child lives now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: Uuid,
    pub city: Option<String>,
    pub province_code: Option<String>,
    pub neighborhood: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Address {
    /// Create an address with a fresh id and the required fields set.
    pub fn new(
        city: impl Into<String>,
        province_code: impl Into<String>,
        neighborhood: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            city: Some(city.into()),
            province_code: Some(province_code.into()),
            neighborhood: Some(neighborhood.into()),
            street: None,
            details: None,
        }
    }

    pub fn with_street(mut self, street: impl Into<String>) -> Self {
        self.street = Some(street.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Presence rules of the address itself.
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::default();
        require_text(&mut errors, "city", self.city.as_deref());
        require_text(&mut errors, "province_code", self.province_code.as_deref());
        require_text(&mut errors, "neighborhood", self.neighborhood.as_deref());
        errors
    }
}

/// Nested-update instruction for one of the orphan's addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "address", rename_all = "snake_case")]
pub enum AddressChange {
    /// Leave the current address untouched.
    #[default]
    Keep,
    /// Create or replace the address.
    Set(Address),
    /// Remove the address.
    Destroy,
}

impl AddressChange {
    /// Apply the instruction to an address slot.
    pub fn apply_to(self, slot: &mut Option<Address>) {
        match self {
            AddressChange::Keep => {}
            AddressChange::Set(address) => *slot = Some(address),
            AddressChange::Destroy => *slot = None,
        }
    }
}
