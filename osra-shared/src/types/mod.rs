//! This module defines the core data structures of the orphan registry.
//! It re-exports the record types, the enumerated lookups and their helpers.

pub mod address;
pub mod field_value;
pub mod orphan;
pub mod orphan_list;
pub mod sponsorship;
pub mod status;
pub mod variants;

pub use address::{Address, AddressChange};
pub use field_value::FieldValue;
pub use orphan::{Orphan, OrphanUpdate};
pub use orphan_list::{OrphanList, Partner};
pub use sponsorship::{Sponsor, Sponsorship};
pub use status::{OrphanSponsorshipStatus, OrphanStatus, Status, StatusCategory, StatusRef};
pub use variants::{Gender, ParseVariantError, Priority};
