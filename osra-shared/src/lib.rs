//! # OSRA Shared
//!
//! This crate defines the data structures shared across the OSRA orphan registry:
//! the `Orphan` record and its associated types, the field validation rules, the
//! OSRA number formatter and the collection filters.

pub mod filter;
pub mod identifier;
pub mod types;
pub mod validation;

pub use filter::OrphanFilter;
pub use identifier::{format_osra_num, DEFAULT_OSRA_NUM_WIDTH};
pub use types::{
    Address, AddressChange, FieldValue, Gender, Orphan, OrphanList, OrphanSponsorshipStatus,
    OrphanStatus, OrphanUpdate, ParseVariantError, Partner, Priority, Sponsor, Sponsorship,
    Status, StatusCategory, StatusRef,
};
pub use validation::{validate_orphan, ValidationErrors};
