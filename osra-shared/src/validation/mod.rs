//! Field validation for orphan records.
//!
//! Validation never aborts on the first failure. Every rule runs and each failure
//! is collected into a `ValidationErrors` map keyed by field name, which the caller
//! can render next to the offending inputs.

mod errors;
mod rules;

pub use errors::ValidationErrors;
pub use rules::{gestation_window_violated, validate_orphan};

pub(crate) use rules::require_text;

pub const BLANK: &str = "can't be blank";
pub const NOT_INCLUDED: &str = "is not included in the list";
pub const INVALID_DATE: &str = "is not a valid date";
pub const IN_FUTURE: &str = "can't be in the future";
pub const NEGATIVE: &str = "must be greater than or equal to 0";
pub const OUTSIDE_GESTATION: &str =
    "date of birth must be within the gestation period of father's death";
