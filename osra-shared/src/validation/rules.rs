use chrono::{Months, NaiveDate};

use super::{
    ValidationErrors, BLANK, INVALID_DATE, IN_FUTURE, NEGATIVE, NOT_INCLUDED, OUTSIDE_GESTATION,
};
use crate::types::{Address, FieldValue, Orphan};

/// Run every field and cross-field rule against `orphan`.
///
/// `today` is the reference date for the "not in the future" rules.
///
/// The `orphan_list` rule only checks that a list is referenced. Whether the list
/// exists is a question for the store and is checked by the persistence pipeline.
pub fn validate_orphan(orphan: &Orphan, today: NaiveDate) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    require_text(&mut errors, "name", orphan.name.as_deref());
    require_text(&mut errors, "father_name", orphan.father_name.as_deref());
    require_bool(&mut errors, "father_is_martyr", orphan.father_is_martyr);
    require_past_date(
        &mut errors,
        "father_date_of_death",
        orphan.father_date_of_death.as_ref(),
        today,
    );
    require_text(&mut errors, "mother_name", orphan.mother_name.as_deref());
    require_bool(&mut errors, "mother_alive", orphan.mother_alive);
    require_past_date(
        &mut errors,
        "date_of_birth",
        orphan.date_of_birth.as_ref(),
        today,
    );
    require_choice(&mut errors, "gender", orphan.gender.as_ref());
    require_text(&mut errors, "contact_number", orphan.contact_number.as_deref());
    require_bool(
        &mut errors,
        "sponsored_by_another_org",
        orphan.sponsored_by_another_org,
    );

    match orphan.minor_siblings_count {
        None => errors.add("minor_siblings_count", BLANK),
        Some(count) if count < 0 => errors.add("minor_siblings_count", NEGATIVE),
        Some(_) => {}
    }

    require_address(&mut errors, "original_address", orphan.original_address.as_ref());
    require_address(&mut errors, "current_address", orphan.current_address.as_ref());

    if orphan.orphan_status.is_none() {
        errors.add("orphan_status", BLANK);
    }
    require_choice(&mut errors, "priority", orphan.priority.as_ref());
    if orphan.orphan_sponsorship_status.is_none() {
        errors.add("orphan_sponsorship_status", BLANK);
    }
    if orphan.orphan_list_id.is_none() {
        errors.add("orphan_list", BLANK);
    }

    // Only applies when both dates parsed; malformed dates are reported above.
    if let (Some(father_date_of_death), Some(date_of_birth)) =
        (orphan.father_date_of_death(), orphan.date_of_birth())
    {
        if gestation_window_violated(father_date_of_death, date_of_birth) {
            errors.add("date_of_birth", OUTSIDE_GESTATION);
        }
    }

    errors
}

/// True when the child was born more than one calendar year after the father died.
///
/// A death on 29 February is extended to 28 February of the following year.
pub fn gestation_window_violated(father_date_of_death: NaiveDate, date_of_birth: NaiveDate) -> bool {
    father_date_of_death
        .checked_add_months(Months::new(12))
        .is_some_and(|limit| limit < date_of_birth)
}

pub(crate) fn require_text(errors: &mut ValidationErrors, field: &str, value: Option<&str>) {
    if value.map_or(true, |text| text.trim().is_empty()) {
        errors.add(field, BLANK);
    }
}

fn require_bool(errors: &mut ValidationErrors, field: &str, value: Option<bool>) {
    if value.is_none() {
        errors.add(field, NOT_INCLUDED);
    }
}

fn require_choice<T>(errors: &mut ValidationErrors, field: &str, value: Option<&FieldValue<T>>) {
    match value {
        None => errors.add(field, BLANK),
        Some(value) if value.is_blank() => errors.add(field, BLANK),
        Some(FieldValue::Invalid(_)) => errors.add(field, NOT_INCLUDED),
        Some(FieldValue::Valid(_)) => {}
    }
}

fn require_past_date(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&FieldValue<NaiveDate>>,
    today: NaiveDate,
) {
    match value {
        None => errors.add(field, BLANK),
        Some(value) if value.is_blank() => errors.add(field, BLANK),
        Some(FieldValue::Invalid(_)) => errors.add(field, INVALID_DATE),
        Some(FieldValue::Valid(date)) if *date > today => errors.add(field, IN_FUTURE),
        Some(FieldValue::Valid(_)) => {}
    }
}

fn require_address(errors: &mut ValidationErrors, field: &str, address: Option<&Address>) {
    match address {
        None => errors.add(field, BLANK),
        Some(address) => errors.merge_nested(field, address.validate()),
    }
}
