//! Caller-supplied values that may not have parsed.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A value supplied by a caller that either parsed into `T` or was kept as raw text.
///
/// Form input arrives as text. Keeping the raw text lets validation report a
/// malformed date or an unknown choice instead of losing the field at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue<T> {
    /// The input parsed successfully.
    Valid(T),
    /// The raw input, which did not parse.
    Invalid(String),
}

impl<T> FieldValue<T> {
    /// Returns the parsed value, if any.
    pub fn valid(&self) -> Option<&T> {
        match self {
            Self::Valid(value) => Some(value),
            Self::Invalid(_) => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// True for raw input that is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Invalid(raw) if raw.trim().is_empty())
    }
}

impl<T: FromStr> FieldValue<T> {
    /// Parse raw text, keeping the text when it does not parse.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use osra_shared::FieldValue;
    ///
    /// let parsed: FieldValue<NaiveDate> = FieldValue::parse("2020-01-01");
    /// assert!(parsed.is_valid());
    ///
    /// let raw: FieldValue<NaiveDate> = FieldValue::parse("2020-02-30");
    /// assert_eq!(raw, FieldValue::Invalid("2020-02-30".to_string()));
    /// ```
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<T>() {
            Ok(value) => Self::Valid(value),
            Err(_) => Self::Invalid(raw.to_string()),
        }
    }
}

impl<T> From<T> for FieldValue<T> {
    fn from(value: T) -> Self {
        Self::Valid(value)
    }
}
