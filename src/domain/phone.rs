use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::sheet::CellValue;

static NON_DIGIT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9]+").unwrap());

/// Canonical identity of a phone number: the ASCII digits of the raw value.
///
/// Two raw values with the same digits are the same key no matter how they
/// were punctuated. A key is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneKey(String);

impl PhoneKey {
    /// Normalize a raw cell. `None` when the cell holds no digits at all.
    pub fn normalize(raw: &CellValue) -> Option<Self> {
        match raw {
            CellValue::Empty => None,
            CellValue::Text(text) => Self::parse(text),
            other => Self::parse(&other.to_string()),
        }
    }

    /// Strip every non-digit character from `raw`.
    ///
    /// No length or country-code validation happens here: `"0"` and a
    /// 40-digit string are both valid keys.
    pub fn parse(raw: &str) -> Option<Self> {
        let digits = NON_DIGIT_PATTERN.replace_all(raw, "");
        if digits.is_empty() {
            None
        } else {
            Some(Self(digits.into_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PhoneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PhoneKey {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("'{}' contains no digits", value))
    }
}

impl From<PhoneKey> for String {
    fn from(key: PhoneKey) -> Self {
        key.0
    }
}

/// Normalize every value in `raw`, dropping the ones without digits.
pub fn normalize_all<'a>(raw: impl IntoIterator<Item = &'a str>) -> Vec<PhoneKey> {
    raw.into_iter().filter_map(PhoneKey::parse).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_formatting() {
        let key = PhoneKey::parse("(555) 123-4567").unwrap();
        assert_eq!(key.as_str(), "5551234567");
        assert_eq!(PhoneKey::parse("+1 555.123.4567").unwrap().as_str(), "15551234567");
    }

    #[test]
    fn test_normalization_is_idempotent_over_rendering() {
        let key = PhoneKey::parse("5551234567").unwrap();
        for rendered in ["(555) 123-4567", "555-123-4567", "555.123.4567", " 555 123 4567 "] {
            let again = PhoneKey::parse(rendered).unwrap();
            assert_eq!(again, key);
            assert_eq!(PhoneKey::parse(again.as_str()).unwrap(), key);
        }
    }

    #[test]
    fn test_rejects_values_without_digits() {
        assert!(PhoneKey::parse("").is_none());
        assert!(PhoneKey::parse("n/a").is_none());
        assert!(PhoneKey::normalize(&CellValue::Empty).is_none());
        assert!(PhoneKey::normalize(&CellValue::Bool(true)).is_none());
    }

    #[test]
    fn test_accepts_any_digit_length() {
        assert_eq!(PhoneKey::parse("0").unwrap().as_str(), "0");
        let long = "1".repeat(40);
        assert_eq!(PhoneKey::parse(&long).unwrap().as_str(), long);
    }

    #[test]
    fn test_numeric_cells_use_whole_number_rendering() {
        let key = PhoneKey::normalize(&CellValue::Number(5551112222.0)).unwrap();
        assert_eq!(key.as_str(), "5551112222");
    }

    #[test]
    fn test_non_ascii_digits_are_stripped() {
        // Arabic-Indic digits are not part of the key alphabet
        assert!(PhoneKey::parse("٥٥٥").is_none());
    }

    #[test]
    fn test_normalize_all_skips_invalid() {
        let keys = normalize_all(["555-1", "", "abc", "(2)"]);
        let keys: Vec<_> = keys.iter().map(PhoneKey::as_str).collect();
        assert_eq!(keys, vec!["5551", "2"]);
    }
}
