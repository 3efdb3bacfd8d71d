//! Phone column selection.
//!
//! Picking the column is a heuristic: nothing checks that the chosen
//! column actually holds phone numbers. The policy sits behind a trait so
//! a stricter rule can replace it without touching the engine.

use serde::{Deserialize, Serialize};

/// Header fragments that mark a phone column, matched case-insensitively.
pub const PHONE_HEADER_KEYWORDS: [&str; 4] = ["phone", "mobile", "cell", "number"];

pub trait ColumnPolicy: Send + Sync {
    fn infer(&self, headers: &[String]) -> Option<String>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnPolicyKind {
    /// Keyword match, falling back to the first column.
    #[default]
    Keyword,
    /// Keyword match only.
    Strict,
}

impl ColumnPolicyKind {
    pub fn build(self) -> KeywordColumnPolicy {
        match self {
            ColumnPolicyKind::Keyword => KeywordColumnPolicy::default(),
            ColumnPolicyKind::Strict => KeywordColumnPolicy::strict(),
        }
    }
}

/// First header containing one of the keywords wins.
#[derive(Debug, Clone)]
pub struct KeywordColumnPolicy {
    keywords: Vec<String>,
    fallback_to_first: bool,
}

impl Default for KeywordColumnPolicy {
    fn default() -> Self {
        Self {
            keywords: PHONE_HEADER_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            fallback_to_first: true,
        }
    }
}

impl KeywordColumnPolicy {
    pub fn strict() -> Self {
        Self {
            fallback_to_first: false,
            ..Self::default()
        }
    }
}

impl ColumnPolicy for KeywordColumnPolicy {
    fn infer(&self, headers: &[String]) -> Option<String> {
        headers
            .iter()
            .find(|header| {
                let lower = header.to_lowercase();
                self.keywords.iter().any(|keyword| lower.contains(keyword.as_str()))
            })
            .or_else(|| {
                if self.fallback_to_first {
                    headers.first()
                } else {
                    None
                }
            })
            .cloned()
    }
}

/// Default inference rule: keyword match, else the first header.
pub fn infer_phone_column(headers: &[String]) -> Option<String> {
    KeywordColumnPolicy::default().infer(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_matches_keyword_case_insensitively() {
        assert_eq!(
            infer_phone_column(&headers(&["Name", "Mobile Number"])),
            Some("Mobile Number".to_string())
        );
        assert_eq!(
            infer_phone_column(&headers(&["id", "CELL"])),
            Some("CELL".to_string())
        );
    }

    #[test]
    fn test_first_match_in_header_order_wins() {
        assert_eq!(
            infer_phone_column(&headers(&["Account Number", "Phone"])),
            Some("Account Number".to_string())
        );
    }

    #[test]
    fn test_falls_back_to_first_header() {
        assert_eq!(
            infer_phone_column(&headers(&["Name", "City"])),
            Some("Name".to_string())
        );
    }

    #[test]
    fn test_no_headers_is_a_miss() {
        assert_eq!(infer_phone_column(&[]), None);
    }

    #[test]
    fn test_strict_policy_has_no_fallback() {
        let policy = ColumnPolicyKind::Strict.build();
        assert_eq!(policy.infer(&headers(&["Name", "City"])), None);
        assert_eq!(
            policy.infer(&headers(&["Name", "phone_1"])),
            Some("phone_1".to_string())
        );
    }
}
