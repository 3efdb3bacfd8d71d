use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use super::error::AppError;
use super::phone::PhoneKey;
use super::scrub_options::ScrubOptions;

/// Name of the list a suppressed number was matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceName {
    UserList,
    Dnc,
    Tcpa,
    /// Shared list applied to every job regardless of options.
    Global,
}

impl SourceName {
    pub fn is_enabled(&self, options: &ScrubOptions) -> bool {
        match self {
            SourceName::UserList => options.check_against_user_list,
            SourceName::Dnc => options.check_against_dnc,
            SourceName::Tcpa => options.check_against_tcpa,
            SourceName::Global => true,
        }
    }
}

/// Externally maintained compliance lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceList {
    Dnc,
    Tcpa,
}

impl ComplianceList {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceList::Dnc => "dnc",
            ComplianceList::Tcpa => "tcpa",
        }
    }

    pub fn source(&self) -> SourceName {
        match self {
            ComplianceList::Dnc => SourceName::Dnc,
            ComplianceList::Tcpa => SourceName::Tcpa,
        }
    }
}

impl fmt::Display for ComplianceList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplianceList {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dnc" => Ok(ComplianceList::Dnc),
            "tcpa" => Ok(ComplianceList::Tcpa),
            other => Err(AppError::InvalidInput(format!(
                "Unknown compliance list '{}', expected 'dnc' or 'tcpa'",
                other
            ))),
        }
    }
}

/// Hash set of phone keys with O(1) membership.
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    keys: HashSet<PhoneKey>,
}

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &PhoneKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<PhoneKey> for KeySet {
    fn from_iter<I: IntoIterator<Item = PhoneKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

/// A file whose numbers were appended to a suppression list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub id: String,
    pub name: String,
    pub date: chrono::DateTime<chrono::Utc>,
    pub count: u64,
}

/// Result of appending keys to a suppression list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOutcome {
    pub added: u64,
    pub file: Option<UploadedFile>,
}
