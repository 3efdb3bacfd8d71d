use serde::{Deserialize, Serialize};

/// Which checks a scrub job runs. Persisted per account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrubOptions {
    pub remove_duplicates: bool,
    pub check_against_user_list: bool,
    #[serde(rename = "checkAgainstDNC")]
    pub check_against_dnc: bool,
    #[serde(rename = "checkAgainstTCPA")]
    pub check_against_tcpa: bool,
}

impl Default for ScrubOptions {
    fn default() -> Self {
        Self {
            remove_duplicates: true,
            check_against_user_list: true,
            check_against_dnc: false,
            check_against_tcpa: false,
        }
    }
}

impl ScrubOptions {
    /// Options of the unauthenticated variant: dedupe only, no paid lists.
    pub fn free() -> Self {
        Self {
            remove_duplicates: true,
            check_against_user_list: false,
            check_against_dnc: false,
            check_against_tcpa: false,
        }
    }

    pub fn apply(&self, patch: &ScrubOptionsPatch) -> Self {
        Self {
            remove_duplicates: patch.remove_duplicates.unwrap_or(self.remove_duplicates),
            check_against_user_list: patch
                .check_against_user_list
                .unwrap_or(self.check_against_user_list),
            check_against_dnc: patch.check_against_dnc.unwrap_or(self.check_against_dnc),
            check_against_tcpa: patch.check_against_tcpa.unwrap_or(self.check_against_tcpa),
        }
    }
}

/// Partial update of [`ScrubOptions`]; absent fields keep their value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScrubOptionsPatch {
    #[serde(default)]
    pub remove_duplicates: Option<bool>,
    #[serde(default)]
    pub check_against_user_list: Option<bool>,
    #[serde(default, rename = "checkAgainstDNC")]
    pub check_against_dnc: Option<bool>,
    #[serde(default, rename = "checkAgainstTCPA")]
    pub check_against_tcpa: Option<bool>,
}
