use serde::{Deserialize, Serialize};

use super::suppression::SourceName;

/// Counters reported for a completed scrub job.
///
/// Every input row lands in exactly one of `unique`, `duplicates`,
/// `suppressed_numbers` or `invalid`, so
/// `total == unique + duplicates + suppressed_numbers + invalid`.
/// `invalid` counts rows whose phone cell held no digits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrubStats {
    pub total: u64,
    pub unique: u64,
    pub duplicates: u64,
    pub suppressed_numbers: u64,
    pub invalid: u64,
    pub user_list_count: u64,
    pub dnc_count: u64,
    pub tcpa_count: u64,
    pub credits_used: f64,
}

impl ScrubStats {
    pub fn record_match(&mut self, source: SourceName) {
        match source {
            SourceName::UserList => self.user_list_count += 1,
            SourceName::Dnc => self.dnc_count += 1,
            SourceName::Tcpa => self.tcpa_count += 1,
            SourceName::Global => {}
        }
    }

    /// Rows that did not make it into the output file.
    pub fn removed(&self) -> u64 {
        self.duplicates + self.suppressed_numbers + self.invalid
    }
}

/// Result shape of the free variant: no paid-list attribution, no credits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeScrubStats {
    pub total: u64,
    pub unique: u64,
    pub duplicates: u64,
    pub suppressed_numbers: u64,
}

impl From<&ScrubStats> for FreeScrubStats {
    fn from(stats: &ScrubStats) -> Self {
        Self {
            total: stats.total,
            unique: stats.unique,
            duplicates: stats.duplicates,
            suppressed_numbers: stats.suppressed_numbers,
        }
    }
}
