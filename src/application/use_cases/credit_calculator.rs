//! Credit pricing of a scrub job.
//!
//! Cost depends only on the number of rows examined and on which paid
//! lists are enabled, so it is known before any row is processed.

use serde::{Deserialize, Serialize};

use crate::domain::scrub_options::ScrubOptions;

/// Per-row rates, in credits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CreditPricing {
    pub base_rate: f64,
    pub dnc_surcharge: f64,
    pub tcpa_surcharge: f64,
}

impl Default for CreditPricing {
    fn default() -> Self {
        Self {
            base_rate: 1.0,
            dnc_surcharge: 0.5,
            tcpa_surcharge: 0.3,
        }
    }
}

impl CreditPricing {
    pub fn validate(&self) -> Result<(), String> {
        for (name, rate) in [
            ("base_rate", self.base_rate),
            ("dnc_surcharge", self.dnc_surcharge),
            ("tcpa_surcharge", self.tcpa_surcharge),
        ] {
            if !rate.is_finite() || rate < 0.0 {
                return Err(format!("{} must be a non-negative number", name));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCost {
    pub base: f64,
    pub dnc_surcharge: f64,
    pub tcpa_surcharge: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CreditCalculator {
    pricing: CreditPricing,
}

impl CreditCalculator {
    pub fn new(pricing: CreditPricing) -> Self {
        Self { pricing }
    }

    /// Every row counts, including rows later found to be duplicates,
    /// suppressed, or blank.
    pub fn cost(&self, row_count: usize, options: &ScrubOptions) -> CreditCost {
        let rows = row_count as f64;
        let base = rows * self.pricing.base_rate;
        let dnc_surcharge = if options.check_against_dnc {
            rows * self.pricing.dnc_surcharge
        } else {
            0.0
        };
        let tcpa_surcharge = if options.check_against_tcpa {
            rows * self.pricing.tcpa_surcharge
        } else {
            0.0
        };

        CreditCost {
            base,
            dnc_surcharge,
            tcpa_surcharge,
            total: base + dnc_surcharge + tcpa_surcharge,
        }
    }
}
