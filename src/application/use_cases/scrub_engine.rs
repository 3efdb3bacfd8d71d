// ============================================================
// SCRUB ENGINE
// ============================================================
// Column inference -> credit validation -> one pass over the rows.
//
// Each stage consumes the previous one, so a job cannot be run without
// having been priced and validated first:
//   ScrubEngine::infer -> InferredJob::validate -> ValidatedJob::run

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use super::column_inference::{ColumnPolicy, KeywordColumnPolicy};
use super::credit_calculator::{CreditCalculator, CreditCost};
use super::suppression_oracle::SuppressionOracle;
use crate::domain::error::{AppError, Result};
use crate::domain::phone::PhoneKey;
use crate::domain::scrub_options::ScrubOptions;
use crate::domain::sheet::{Row, Sheet};
use crate::domain::stats::ScrubStats;

#[derive(Clone)]
pub struct ScrubEngine {
    policy: Arc<dyn ColumnPolicy>,
    calculator: CreditCalculator,
}

impl Default for ScrubEngine {
    fn default() -> Self {
        Self::new(
            Arc::new(KeywordColumnPolicy::default()),
            CreditCalculator::default(),
        )
    }
}

impl ScrubEngine {
    pub fn new(policy: Arc<dyn ColumnPolicy>, calculator: CreditCalculator) -> Self {
        Self { policy, calculator }
    }

    /// Pick the phone column and price the job.
    pub fn infer(&self, sheet: Sheet, options: ScrubOptions) -> Result<InferredJob> {
        let column = self
            .policy
            .infer(&sheet.headers)
            .ok_or(AppError::NoPhoneColumn)?;
        let cost = self.calculator.cost(sheet.row_count(), &options);

        debug!(
            column = %column,
            rows = sheet.row_count(),
            credits = cost.total,
            "Phone column inferred"
        );

        Ok(InferredJob {
            sheet,
            options,
            column,
            cost,
        })
    }

    /// Run all stages in one call. `credit_balance` of `None` skips the
    /// credit check.
    pub fn scrub(
        &self,
        sheet: Sheet,
        options: ScrubOptions,
        credit_balance: Option<f64>,
        oracle: &SuppressionOracle,
    ) -> Result<ScrubOutcome> {
        Ok(self
            .infer(sheet, options)?
            .validate(credit_balance)?
            .run(oracle))
    }
}

/// A job whose phone column is known and whose cost has been computed.
#[derive(Debug, Clone)]
pub struct InferredJob {
    sheet: Sheet,
    options: ScrubOptions,
    column: String,
    cost: CreditCost,
}

impl InferredJob {
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn cost(&self) -> &CreditCost {
        &self.cost
    }

    pub fn options(&self) -> &ScrubOptions {
        &self.options
    }

    pub fn row_count(&self) -> usize {
        self.sheet.row_count()
    }

    /// Compare the job's cost against `credit_balance`.
    pub fn validate(self, credit_balance: Option<f64>) -> Result<ValidatedJob> {
        if let Some(available) = credit_balance {
            if available < self.cost.total {
                return Err(AppError::InsufficientCredits {
                    required: self.cost.total,
                    available,
                });
            }
        }
        Ok(ValidatedJob { job: self })
    }
}

/// A job that is affordable and ready to process.
#[derive(Debug, Clone)]
pub struct ValidatedJob {
    job: InferredJob,
}

impl ValidatedJob {
    pub fn column(&self) -> &str {
        &self.job.column
    }

    pub fn cost(&self) -> &CreditCost {
        &self.job.cost
    }

    pub fn options(&self) -> &ScrubOptions {
        &self.job.options
    }

    /// Single pass over the rows in source order.
    ///
    /// Blank phone cells are counted as `invalid`; suppressed rows are
    /// dropped before the duplicate check; with duplicate removal on, the
    /// first occurrence of a key is kept.
    pub fn run(self, oracle: &SuppressionOracle) -> ScrubOutcome {
        let InferredJob {
            sheet,
            options,
            column,
            cost,
        } = self.job;

        let mut stats = ScrubStats {
            total: sheet.row_count() as u64,
            credits_used: cost.total,
            ..ScrubStats::default()
        };
        let mut seen: HashSet<PhoneKey> = HashSet::new();
        let mut kept: Vec<Row> = Vec::new();

        for row in sheet.rows {
            let Some(key) = row.get(&column).and_then(PhoneKey::normalize) else {
                stats.invalid += 1;
                continue;
            };

            let classification = oracle.classify(&key, &options);
            if classification.excluded {
                stats.suppressed_numbers += 1;
                for source in classification.matched {
                    stats.record_match(source);
                }
                continue;
            }

            if options.remove_duplicates && !seen.insert(key) {
                stats.duplicates += 1;
                continue;
            }

            kept.push(row);
        }

        stats.unique = kept.len() as u64;

        ScrubOutcome {
            column,
            headers: sheet.headers,
            rows: kept,
            stats,
            cost,
        }
    }
}

/// Cleaned rows plus the statistics of a completed job.
#[derive(Debug, Clone)]
pub struct ScrubOutcome {
    pub column: String,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
    pub stats: ScrubStats,
    pub cost: CreditCost,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::suppression::{KeySet, SourceName};

    fn sheet(headers: &[&str], rows: Vec<Row>) -> Sheet {
        Sheet::new(
            "Sheet1",
            headers.iter().map(|h| h.to_string()).collect(),
            rows,
        )
    }

    fn phone_sheet(numbers: &[&str]) -> Sheet {
        let rows = numbers
            .iter()
            .map(|n| Row::new().with("phone", *n))
            .collect();
        sheet(&["phone"], rows)
    }

    fn keys(set: &[&str]) -> Arc<KeySet> {
        Arc::new(set.iter().filter_map(|k| PhoneKey::parse(k)).collect())
    }

    fn output_keys(outcome: &ScrubOutcome) -> Vec<String> {
        outcome
            .rows
            .iter()
            .filter_map(|row| row.get(&outcome.column).and_then(PhoneKey::normalize))
            .map(PhoneKey::into_inner)
            .collect()
    }

    fn no_lists() -> ScrubOptions {
        ScrubOptions {
            check_against_user_list: false,
            ..ScrubOptions::default()
        }
    }

    #[test]
    fn test_dedupes_with_first_occurrence_winning() {
        let input = phone_sheet(&["555-111-2222", "5551112222", "555-333-4444"]);
        let outcome = ScrubEngine::default()
            .scrub(input, no_lists(), None, &SuppressionOracle::new())
            .unwrap();

        assert_eq!(output_keys(&outcome), vec!["5551112222", "5553334444"]);
        assert_eq!(
            outcome.rows[0].get("phone").unwrap().to_string(),
            "555-111-2222"
        );
        assert_eq!(outcome.stats.total, 3);
        assert_eq!(outcome.stats.unique, 2);
        assert_eq!(outcome.stats.duplicates, 1);
        assert_eq!(outcome.stats.suppressed_numbers, 0);
    }

    #[test]
    fn test_user_list_suppression() {
        let input = phone_sheet(&["555-111-2222", "5551112222", "555-333-4444"]);
        let oracle =
            SuppressionOracle::new().with_source(SourceName::UserList, keys(&["5553334444"]));
        let outcome = ScrubEngine::default()
            .scrub(input, ScrubOptions::default(), None, &oracle)
            .unwrap();

        assert_eq!(output_keys(&outcome), vec!["5551112222"]);
        assert_eq!(outcome.stats.total, 3);
        assert_eq!(outcome.stats.unique, 1);
        assert_eq!(outcome.stats.duplicates, 1);
        assert_eq!(outcome.stats.suppressed_numbers, 1);
        assert_eq!(outcome.stats.user_list_count, 1);
        assert_eq!(outcome.stats.dnc_count, 0);
    }

    #[test]
    fn test_insufficient_credits_fails_before_processing() {
        let rows = (0..10_000)
            .map(|i| Row::new().with("phone", format!("555{:07}", i)))
            .collect();
        let options = ScrubOptions {
            check_against_dnc: true,
            ..ScrubOptions::default()
        };

        let job = ScrubEngine::default()
            .infer(sheet(&["phone"], rows), options)
            .unwrap();
        assert_eq!(job.cost().total, 15_000.0);

        let err = job.validate(Some(10_000.0)).unwrap_err();
        assert_eq!(
            err,
            AppError::InsufficientCredits {
                required: 15_000.0,
                available: 10_000.0
            }
        );
    }

    #[test]
    fn test_exact_balance_is_enough() {
        let job = ScrubEngine::default()
            .infer(phone_sheet(&["1", "2"]), no_lists())
            .unwrap();
        assert!(job.validate(Some(2.0)).is_ok());
    }

    #[test]
    fn test_no_headers_fails_inference() {
        let err = ScrubEngine::default()
            .infer(Sheet::default(), ScrubOptions::default())
            .unwrap_err();
        assert_eq!(err, AppError::NoPhoneColumn);
    }

    #[test]
    fn test_headers_without_rows_complete_empty() {
        let outcome = ScrubEngine::default()
            .scrub(
                sheet(&["Name", "Phone"], Vec::new()),
                ScrubOptions::default(),
                Some(0.0),
                &SuppressionOracle::new(),
            )
            .unwrap();
        assert!(outcome.rows.is_empty());
        assert_eq!(outcome.stats, ScrubStats::default());
        assert_eq!(outcome.cost.total, 0.0);
    }

    #[test]
    fn test_blank_phone_cells_only_count_toward_total() {
        let input = sheet(
            &["Name", "Phone"],
            vec![
                Row::new().with("Name", "A").with("Phone", "555-1"),
                Row::new().with("Name", "B").with("Phone", ""),
                Row::new().with("Name", "C").with("Phone", "none"),
            ],
        );
        let outcome = ScrubEngine::default()
            .scrub(input, no_lists(), None, &SuppressionOracle::new())
            .unwrap();
        assert_eq!(outcome.stats.total, 3);
        assert_eq!(outcome.stats.unique, 1);
        assert_eq!(outcome.stats.invalid, 2);
        assert_eq!(outcome.stats.duplicates, 0);
    }

    #[test]
    fn test_keeps_every_row_when_dedupe_disabled() {
        let input = phone_sheet(&["5551112222", "555-111-2222", "5551112222"]);
        let options = ScrubOptions {
            remove_duplicates: false,
            ..no_lists()
        };
        let outcome = ScrubEngine::default()
            .scrub(input, options, None, &SuppressionOracle::new())
            .unwrap();
        assert_eq!(outcome.rows.len(), 3);
        assert_eq!(outcome.stats.duplicates, 0);
        assert_eq!(outcome.stats.unique, 3);
    }

    #[test]
    fn test_suppressed_rows_skip_dedupe() {
        let input = phone_sheet(&["5551112222", "5551112222"]);
        let oracle =
            SuppressionOracle::new().with_source(SourceName::UserList, keys(&["5551112222"]));
        let outcome = ScrubEngine::default()
            .scrub(input, ScrubOptions::default(), None, &oracle)
            .unwrap();
        assert_eq!(outcome.stats.suppressed_numbers, 2);
        assert_eq!(outcome.stats.duplicates, 0);
        assert_eq!(outcome.stats.user_list_count, 2);
    }

    #[test]
    fn test_preserves_row_and_column_order() {
        let input = sheet(
            &["Name", "Cell", "City"],
            vec![
                Row::new().with("Name", "Zed").with("Cell", "3").with("City", "X"),
                Row::new().with("Name", "Amy").with("Cell", "1").with("City", "Y"),
                Row::new().with("Name", "Bob").with("Cell", "2").with("City", "Z"),
            ],
        );
        let outcome = ScrubEngine::default()
            .scrub(input, no_lists(), None, &SuppressionOracle::new())
            .unwrap();
        let names: Vec<_> = outcome
            .rows
            .iter()
            .map(|r| r.get("Name").unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Zed", "Amy", "Bob"]);
        let columns: Vec<_> = outcome.rows[0].columns().collect();
        assert_eq!(columns, vec!["Name", "Cell", "City"]);
        assert_eq!(outcome.column, "Cell");
    }

    #[test]
    fn test_stat_conservation_and_attribution_bounds() {
        let numbers = [
            "5551112222", "5551112222", "5553334444", "", "5557778888", "555-777-8888",
            "5550001111", "5550001111", "abc", "5552223333",
        ];
        let oracle = SuppressionOracle::new()
            .with_source(SourceName::UserList, keys(&["5553334444", "5550001111"]))
            .with_source(SourceName::Dnc, keys(&["5550001111", "5552223333"]))
            .with_source(SourceName::Tcpa, keys(&["5552223333"]));

        for bits in 0..16u8 {
            let options = ScrubOptions {
                remove_duplicates: bits & 1 != 0,
                check_against_user_list: bits & 2 != 0,
                check_against_dnc: bits & 4 != 0,
                check_against_tcpa: bits & 8 != 0,
            };
            let outcome = ScrubEngine::default()
                .scrub(phone_sheet(&numbers), options, None, &oracle)
                .unwrap();
            let s = &outcome.stats;

            assert_eq!(s.total, s.unique + s.duplicates + s.suppressed_numbers + s.invalid);
            if !options.remove_duplicates {
                assert_eq!(s.duplicates, 0);
            }
            assert!(s.user_list_count + s.dnc_count + s.tcpa_count >= s.suppressed_numbers);
            if !options.check_against_user_list {
                assert_eq!(s.user_list_count, 0);
            }
            if !options.check_against_dnc {
                assert_eq!(s.dnc_count, 0);
            }
            if !options.check_against_tcpa {
                assert_eq!(s.tcpa_count, 0);
            }
            assert_eq!(s.unique as usize, outcome.rows.len());
        }
    }

    #[test]
    fn test_strict_policy_rejects_unlabelled_sheet() {
        let engine = ScrubEngine::new(
            Arc::new(KeywordColumnPolicy::strict()),
            CreditCalculator::default(),
        );
        let err = engine
            .infer(sheet(&["Name", "City"], Vec::new()), ScrubOptions::default())
            .unwrap_err();
        assert_eq!(err, AppError::NoPhoneColumn);
    }
}
