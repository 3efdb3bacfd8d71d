// ============================================================
// SCRUB FILE USE CASE
// ============================================================
// Uploaded bytes in, cleaned workbook and statistics out.
//
// decode -> infer column and price -> credit check -> load the enabled
// lists -> scrub -> encode. Paid jobs then charge the account in one
// conditional update while holding the account's lock.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::account_locks::AccountLocks;
use super::compliance_lists::ComplianceLists;
use super::credit_calculator::CreditCost;
use super::scrub_engine::{ScrubEngine, ScrubOutcome, ValidatedJob};
use super::suppression_list::SuppressionListUseCase;
use super::suppression_oracle::SuppressionOracle;
use crate::domain::account::{Account, JobCharge};
use crate::domain::error::{AppError, Result};
use crate::domain::scrub_options::ScrubOptions;
use crate::domain::stats::{FreeScrubStats, ScrubStats};
use crate::domain::store::{AccountStore, GLOBAL_LIST_ID};
use crate::domain::suppression::{ComplianceList, SourceName};
use crate::infrastructure::workbook::{OutputFormat, WorkbookCodec};

/// An uploaded spreadsheet.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Which suppression list a job reads besides DNC/TCPA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope<'a> {
    /// An account's own list, used when `checkAgainstUserList` is on.
    Account(&'a str),
    /// The shared list of the free variant.
    Global,
}

/// Encoded result of a job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrubReport {
    pub file_name: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub column: String,
    pub stats: ScrubStats,
    pub cost: CreditCost,
}

/// Result of a paid job: the report plus the charged account.
#[derive(Debug, Clone)]
pub struct AccountScrubReport {
    pub report: ScrubReport,
    pub account: Account,
}

#[derive(Debug, Clone)]
pub struct FreeScrubReport {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub stats: FreeScrubStats,
}

pub struct ScrubFileUseCase {
    engine: ScrubEngine,
    codec: WorkbookCodec,
    suppression: Arc<SuppressionListUseCase>,
    compliance: Arc<ComplianceLists>,
    accounts: Arc<dyn AccountStore>,
    locks: Arc<AccountLocks>,
    sheet_label: String,
}

impl ScrubFileUseCase {
    pub fn new(
        engine: ScrubEngine,
        suppression: Arc<SuppressionListUseCase>,
        compliance: Arc<ComplianceLists>,
        accounts: Arc<dyn AccountStore>,
        locks: Arc<AccountLocks>,
        sheet_label: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            codec: WorkbookCodec::new(),
            suppression,
            compliance,
            accounts,
            locks,
            sheet_label: sheet_label.into(),
        }
    }

    /// Scrub one file. `credit_balance` of `None` skips the credit check.
    /// Nothing is charged here.
    pub async fn scrub_file(
        &self,
        file: &SourceFile,
        options: ScrubOptions,
        credit_balance: Option<f64>,
        scope: ListScope<'_>,
        format: OutputFormat,
    ) -> Result<ScrubReport> {
        let job_id = Uuid::new_v4();
        info!(
            job_id = %job_id,
            file_name = %file.name,
            bytes = file.bytes.len(),
            options = ?options,
            "Scrub job started"
        );

        let result = self
            .run_job(file, options, credit_balance, scope, format)
            .await;

        match &result {
            Ok(report) => info!(
                job_id = %job_id,
                column = %report.column,
                total = report.stats.total,
                unique = report.stats.unique,
                duplicates = report.stats.duplicates,
                suppressed = report.stats.suppressed_numbers,
                invalid = report.stats.invalid,
                credits = report.stats.credits_used,
                "Scrub job completed"
            ),
            Err(err) => warn!(job_id = %job_id, error = %err, "Scrub job rejected"),
        }
        result
    }

    /// Paid variant. The account's lock is held from the balance read to
    /// the charge, so concurrent jobs cannot spend the same credits.
    pub async fn scrub_for_account(
        &self,
        account_id: &str,
        file: &SourceFile,
        options: Option<ScrubOptions>,
        format: OutputFormat,
    ) -> Result<AccountScrubReport> {
        // unknown ids never reach the lock map
        self.accounts.get(account_id).await?;
        let _guard = self.locks.acquire(account_id).await;

        let account = self.accounts.get(account_id).await?;
        let options = options.unwrap_or(account.scrub_options);

        let report = self
            .scrub_file(
                file,
                options,
                Some(account.credits),
                ListScope::Account(account_id),
                format,
            )
            .await?;

        let charge = JobCharge {
            cost: report.stats.credits_used,
            numbers_processed: report.stats.total,
            numbers_removed: report.stats.removed(),
        };
        let account = self.accounts.charge(account_id, &charge).await?;

        info!(
            account_id,
            charged = charge.cost,
            balance = account.credits,
            "Account charged"
        );

        Ok(AccountScrubReport { report, account })
    }

    /// Unauthenticated variant: duplicate removal plus the global list, no
    /// credit check and no charge.
    pub async fn scrub_free(&self, file: &SourceFile, format: OutputFormat) -> Result<FreeScrubReport> {
        let report = self
            .scrub_file(file, ScrubOptions::free(), None, ListScope::Global, format)
            .await?;

        Ok(FreeScrubReport {
            stats: FreeScrubStats::from(&report.stats),
            file_name: report.file_name,
            bytes: report.bytes,
            mime_type: report.mime_type,
        })
    }

    async fn run_job(
        &self,
        file: &SourceFile,
        options: ScrubOptions,
        credit_balance: Option<f64>,
        scope: ListScope<'_>,
        format: OutputFormat,
    ) -> Result<ScrubReport> {
        let sheet = self.codec.decode(&file.name, &file.bytes)?.first_sheet;
        let job = self
            .engine
            .infer(sheet, options)?
            .validate(credit_balance)?;

        let oracle = self.load_oracle(&options, scope).await?;
        let outcome = run_blocking(job, oracle).await?;

        let bytes = self.codec.encode(
            &outcome.headers,
            &outcome.rows,
            &self.sheet_label,
            format,
        )?;

        Ok(ScrubReport {
            file_name: format.output_file_name(&file.name),
            bytes,
            mime_type: format.mime_type(),
            column: outcome.column,
            stats: outcome.stats,
            cost: outcome.cost,
        })
    }

    /// Only lists the job will actually consult are loaded.
    async fn load_oracle(
        &self,
        options: &ScrubOptions,
        scope: ListScope<'_>,
    ) -> Result<SuppressionOracle> {
        let mut oracle = SuppressionOracle::new();

        match scope {
            ListScope::Account(list_id) if options.check_against_user_list => {
                oracle = oracle.with_source(
                    SourceName::UserList,
                    self.suppression.key_set(list_id).await?,
                );
            }
            ListScope::Account(_) => {}
            ListScope::Global => {
                oracle = oracle.with_source(
                    SourceName::Global,
                    self.suppression.key_set(GLOBAL_LIST_ID).await?,
                );
            }
        }

        for list in [ComplianceList::Dnc, ComplianceList::Tcpa] {
            if list.source().is_enabled(options) {
                oracle = oracle.with_source(list.source(), self.compliance.get(list).await?);
            }
        }

        Ok(oracle)
    }
}

async fn run_blocking(job: ValidatedJob, oracle: SuppressionOracle) -> Result<ScrubOutcome> {
    tokio::task::spawn_blocking(move || job.run(&oracle))
        .await
        .map_err(|e| AppError::Internal(format!("Scrub task failed: {}", e)))
}
