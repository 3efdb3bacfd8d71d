//! Storage seams the use cases depend on.
//!
//! The scrubbing pipeline only reads through these traits; SQLite and
//! in-memory implementations live under `infrastructure`.

use async_trait::async_trait;

use super::account::{Account, JobCharge, Subscription};
use super::error::Result;
use super::phone::PhoneKey;
use super::scrub_options::ScrubOptions;
use super::suppression::{AddOutcome, ComplianceList, UploadedFile};

/// Id of the shared suppression list consulted by the free variant.
pub const GLOBAL_LIST_ID: &str = "global";

#[async_trait]
pub trait SuppressionStore: Send + Sync {
    async fn keys(&self, list_id: &str) -> Result<Vec<PhoneKey>>;

    async fn count(&self, list_id: &str) -> Result<u64>;

    /// Append keys, ignoring ones already present. When `source_label` is
    /// given and at least one key was new, an uploaded-file record is kept
    /// so the file's numbers can later be removed as a unit.
    async fn add(
        &self,
        list_id: &str,
        keys: &[PhoneKey],
        source_label: Option<&str>,
    ) -> Result<AddOutcome>;

    async fn remove(&self, list_id: &str, keys: &[PhoneKey]) -> Result<u64>;

    /// Remove the numbers contributed by one uploaded file. Unknown ids
    /// remove nothing.
    async fn remove_file(&self, list_id: &str, file_id: &str) -> Result<u64>;

    async fn clear(&self, list_id: &str) -> Result<()>;

    async fn uploaded_files(&self, list_id: &str) -> Result<Vec<UploadedFile>>;
}

#[async_trait]
pub trait ComplianceStore: Send + Sync {
    async fn keys(&self, list: ComplianceList) -> Result<Vec<PhoneKey>>;

    /// Replace the list's content. Returns the new size.
    async fn replace(&self, list: ComplianceList, keys: &[PhoneKey]) -> Result<u64>;

    /// Append keys, ignoring duplicates. Returns how many were new.
    async fn append(&self, list: ComplianceList, keys: &[PhoneKey]) -> Result<u64>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn create(&self, name: &str, credits: f64) -> Result<Account>;

    async fn get(&self, account_id: &str) -> Result<Account>;

    async fn update_scrub_options(&self, account_id: &str, options: &ScrubOptions) -> Result<()>;

    /// Apply a completed job atomically. Fails with `InsufficientCredits`
    /// and changes nothing when the balance no longer covers `charge.cost`.
    async fn charge(&self, account_id: &str, charge: &JobCharge) -> Result<Account>;

    async fn grant_credits(&self, account_id: &str, amount: f64) -> Result<Account>;

    async fn set_subscription(
        &self,
        account_id: &str,
        subscription: Option<&Subscription>,
    ) -> Result<Account>;
}
