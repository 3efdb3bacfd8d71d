use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::column_inference::ColumnPolicy;
use super::compliance_lists::read_phone_keys;
use crate::domain::error::{AppError, Result};
use crate::domain::phone::PhoneKey;
use crate::domain::store::SuppressionStore;
use crate::domain::suppression::{AddOutcome, KeySet, UploadedFile};
use crate::infrastructure::workbook::WorkbookCodec;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuppressionListView {
    pub numbers: Vec<PhoneKey>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuppressionUpload {
    pub column: String,
    pub numbers_read: u64,
    pub added: u64,
    pub file: Option<UploadedFile>,
}

/// Maintenance of per-account suppression lists.
///
/// Every number is normalized before it reaches the store, so the list
/// holds phone keys only.
pub struct SuppressionListUseCase {
    store: Arc<dyn SuppressionStore>,
    policy: Arc<dyn ColumnPolicy>,
    codec: WorkbookCodec,
}

impl SuppressionListUseCase {
    pub fn new(store: Arc<dyn SuppressionStore>, policy: Arc<dyn ColumnPolicy>) -> Self {
        Self {
            store,
            policy,
            codec: WorkbookCodec::new(),
        }
    }

    pub async fn list(&self, list_id: &str) -> Result<SuppressionListView> {
        let numbers = self.store.keys(list_id).await?;
        Ok(SuppressionListView {
            count: numbers.len() as u64,
            numbers,
        })
    }

    /// Snapshot used by scrub jobs.
    pub async fn key_set(&self, list_id: &str) -> Result<Arc<KeySet>> {
        Ok(Arc::new(self.store.keys(list_id).await?.into_iter().collect()))
    }

    /// Add several numbers. Values without digits are skipped; at least one
    /// must be valid.
    pub async fn add_numbers(&self, list_id: &str, raw: &[String]) -> Result<AddOutcome> {
        let keys = parse_numbers(raw)?;
        self.store.add(list_id, &keys, None).await
    }

    pub async fn remove_numbers(&self, list_id: &str, raw: &[String]) -> Result<u64> {
        let keys = parse_numbers(raw)?;
        self.store.remove(list_id, &keys).await
    }

    pub async fn remove_file(&self, list_id: &str, file_id: &str) -> Result<u64> {
        let removed = self.store.remove_file(list_id, file_id).await?;
        info!(list_id, file_id, removed, "Uploaded file removed from suppression list");
        Ok(removed)
    }

    /// Empty the list. Returns how many numbers it held.
    pub async fn clear(&self, list_id: &str) -> Result<u64> {
        let removed = self.store.count(list_id).await?;
        self.store.clear(list_id).await?;
        info!(list_id, removed, "Suppression list cleared");
        Ok(removed)
    }

    pub async fn uploaded_files(&self, list_id: &str) -> Result<Vec<UploadedFile>> {
        self.store.uploaded_files(list_id).await
    }

    /// Append the phone column of a spreadsheet to the list.
    pub async fn upload_file(
        &self,
        list_id: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<SuppressionUpload> {
        let (column, keys) = read_phone_keys(&self.codec, self.policy.as_ref(), file_name, bytes)?;
        let outcome = self.store.add(list_id, &keys, Some(file_name)).await?;

        info!(
            list_id,
            file_name,
            column = %column,
            numbers = keys.len(),
            added = outcome.added,
            "Suppression file uploaded"
        );

        Ok(SuppressionUpload {
            column,
            numbers_read: keys.len() as u64,
            added: outcome.added,
            file: outcome.file,
        })
    }
}

fn parse_numbers(raw: &[String]) -> Result<Vec<PhoneKey>> {
    let keys: Vec<PhoneKey> = raw.iter().filter_map(|r| PhoneKey::parse(r)).collect();
    if keys.is_empty() {
        return Err(AppError::InvalidInput(
            "No valid phone numbers provided".to_string(),
        ));
    }
    Ok(keys)
}
