use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use super::column_inference::ColumnPolicy;
use crate::domain::error::{AppError, Result};
use crate::domain::phone::PhoneKey;
use crate::domain::store::ComplianceStore;
use crate::domain::suppression::{ComplianceList, KeySet};
use crate::infrastructure::workbook::WorkbookCodec;

/// Result of loading a compliance list file.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceUpload {
    pub list: ComplianceList,
    pub column: String,
    pub numbers_read: u64,
    pub added: u64,
    pub list_size: u64,
}

/// DNC/TCPA lists with a shared in-memory copy per list.
///
/// Jobs read the cached set; writes go to the store and drop the cached
/// copy so the next job reloads it.
pub struct ComplianceLists {
    store: Arc<dyn ComplianceStore>,
    policy: Arc<dyn ColumnPolicy>,
    codec: WorkbookCodec,
    cache: RwLock<HashMap<ComplianceList, Arc<KeySet>>>,
}

impl ComplianceLists {
    pub fn new(store: Arc<dyn ComplianceStore>, policy: Arc<dyn ColumnPolicy>) -> Self {
        Self {
            store,
            policy,
            codec: WorkbookCodec::new(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, list: ComplianceList) -> Result<Arc<KeySet>> {
        if let Some(keys) = self.cache.read().await.get(&list) {
            return Ok(keys.clone());
        }

        let mut cache = self.cache.write().await;
        if let Some(keys) = cache.get(&list) {
            return Ok(keys.clone());
        }
        let keys: Arc<KeySet> = Arc::new(self.store.keys(list).await?.into_iter().collect());
        cache.insert(list, keys.clone());
        Ok(keys)
    }

    pub async fn replace(&self, list: ComplianceList, keys: &[PhoneKey]) -> Result<u64> {
        let mut cache = self.cache.write().await;
        let size = self.store.replace(list, keys).await?;
        cache.remove(&list);
        Ok(size)
    }

    pub async fn append(&self, list: ComplianceList, keys: &[PhoneKey]) -> Result<u64> {
        let mut cache = self.cache.write().await;
        let added = self.store.append(list, keys).await?;
        cache.remove(&list);
        Ok(added)
    }

    /// Load a spreadsheet of numbers into `list`, replacing or extending it.
    pub async fn upload_file(
        &self,
        list: ComplianceList,
        file_name: &str,
        bytes: &[u8],
        replace: bool,
    ) -> Result<ComplianceUpload> {
        let (column, keys) = read_phone_keys(&self.codec, self.policy.as_ref(), file_name, bytes)?;

        let added = if replace {
            self.replace(list, &keys).await?
        } else {
            self.append(list, &keys).await?
        };
        let list_size = self.get(list).await?.len() as u64;

        info!(
            list = %list,
            file_name,
            numbers = keys.len(),
            added,
            list_size,
            replace,
            "Compliance list updated"
        );

        Ok(ComplianceUpload {
            list,
            column,
            numbers_read: keys.len() as u64,
            added,
            list_size,
        })
    }
}

/// Decode a file and normalize its phone column. Fails when the column
/// holds no valid number at all.
pub(crate) fn read_phone_keys(
    codec: &WorkbookCodec,
    policy: &dyn ColumnPolicy,
    file_name: &str,
    bytes: &[u8],
) -> Result<(String, Vec<PhoneKey>)> {
    let sheet = codec.decode(file_name, bytes)?.first_sheet;
    let column = policy.infer(&sheet.headers).ok_or(AppError::NoPhoneColumn)?;

    let keys: Vec<PhoneKey> = sheet
        .rows
        .iter()
        .filter_map(|row| row.get(&column).and_then(PhoneKey::normalize))
        .collect();

    if keys.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "No valid phone numbers found in column '{}'",
            column
        )));
    }
    Ok((column, keys))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::column_inference::KeywordColumnPolicy;
    use crate::domain::phone::normalize_all;
    use crate::infrastructure::memory::MemoryComplianceStore;

    fn lists() -> ComplianceLists {
        ComplianceLists::new(
            Arc::new(MemoryComplianceStore::new()),
            Arc::new(KeywordColumnPolicy::default()),
        )
    }

    #[tokio::test]
    async fn test_writes_invalidate_cached_set() {
        let lists = lists();
        assert!(lists.get(ComplianceList::Dnc).await.unwrap().is_empty());

        lists
            .append(ComplianceList::Dnc, &normalize_all(["5551112222"]))
            .await
            .unwrap();
        let keys = lists.get(ComplianceList::Dnc).await.unwrap();
        assert!(keys.contains(&PhoneKey::parse("555-111-2222").unwrap()));

        lists
            .replace(ComplianceList::Dnc, &normalize_all(["1"]))
            .await
            .unwrap();
        assert_eq!(lists.get(ComplianceList::Dnc).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upload_csv_file() {
        let lists = lists();
        let csv = b"Name,Phone Number\nA,(555) 111-2222\nB,\nC,555.333.4444\n";

        let upload = lists
            .upload_file(ComplianceList::Tcpa, "tcpa.csv", csv, false)
            .await
            .unwrap();
        assert_eq!(upload.column, "Phone Number");
        assert_eq!(upload.numbers_read, 2);
        assert_eq!(upload.added, 2);
        assert_eq!(upload.list_size, 2);
    }

    #[tokio::test]
    async fn test_upload_without_numbers_is_rejected() {
        let lists = lists();
        let csv = b"phone\nn/a\n";
        let err = lists
            .upload_file(ComplianceList::Dnc, "dnc.csv", csv, true)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
