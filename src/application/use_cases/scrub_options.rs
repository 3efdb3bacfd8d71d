use std::sync::Arc;

use tracing::info;

use crate::domain::error::Result;
use crate::domain::scrub_options::{ScrubOptions, ScrubOptionsPatch};
use crate::domain::store::AccountStore;

pub struct ScrubOptionsUseCase {
    accounts: Arc<dyn AccountStore>,
}

impl ScrubOptionsUseCase {
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self { accounts }
    }

    pub async fn get(&self, account_id: &str) -> Result<ScrubOptions> {
        Ok(self.accounts.get(account_id).await?.scrub_options)
    }

    /// Merge `patch` into the stored options and persist the result.
    pub async fn update(&self, account_id: &str, patch: &ScrubOptionsPatch) -> Result<ScrubOptions> {
        let current = self.get(account_id).await?;
        let updated = current.apply(patch);
        if updated != current {
            self.accounts.update_scrub_options(account_id, &updated).await?;
            info!(account_id, options = ?updated, "Scrub options updated");
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::AppError;
    use crate::infrastructure::memory::MemoryAccountStore;

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let accounts = Arc::new(MemoryAccountStore::new());
        let account = accounts.create("acme", 100.0).await.unwrap();
        let use_case = ScrubOptionsUseCase::new(accounts);

        assert_eq!(use_case.get(&account.id).await.unwrap(), ScrubOptions::default());

        let patch = ScrubOptionsPatch {
            check_against_dnc: Some(true),
            ..ScrubOptionsPatch::default()
        };
        let updated = use_case.update(&account.id, &patch).await.unwrap();
        assert!(updated.check_against_dnc);
        assert!(updated.remove_duplicates);
        assert!(updated.check_against_user_list);
        assert_eq!(use_case.get(&account.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let use_case = ScrubOptionsUseCase::new(Arc::new(MemoryAccountStore::new()));
        assert!(matches!(
            use_case.update("missing", &ScrubOptionsPatch::default()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
