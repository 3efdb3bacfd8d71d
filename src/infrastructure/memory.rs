//! Non-persistent stores, selected with `database_url = "memory://"`.
//!
//! Same semantics as the SQLite stores; used for local runs and tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::account::{Account, JobCharge, Subscription};
use crate::domain::error::{AppError, Result};
use crate::domain::phone::PhoneKey;
use crate::domain::scrub_options::ScrubOptions;
use crate::domain::store::{AccountStore, ComplianceStore, SuppressionStore};
use crate::domain::suppression::{AddOutcome, ComplianceList, UploadedFile};

#[derive(Debug, Default)]
struct MemoryList {
    order: Vec<PhoneKey>,
    // key -> id of the uploaded file that contributed it
    origin: HashMap<PhoneKey, Option<String>>,
    files: Vec<UploadedFile>,
}

impl MemoryList {
    fn retain_keys(&mut self, mut keep: impl FnMut(&PhoneKey, &Option<String>) -> bool) -> u64 {
        let before = self.order.len();
        let origin = &mut self.origin;
        self.order.retain(|key| {
            let drop = origin.get(key).is_some_and(|file| !keep(key, file));
            if drop {
                origin.remove(key);
            }
            !drop
        });
        (before - self.order.len()) as u64
    }
}

#[derive(Debug, Default)]
pub struct MemorySuppressionStore {
    lists: RwLock<HashMap<String, MemoryList>>,
}

impl MemorySuppressionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SuppressionStore for MemorySuppressionStore {
    async fn keys(&self, list_id: &str) -> Result<Vec<PhoneKey>> {
        let lists = self.lists.read().unwrap_or_else(PoisonError::into_inner);
        Ok(lists
            .get(list_id)
            .map(|list| list.order.clone())
            .unwrap_or_default())
    }

    async fn count(&self, list_id: &str) -> Result<u64> {
        let lists = self.lists.read().unwrap_or_else(PoisonError::into_inner);
        Ok(lists.get(list_id).map(|l| l.order.len() as u64).unwrap_or(0))
    }

    async fn add(
        &self,
        list_id: &str,
        keys: &[PhoneKey],
        source_label: Option<&str>,
    ) -> Result<AddOutcome> {
        let mut lists = self.lists.write().unwrap_or_else(PoisonError::into_inner);
        let list = lists.entry(list_id.to_string()).or_default();
        let file_id = source_label.map(|_| Uuid::new_v4().to_string());

        let mut added = 0u64;
        for key in keys {
            if list.origin.contains_key(key) {
                continue;
            }
            list.origin.insert(key.clone(), file_id.clone());
            list.order.push(key.clone());
            added += 1;
        }

        let file = match (file_id, source_label) {
            (Some(id), Some(name)) if added > 0 => {
                let file = UploadedFile {
                    id,
                    name: name.to_string(),
                    date: Utc::now(),
                    count: added,
                };
                list.files.push(file.clone());
                Some(file)
            }
            _ => None,
        };

        Ok(AddOutcome { added, file })
    }

    async fn remove(&self, list_id: &str, keys: &[PhoneKey]) -> Result<u64> {
        let mut lists = self.lists.write().unwrap_or_else(PoisonError::into_inner);
        let Some(list) = lists.get_mut(list_id) else {
            return Ok(0);
        };
        let targets: HashSet<&PhoneKey> = keys.iter().collect();
        Ok(list.retain_keys(|key, _| !targets.contains(key)))
    }

    async fn remove_file(&self, list_id: &str, file_id: &str) -> Result<u64> {
        let mut lists = self.lists.write().unwrap_or_else(PoisonError::into_inner);
        let Some(list) = lists.get_mut(list_id) else {
            return Ok(0);
        };
        list.files.retain(|f| f.id != file_id);
        Ok(list.retain_keys(|_, origin| origin.as_deref() != Some(file_id)))
    }

    async fn clear(&self, list_id: &str) -> Result<()> {
        let mut lists = self.lists.write().unwrap_or_else(PoisonError::into_inner);
        lists.remove(list_id);
        Ok(())
    }

    async fn uploaded_files(&self, list_id: &str) -> Result<Vec<UploadedFile>> {
        let lists = self.lists.read().unwrap_or_else(PoisonError::into_inner);
        Ok(lists
            .get(list_id)
            .map(|list| list.files.clone())
            .unwrap_or_default())
    }
}

#[derive(Debug, Default)]
pub struct MemoryComplianceStore {
    lists: RwLock<HashMap<ComplianceList, HashSet<PhoneKey>>>,
}

impl MemoryComplianceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ComplianceStore for MemoryComplianceStore {
    async fn keys(&self, list: ComplianceList) -> Result<Vec<PhoneKey>> {
        let lists = self.lists.read().unwrap_or_else(PoisonError::into_inner);
        Ok(lists
            .get(&list)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn replace(&self, list: ComplianceList, keys: &[PhoneKey]) -> Result<u64> {
        let mut lists = self.lists.write().unwrap_or_else(PoisonError::into_inner);
        let set: HashSet<PhoneKey> = keys.iter().cloned().collect();
        let size = set.len() as u64;
        lists.insert(list, set);
        Ok(size)
    }

    async fn append(&self, list: ComplianceList, keys: &[PhoneKey]) -> Result<u64> {
        let mut lists = self.lists.write().unwrap_or_else(PoisonError::into_inner);
        let set = lists.entry(list).or_default();
        Ok(keys.iter().filter(|key| set.insert((*key).clone())).count() as u64)
    }
}

#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: Mutex<HashMap<String, Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn update<T>(&self, account_id: &str, f: impl FnOnce(&mut Account) -> Result<T>) -> Result<T> {
        let mut accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        let account = accounts
            .get_mut(account_id)
            .ok_or_else(|| AppError::NotFound(format!("Account not found: {}", account_id)))?;
        f(account)
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn create(&self, name: &str, credits: f64) -> Result<Account> {
        let account = Account {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            credits,
            files_processed: 0,
            numbers_processed: 0,
            numbers_removed: 0,
            credits_used: 0.0,
            scrub_options: ScrubOptions::default(),
            subscription: None,
        };
        let mut accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        accounts.insert(account.id.clone(), account.clone());
        Ok(account)
    }

    async fn get(&self, account_id: &str) -> Result<Account> {
        self.update(account_id, |account| Ok(account.clone()))
    }

    async fn update_scrub_options(&self, account_id: &str, options: &ScrubOptions) -> Result<()> {
        self.update(account_id, |account| {
            account.scrub_options = *options;
            Ok(())
        })
    }

    async fn charge(&self, account_id: &str, charge: &JobCharge) -> Result<Account> {
        self.update(account_id, |account| {
            if account.credits < charge.cost {
                return Err(AppError::InsufficientCredits {
                    required: charge.cost,
                    available: account.credits,
                });
            }
            account.credits -= charge.cost;
            account.credits_used += charge.cost;
            account.files_processed += 1;
            account.numbers_processed += charge.numbers_processed;
            account.numbers_removed += charge.numbers_removed;
            let now = Utc::now();
            if let Some(sub) = account.subscription.as_mut().filter(|s| s.is_active_at(now)) {
                sub.credits_used_this_period += charge.cost;
            }
            Ok(account.clone())
        })
    }

    async fn grant_credits(&self, account_id: &str, amount: f64) -> Result<Account> {
        self.update(account_id, |account| {
            account.credits = (account.credits + amount).max(0.0);
            Ok(account.clone())
        })
    }

    async fn set_subscription(
        &self,
        account_id: &str,
        subscription: Option<&Subscription>,
    ) -> Result<Account> {
        self.update(account_id, |account| {
            account.subscription = subscription.cloned();
            Ok(account.clone())
        })
    }
}
