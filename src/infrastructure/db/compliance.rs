use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use sqlx::{Sqlite, Transaction};

use super::connection::db_err;
use crate::domain::error::Result;
use crate::domain::phone::PhoneKey;
use crate::domain::store::ComplianceStore;
use crate::domain::suppression::ComplianceList;

/// DNC and TCPA numbers, one table keyed by list name.
pub struct SqliteComplianceStore {
    pool: SqlitePool,
}

impl SqliteComplianceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn insert_keys(
    tx: &mut Transaction<'_, Sqlite>,
    list: ComplianceList,
    keys: &[PhoneKey],
) -> Result<u64> {
    let mut inserted = 0u64;
    for key in keys {
        let result =
            sqlx::query("INSERT OR IGNORE INTO compliance_entries (list, phone_key) VALUES (?, ?)")
                .bind(list.as_str())
                .bind(key.as_str())
                .execute(&mut **tx)
                .await
                .map_err(db_err("Failed to insert compliance entry"))?;
        inserted += result.rows_affected();
    }
    Ok(inserted)
}

#[async_trait]
impl ComplianceStore for SqliteComplianceStore {
    async fn keys(&self, list: ComplianceList) -> Result<Vec<PhoneKey>> {
        let keys: Vec<String> =
            sqlx::query_scalar("SELECT phone_key FROM compliance_entries WHERE list = ?")
                .bind(list.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(db_err("Failed to load compliance list"))?;

        Ok(keys.iter().filter_map(|k| PhoneKey::parse(k)).collect())
    }

    async fn replace(&self, list: ComplianceList, keys: &[PhoneKey]) -> Result<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin compliance replace"))?;

        sqlx::query("DELETE FROM compliance_entries WHERE list = ?")
            .bind(list.as_str())
            .execute(&mut *tx)
            .await
            .map_err(db_err("Failed to clear compliance list"))?;

        let size = insert_keys(&mut tx, list, keys).await?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit compliance replace"))?;
        Ok(size)
    }

    async fn append(&self, list: ComplianceList, keys: &[PhoneKey]) -> Result<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin compliance append"))?;

        let added = insert_keys(&mut tx, list, keys).await?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit compliance append"))?;
        Ok(added)
    }
}
