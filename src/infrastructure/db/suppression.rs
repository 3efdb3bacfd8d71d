use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use super::connection::db_err;
use crate::domain::error::{AppError, Result};
use crate::domain::phone::PhoneKey;
use crate::domain::store::SuppressionStore;
use crate::domain::suppression::{AddOutcome, UploadedFile};

pub struct SqliteSuppressionStore {
    pool: SqlitePool,
}

impl SqliteSuppressionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SuppressionStore for SqliteSuppressionStore {
    async fn keys(&self, list_id: &str) -> Result<Vec<PhoneKey>> {
        let keys: Vec<String> = sqlx::query_scalar(
            "SELECT phone_key FROM suppression_entries WHERE list_id = ? ORDER BY added_at, rowid",
        )
        .bind(list_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to load suppression list"))?;

        Ok(keys.iter().filter_map(|k| PhoneKey::parse(k)).collect())
    }

    async fn count(&self, list_id: &str) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM suppression_entries WHERE list_id = ?")
                .bind(list_id)
                .fetch_one(&self.pool)
                .await
                .map_err(db_err("Failed to count suppression list"))?;
        Ok(count.max(0) as u64)
    }

    async fn add(
        &self,
        list_id: &str,
        keys: &[PhoneKey],
        source_label: Option<&str>,
    ) -> Result<AddOutcome> {
        let now = Utc::now();
        let file_id = source_label.map(|_| Uuid::new_v4().to_string());

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin suppression insert"))?;

        let mut added = 0u64;
        for key in keys {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO suppression_entries (list_id, phone_key, file_id, added_at)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(list_id)
            .bind(key.as_str())
            .bind(file_id.as_deref())
            .bind(now.timestamp_millis())
            .execute(&mut *tx)
            .await
            .map_err(db_err("Failed to insert suppression entry"))?;
            added += result.rows_affected();
        }

        let file = match (file_id, source_label) {
            (Some(id), Some(name)) if added > 0 => {
                sqlx::query(
                    "INSERT INTO suppression_files (id, list_id, name, uploaded_at, count)
                     VALUES (?, ?, ?, ?, ?)",
                )
                .bind(&id)
                .bind(list_id)
                .bind(name)
                .bind(now.timestamp_millis())
                .bind(added as i64)
                .execute(&mut *tx)
                .await
                .map_err(db_err("Failed to record uploaded file"))?;

                Some(UploadedFile {
                    id,
                    name: name.to_string(),
                    date: now,
                    count: added,
                })
            }
            _ => None,
        };

        tx.commit()
            .await
            .map_err(db_err("Failed to commit suppression insert"))?;

        Ok(AddOutcome { added, file })
    }

    async fn remove(&self, list_id: &str, keys: &[PhoneKey]) -> Result<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin suppression delete"))?;

        let mut removed = 0u64;
        for key in keys {
            let result =
                sqlx::query("DELETE FROM suppression_entries WHERE list_id = ? AND phone_key = ?")
                    .bind(list_id)
                    .bind(key.as_str())
                    .execute(&mut *tx)
                    .await
                    .map_err(db_err("Failed to delete suppression entry"))?;
            removed += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(db_err("Failed to commit suppression delete"))?;
        Ok(removed)
    }

    async fn remove_file(&self, list_id: &str, file_id: &str) -> Result<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin file removal"))?;

        let removed = sqlx::query("DELETE FROM suppression_entries WHERE list_id = ? AND file_id = ?")
            .bind(list_id)
            .bind(file_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err("Failed to delete file entries"))?
            .rows_affected();

        sqlx::query("DELETE FROM suppression_files WHERE list_id = ? AND id = ?")
            .bind(list_id)
            .bind(file_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err("Failed to delete file record"))?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit file removal"))?;
        Ok(removed)
    }

    async fn clear(&self, list_id: &str) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin clear"))?;

        for sql in [
            "DELETE FROM suppression_entries WHERE list_id = ?",
            "DELETE FROM suppression_files WHERE list_id = ?",
        ] {
            sqlx::query(sql)
                .bind(list_id)
                .execute(&mut *tx)
                .await
                .map_err(db_err("Failed to clear suppression list"))?;
        }

        tx.commit()
            .await
            .map_err(db_err("Failed to commit clear"))
    }

    async fn uploaded_files(&self, list_id: &str) -> Result<Vec<UploadedFile>> {
        let files = sqlx::query_as::<_, UploadedFileEntity>(
            "SELECT id, name, uploaded_at, count FROM suppression_files
             WHERE list_id = ? ORDER BY uploaded_at, rowid",
        )
        .bind(list_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list uploaded files"))?;

        files.into_iter().map(UploadedFile::try_from).collect()
    }
}

#[derive(sqlx::FromRow)]
struct UploadedFileEntity {
    id: String,
    name: String,
    uploaded_at: i64,
    count: i64,
}

impl TryFrom<UploadedFileEntity> for UploadedFile {
    type Error = AppError;

    fn try_from(e: UploadedFileEntity) -> Result<Self> {
        let date = DateTime::<Utc>::from_timestamp_millis(e.uploaded_at).ok_or_else(|| {
            AppError::DatabaseError(format!("Invalid upload timestamp: {}", e.uploaded_at))
        })?;
        Ok(Self {
            id: e.id,
            name: e.name,
            date,
            count: e.count.max(0) as u64,
        })
    }
}
