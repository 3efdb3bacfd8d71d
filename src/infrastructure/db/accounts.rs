use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use super::connection::db_err;
use crate::domain::account::{Account, JobCharge, Subscription, SubscriptionStatus};
use crate::domain::error::{AppError, Result};
use crate::domain::scrub_options::ScrubOptions;
use crate::domain::store::AccountStore;

pub struct SqliteAccountStore {
    pool: SqlitePool,
}

impl SqliteAccountStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn get_subscription(&self, account_id: &str) -> Result<Option<Subscription>> {
        let entity = sqlx::query_as::<_, SubscriptionEntity>(
            "SELECT plan_id, status, monthly_credits, credits_used_this_period,
                    current_period_start, current_period_end
             FROM subscriptions WHERE account_id = ?",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to fetch subscription"))?;

        entity.map(Subscription::try_from).transpose()
    }
}

#[async_trait]
impl AccountStore for SqliteAccountStore {
    async fn create(&self, name: &str, credits: f64) -> Result<Account> {
        let id = Uuid::new_v4().to_string();
        let defaults = ScrubOptions::default();

        sqlx::query(
            "INSERT INTO accounts (id, name, credits, remove_duplicates, check_against_user_list,
                                   check_against_dnc, check_against_tcpa, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(name)
        .bind(credits)
        .bind(defaults.remove_duplicates)
        .bind(defaults.check_against_user_list)
        .bind(defaults.check_against_dnc)
        .bind(defaults.check_against_tcpa)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to create account"))?;

        self.get(&id).await
    }

    async fn get(&self, account_id: &str) -> Result<Account> {
        let entity = sqlx::query_as::<_, AccountEntity>(
            "SELECT id, name, credits, files_processed, numbers_processed, numbers_removed,
                    credits_used, remove_duplicates, check_against_user_list,
                    check_against_dnc, check_against_tcpa
             FROM accounts WHERE id = ?",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to fetch account"))?
        .ok_or_else(|| AppError::NotFound(format!("Account not found: {}", account_id)))?;

        let subscription = self.get_subscription(account_id).await?;
        Ok(entity.into_account(subscription))
    }

    async fn update_scrub_options(&self, account_id: &str, options: &ScrubOptions) -> Result<()> {
        let result = sqlx::query(
            "UPDATE accounts SET remove_duplicates = ?, check_against_user_list = ?,
                                 check_against_dnc = ?, check_against_tcpa = ?
             WHERE id = ?",
        )
        .bind(options.remove_duplicates)
        .bind(options.check_against_user_list)
        .bind(options.check_against_dnc)
        .bind(options.check_against_tcpa)
        .bind(account_id)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to update scrub options"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Account not found: {}", account_id)));
        }
        Ok(())
    }

    async fn charge(&self, account_id: &str, charge: &JobCharge) -> Result<Account> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin charge transaction"))?;

        let result = sqlx::query(
            "UPDATE accounts
             SET credits = credits - ?,
                 files_processed = files_processed + 1,
                 numbers_processed = numbers_processed + ?,
                 numbers_removed = numbers_removed + ?,
                 credits_used = credits_used + ?
             WHERE id = ? AND credits >= ?",
        )
        .bind(charge.cost)
        .bind(charge.numbers_processed as i64)
        .bind(charge.numbers_removed as i64)
        .bind(charge.cost)
        .bind(account_id)
        .bind(charge.cost)
        .execute(&mut *tx)
        .await
        .map_err(db_err("Failed to charge account"))?;

        if result.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(db_err("Failed to roll back charge"))?;
            let account = self.get(account_id).await?;
            return Err(AppError::InsufficientCredits {
                required: charge.cost,
                available: account.credits,
            });
        }

        let now = Utc::now().timestamp_millis();
        sqlx::query(
            "UPDATE subscriptions
             SET credits_used_this_period = credits_used_this_period + ?
             WHERE account_id = ? AND status = 'active'
               AND current_period_start <= ? AND current_period_end > ?",
        )
        .bind(charge.cost)
        .bind(account_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_err("Failed to update subscription usage"))?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit charge"))?;

        self.get(account_id).await
    }

    async fn grant_credits(&self, account_id: &str, amount: f64) -> Result<Account> {
        let result = sqlx::query("UPDATE accounts SET credits = MAX(0, credits + ?) WHERE id = ?")
            .bind(amount)
            .bind(account_id)
            .execute(&self.pool)
            .await
            .map_err(db_err("Failed to adjust credits"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Account not found: {}", account_id)));
        }
        self.get(account_id).await
    }

    async fn set_subscription(
        &self,
        account_id: &str,
        subscription: Option<&Subscription>,
    ) -> Result<Account> {
        // existence check, so a subscription never dangles
        self.get(account_id).await?;

        match subscription {
            Some(sub) => {
                sqlx::query(
                    "INSERT OR REPLACE INTO subscriptions
                        (account_id, plan_id, status, monthly_credits, credits_used_this_period,
                         current_period_start, current_period_end)
                     VALUES (?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(account_id)
                .bind(&sub.plan_id)
                .bind(sub.status.as_str())
                .bind(sub.monthly_credits)
                .bind(sub.credits_used_this_period)
                .bind(sub.current_period_start.timestamp_millis())
                .bind(sub.current_period_end.timestamp_millis())
                .execute(&self.pool)
                .await
                .map_err(db_err("Failed to save subscription"))?;
            }
            None => {
                sqlx::query("DELETE FROM subscriptions WHERE account_id = ?")
                    .bind(account_id)
                    .execute(&self.pool)
                    .await
                    .map_err(db_err("Failed to remove subscription"))?;
            }
        }

        self.get(account_id).await
    }
}

// Internal entities for database mapping
#[derive(sqlx::FromRow)]
struct AccountEntity {
    id: String,
    name: String,
    credits: f64,
    files_processed: i64,
    numbers_processed: i64,
    numbers_removed: i64,
    credits_used: f64,
    remove_duplicates: bool,
    check_against_user_list: bool,
    check_against_dnc: bool,
    check_against_tcpa: bool,
}

impl AccountEntity {
    fn into_account(self, subscription: Option<Subscription>) -> Account {
        Account {
            id: self.id,
            name: self.name,
            credits: self.credits,
            files_processed: self.files_processed.max(0) as u64,
            numbers_processed: self.numbers_processed.max(0) as u64,
            numbers_removed: self.numbers_removed.max(0) as u64,
            credits_used: self.credits_used,
            scrub_options: ScrubOptions {
                remove_duplicates: self.remove_duplicates,
                check_against_user_list: self.check_against_user_list,
                check_against_dnc: self.check_against_dnc,
                check_against_tcpa: self.check_against_tcpa,
            },
            subscription,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SubscriptionEntity {
    plan_id: String,
    status: String,
    monthly_credits: f64,
    credits_used_this_period: f64,
    current_period_start: i64,
    current_period_end: i64,
}

impl TryFrom<SubscriptionEntity> for Subscription {
    type Error = AppError;

    fn try_from(e: SubscriptionEntity) -> Result<Self> {
        let status = SubscriptionStatus::parse(&e.status).ok_or_else(|| {
            AppError::DatabaseError(format!("Unknown subscription status: {}", e.status))
        })?;
        Ok(Self {
            plan_id: e.plan_id,
            status,
            monthly_credits: e.monthly_credits,
            credits_used_this_period: e.credits_used_this_period,
            current_period_start: millis_to_datetime(e.current_period_start)?,
            current_period_end: millis_to_datetime(e.current_period_end)?,
        })
    }
}

fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| AppError::DatabaseError(format!("Invalid timestamp: {}", millis)))
}
