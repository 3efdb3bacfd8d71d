use std::sync::Arc;

use tracing::info;

use crate::domain::account::{Account, Subscription};
use crate::domain::error::{AppError, Result};
use crate::domain::store::AccountStore;

pub struct AccountUseCase {
    accounts: Arc<dyn AccountStore>,
    starting_credits: f64,
}

impl AccountUseCase {
    pub fn new(accounts: Arc<dyn AccountStore>, starting_credits: f64) -> Self {
        Self {
            accounts,
            starting_credits,
        }
    }

    pub async fn create(&self, name: &str) -> Result<Account> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput(
                "Account name must not be empty".to_string(),
            ));
        }
        let account = self.accounts.create(name, self.starting_credits).await?;
        info!(account_id = %account.id, credits = account.credits, "Account created");
        Ok(account)
    }

    pub async fn get(&self, account_id: &str) -> Result<Account> {
        self.accounts.get(account_id).await
    }

    /// Admin balance adjustment. Negative amounts debit; the balance never
    /// drops below zero.
    pub async fn grant_credits(&self, account_id: &str, amount: f64) -> Result<Account> {
        if !amount.is_finite() {
            return Err(AppError::InvalidInput(
                "Credit amount must be a finite number".to_string(),
            ));
        }
        let account = self.accounts.grant_credits(account_id, amount).await?;
        info!(account_id, amount, balance = account.credits, "Credits adjusted");
        Ok(account)
    }

    pub async fn set_subscription(
        &self,
        account_id: &str,
        subscription: Option<Subscription>,
    ) -> Result<Account> {
        if let Some(sub) = &subscription {
            if sub.current_period_end < sub.current_period_start {
                return Err(AppError::InvalidInput(
                    "Subscription period ends before it starts".to_string(),
                ));
            }
            if !sub.monthly_credits.is_finite() || sub.monthly_credits < 0.0 {
                return Err(AppError::InvalidInput(
                    "monthly_credits must be a non-negative number".to_string(),
                ));
            }
        }
        self.accounts
            .set_subscription(account_id, subscription.as_ref())
            .await
    }
}
