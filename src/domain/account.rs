use serde::{Deserialize, Serialize};

use super::scrub_options::ScrubOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
    PastDue,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::PastDue => "past_due",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(SubscriptionStatus::Active),
            "canceled" => Some(SubscriptionStatus::Canceled),
            "past_due" => Some(SubscriptionStatus::PastDue),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub plan_id: String,
    pub status: SubscriptionStatus,
    pub monthly_credits: f64,
    #[serde(default)]
    pub credits_used_this_period: f64,
    pub current_period_start: chrono::DateTime<chrono::Utc>,
    pub current_period_end: chrono::DateTime<chrono::Utc>,
}

impl Subscription {
    /// Active status and `now` inside the current billing period.
    pub fn is_active_at(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.status == SubscriptionStatus::Active
            && self.current_period_start <= now
            && now < self.current_period_end
    }
}

/// Credit balance, usage counters and scrub preferences of one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    pub credits: f64,
    pub files_processed: u64,
    pub numbers_processed: u64,
    pub numbers_removed: u64,
    pub credits_used: f64,
    pub scrub_options: ScrubOptions,
    pub subscription: Option<Subscription>,
}

/// Everything a completed job writes back to the account, applied as one
/// conditional update: nothing changes unless `credits >= cost`.
#[derive(Debug, Clone, PartialEq)]
pub struct JobCharge {
    pub cost: f64,
    pub numbers_processed: u64,
    pub numbers_removed: u64,
}
