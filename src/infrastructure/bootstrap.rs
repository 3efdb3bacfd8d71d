use std::sync::Arc;

use tracing::info;

use crate::application::use_cases::account_locks::AccountLocks;
use crate::application::use_cases::column_inference::ColumnPolicy;
use crate::application::use_cases::credit_calculator::CreditCalculator;
use crate::application::{
    AccountUseCase, ComplianceLists, ScrubEngine, ScrubFileUseCase, ScrubOptionsUseCase,
    SuppressionListUseCase,
};
use crate::domain::error::Result;
use crate::domain::store::{AccountStore, ComplianceStore, SuppressionStore};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::db::{
    init_db, SqliteAccountStore, SqliteComplianceStore, SqliteSuppressionStore,
};
use crate::infrastructure::memory::{
    MemoryAccountStore, MemoryComplianceStore, MemorySuppressionStore,
};

/// Everything the interfaces need, built once at startup.
pub struct AppState {
    pub config: AppConfig,
    pub accounts: Arc<AccountUseCase>,
    pub scrub_options: Arc<ScrubOptionsUseCase>,
    pub suppression: Arc<SuppressionListUseCase>,
    pub compliance: Arc<ComplianceLists>,
    pub scrub_file: Arc<ScrubFileUseCase>,
}

struct Stores {
    accounts: Arc<dyn AccountStore>,
    suppression: Arc<dyn SuppressionStore>,
    compliance: Arc<dyn ComplianceStore>,
}

async fn open_stores(config: &AppConfig) -> Result<Stores> {
    if config.is_in_memory() {
        info!("Using in-memory stores; data is lost on exit");
        return Ok(Stores {
            accounts: Arc::new(MemoryAccountStore::new()),
            suppression: Arc::new(MemorySuppressionStore::new()),
            compliance: Arc::new(MemoryComplianceStore::new()),
        });
    }

    let pool = init_db(&config.database_url).await?;
    info!(database_url = %config.database_url, "Database ready");
    Ok(Stores {
        accounts: Arc::new(SqliteAccountStore::new(pool.clone())),
        suppression: Arc::new(SqliteSuppressionStore::new(pool.clone())),
        compliance: Arc::new(SqliteComplianceStore::new(pool)),
    })
}

pub async fn build_state(config: AppConfig) -> Result<AppState> {
    let stores = open_stores(&config).await?;

    let policy: Arc<dyn ColumnPolicy> = Arc::new(config.column_policy.build());
    let engine = ScrubEngine::new(policy.clone(), CreditCalculator::new(config.pricing));

    let suppression = Arc::new(SuppressionListUseCase::new(
        stores.suppression,
        policy.clone(),
    ));
    let compliance = Arc::new(ComplianceLists::new(stores.compliance, policy));
    let scrub_file = Arc::new(ScrubFileUseCase::new(
        engine,
        suppression.clone(),
        compliance.clone(),
        stores.accounts.clone(),
        Arc::new(AccountLocks::new()),
        config.output_sheet_label.clone(),
    ));

    info!(
        column_policy = ?config.column_policy,
        base_rate = config.pricing.base_rate,
        dnc_surcharge = config.pricing.dnc_surcharge,
        tcpa_surcharge = config.pricing.tcpa_surcharge,
        "Scrub pipeline configured"
    );

    Ok(AppState {
        accounts: Arc::new(AccountUseCase::new(
            stores.accounts.clone(),
            config.starting_credits,
        )),
        scrub_options: Arc::new(ScrubOptionsUseCase::new(stores.accounts)),
        suppression,
        compliance,
        scrub_file,
        config,
    })
}
