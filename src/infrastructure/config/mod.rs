use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::application::use_cases::column_inference::ColumnPolicyKind;
use crate::application::use_cases::credit_calculator::CreditPricing;
use crate::domain::error::{AppError, Result};
use crate::infrastructure::workbook::validate_sheet_label;

pub const DEFAULT_CONFIG_FILE: &str = "phone-scrub.toml";
pub const ENV_PREFIX: &str = "SCRUB_";

/// Service configuration: defaults, then `phone-scrub.toml`, then
/// `SCRUB_*` environment variables (`SCRUB_PRICING__DNC_SURCHARGE=0.6`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// `sqlite://...` or `memory://` for a non-persistent store.
    pub database_url: String,
    pub http_host: String,
    pub http_port: u16,
    pub log_level: String,
    pub max_upload_bytes: usize,
    pub output_sheet_label: String,
    pub starting_credits: f64,
    pub column_policy: ColumnPolicyKind,
    pub pricing: CreditPricing,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://phone-scrub.db".to_string(),
            http_host: "127.0.0.1".to_string(),
            http_port: 3001,
            log_level: "info".to_string(),
            max_upload_bytes: 25 * 1024 * 1024,
            output_sheet_label: "Cleaned Phone Numbers".to_string(),
            starting_credits: 15_000.0,
            column_policy: ColumnPolicyKind::default(),
            pricing: CreditPricing::default(),
        }
    }
}

impl AppConfig {
    /// Load from the default file location and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let config: AppConfig = Self::figment(path)
            .extract()
            .map_err(|e| AppError::InvalidInput(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.http_port == 0 {
            return Err(AppError::InvalidInput("http_port must be > 0".to_string()));
        }
        validate_sheet_label(&self.output_sheet_label)?;
        if self.max_upload_bytes == 0 {
            return Err(AppError::InvalidInput(
                "max_upload_bytes must be > 0".to_string(),
            ));
        }
        if !self.starting_credits.is_finite() || self.starting_credits < 0.0 {
            return Err(AppError::InvalidInput(
                "starting_credits must be a non-negative number".to_string(),
            ));
        }
        self.pricing
            .validate()
            .map_err(|e| AppError::InvalidInput(format!("Invalid pricing: {}", e)))
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url.starts_with("memory:")
    }
}
