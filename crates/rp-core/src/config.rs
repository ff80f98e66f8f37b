//! Configuration types and loading
//!
//! Layering: built-in defaults, then an optional file (TOML, JSON or YAML,
//! picked by extension), then `RESOURCE_PLAN__SECTION__KEY` environment
//! variables.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::CurrencyCode;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "RESOURCE_PLAN";

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AppConfig {
    /// Debounced auto-save settings
    pub autosave: AutosaveConfig,

    /// Currency conversion settings
    pub currency: CurrencyConfig,

    /// Rate resolution settings
    pub rates: RatesConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AutosaveConfig {
    /// Quiet period before a pending edit is written
    pub debounce_ms: u64,
    /// Where drafts are persisted between sessions; in-memory when unset
    pub draft_store_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CurrencyConfig {
    /// Pivot currency of the rate table
    pub base_currency: CurrencyCode,
    /// Units of each currency per one unit of the base currency
    pub rates: BTreeMap<CurrencyCode, Decimal>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RatesConfig {
    pub employee_cost_policy: EmployeeCostPolicy,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    /// Emit JSON lines instead of the human-readable format
    pub json: bool,
}

/// Where an attached employee's cost comes from when the employee's home
/// delivery center differs from the plan's invoice center.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeCostPolicy {
    /// Same center: internal cost rate. Different center: internal bill rate.
    #[default]
    CenterMatchSensitive,
    /// Internal cost rate regardless of center.
    AlwaysInternalCost,
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut rates = BTreeMap::new();
        rates.insert(CurrencyCode::usd(), Decimal::ONE);

        Self {
            autosave: AutosaveConfig {
                debounce_ms: 400,
                draft_store_path: None,
            },
            currency: CurrencyConfig {
                base_currency: CurrencyCode::usd(),
                rates,
            },
            rates: RatesConfig {
                employee_cost_policy: EmployeeCostPolicy::CenterMatchSensitive,
            },
            logging: LoggingConfig {
                filter: "info,rp_services=debug".to_string(),
                json: false,
            },
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
    #[error("Config file error: {0}")]
    FileError(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::FileError(err.to_string())
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&AppConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let loaded: AppConfig = builder.build()?.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Load configuration from defaults and environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.currency.rates.contains_key(&self.currency.base_currency) {
            return Err(ConfigError::InvalidValue {
                key: "currency.rates".into(),
                message: format!("missing base currency {}", self.currency.base_currency),
            });
        }
        if let Some((code, _)) = self
            .currency
            .rates
            .iter()
            .find(|(_, rate)| **rate <= Decimal::ZERO)
        {
            return Err(ConfigError::InvalidValue {
                key: format!("currency.rates.{}", code),
                message: "must be greater than 0".into(),
            });
        }
        Ok(())
    }

    pub fn debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.autosave.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.autosave.debounce_ms, 400);
        assert_eq!(config.currency.base_currency, CurrencyCode::usd());
        assert_eq!(
            config.rates.employee_cost_policy,
            EmployeeCostPolicy::CenterMatchSensitive
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{
                "autosave": {{ "debounce_ms": 250 }},
                "currency": {{ "rates": {{ "USD": "1", "EUR": "0.92" }} }},
                "rates": {{ "employee_cost_policy": "always_internal_cost" }}
            }}"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.autosave.debounce_ms, 250);
        assert_eq!(
            config.currency.rates.get(&CurrencyCode::new("eur")),
            Some(&dec!(0.92))
        );
        assert_eq!(
            config.rates.employee_cost_policy,
            EmployeeCostPolicy::AlwaysInternalCost
        );
    }

    #[test]
    fn test_rejects_non_positive_rate() {
        let mut config = AppConfig::default();
        config.currency.rates.insert(CurrencyCode::new("EUR"), Decimal::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_rejects_missing_base_currency() {
        let mut config = AppConfig::default();
        config.currency.rates.clear();
        assert!(config.validate().is_err());
    }
}
