//! Snapshot files
//!
//! A snapshot is one opportunity with its plans and line items, plus the
//! reference data needed to resolve rates. The currency table is optional;
//! the configured one is used when it is missing.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rp_core::config::CurrencyConfig;
use rp_core::types::RecordId;
use rp_finance::{weeks_between, CurrencyRates};
use rp_models::{DeliveryCenterDirectory, Employee, Opportunity, ResourcePlan, Role};
use rp_services::reference::InMemoryReferenceData;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub roles: Vec<Role>,

    #[serde(default)]
    pub employees: Vec<Employee>,

    #[serde(default)]
    pub delivery_centers: DeliveryCenterDirectory,

    pub opportunity: Opportunity,

    #[serde(default)]
    pub currency_rates: Option<CurrencyConfig>,
}

impl Snapshot {
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        Self::parse(&bytes).with_context(|| format!("Invalid snapshot {}", path.display()))
    }

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn plan(&self, id: &RecordId) -> Option<&ResourcePlan> {
        self.opportunity.plan(id)
    }

    /// Sundays covering every line item of the opportunity
    pub fn weeks(&self) -> Vec<NaiveDate> {
        let items = || self.opportunity.plans.iter().flat_map(|p| p.line_items.iter());
        let start = items().map(|item| item.start_date).min();
        let end = items().map(|item| item.end_date).max();
        match (start, end) {
            (Some(start), Some(end)) => weeks_between(start, end),
            _ => Vec::new(),
        }
    }

    pub fn reference_data(&self, configured: &CurrencyConfig) -> Result<InMemoryReferenceData> {
        let currency = self.currency_rates.as_ref().unwrap_or(configured);
        let rates = CurrencyRates::from_config(currency).context("Invalid currency rates")?;
        Ok(InMemoryReferenceData::with_data(
            rates,
            self.roles.clone(),
            self.employees.clone(),
            self.delivery_centers.clone(),
        ))
    }
}
