//! Role model
//!
//! A role is a job function carrying default billing/cost rates plus
//! per-delivery-center overrides.

use rp_core::traits::{Entity, Identifiable};
use rp_core::types::{CurrencyCode, RecordId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Rates a role carries for one delivery center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRate {
    pub delivery_center_id: RecordId,
    pub internal_cost_rate: Decimal,
    pub external_rate: Decimal,
    pub currency: CurrencyCode,
}

impl RoleRate {
    pub fn new(
        delivery_center_id: impl Into<RecordId>,
        internal_cost_rate: Decimal,
        external_rate: Decimal,
        currency: impl Into<CurrencyCode>,
    ) -> Self {
        Self {
            delivery_center_id: delivery_center_id.into(),
            internal_cost_rate,
            external_rate,
            currency: currency.into(),
        }
    }
}

/// Role entity
///
/// At most one [`RoleRate`] exists per delivery center; [`Role::add_rate`]
/// replaces an existing entry for the same center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: RecordId,

    /// Role name
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    /// Internal cost rate used when no rate exists for the center
    #[serde(default)]
    pub default_internal_cost_rate: Decimal,

    /// Billing rate used when no rate exists for the center
    #[serde(default)]
    pub default_external_rate: Decimal,

    pub default_currency: CurrencyCode,

    /// Per-center rates
    #[serde(default)]
    pub rates: Vec<RoleRate>,
}

impl Identifiable for Role {
    fn id(&self) -> Option<&RecordId> {
        Some(&self.id)
    }
}

impl Entity for Role {
    const TYPE_NAME: &'static str = "Role";
}

impl Role {
    /// Create a new role with zero default rates
    pub fn new(
        id: impl Into<RecordId>,
        name: impl Into<String>,
        default_currency: impl Into<CurrencyCode>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            default_internal_cost_rate: Decimal::ZERO,
            default_external_rate: Decimal::ZERO,
            default_currency: default_currency.into(),
            rates: Vec::new(),
        }
    }

    /// Set the default cost and billing rates
    pub fn with_defaults(mut self, internal_cost_rate: Decimal, external_rate: Decimal) -> Self {
        self.default_internal_cost_rate = internal_cost_rate;
        self.default_external_rate = external_rate;
        self
    }

    /// Builder form of [`Role::add_rate`]
    pub fn with_rate(mut self, rate: RoleRate) -> Self {
        self.add_rate(rate);
        self
    }

    /// Add or replace the rate for the rate's delivery center
    pub fn add_rate(&mut self, rate: RoleRate) {
        match self
            .rates
            .iter_mut()
            .find(|r| r.delivery_center_id == rate.delivery_center_id)
        {
            Some(existing) => *existing = rate,
            None => self.rates.push(rate),
        }
    }

    /// Rate entry for a delivery center, if any
    pub fn rate_for_center(&self, delivery_center_id: &RecordId) -> Option<&RoleRate> {
        self.rates
            .iter()
            .find(|r| r.delivery_center_id == *delivery_center_id)
    }

    /// Whether every delivery center appears at most once
    pub fn has_unique_centers(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.rates.iter().all(|r| seen.insert(&r.delivery_center_id))
    }
}
