//! Employee model

use rp_core::traits::{Entity, Identifiable};
use rp_core::types::{CurrencyCode, RecordId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Employee reference data. Immutable from the engine's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: RecordId,

    #[validate(length(min = 1, max = 255))]
    pub name: String,

    /// Code of the employee's home delivery center
    #[serde(default)]
    pub delivery_center_code: Option<String>,

    pub default_currency: CurrencyCode,

    #[serde(default)]
    pub internal_cost_rate: Decimal,

    #[serde(default)]
    pub internal_bill_rate: Decimal,

    #[serde(default)]
    pub external_bill_rate: Decimal,
}

impl Identifiable for Employee {
    fn id(&self) -> Option<&RecordId> {
        Some(&self.id)
    }
}

impl Entity for Employee {
    const TYPE_NAME: &'static str = "Employee";
}

impl Employee {
    pub fn new(
        id: impl Into<RecordId>,
        name: impl Into<String>,
        default_currency: impl Into<CurrencyCode>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            delivery_center_code: None,
            default_currency: default_currency.into(),
            internal_cost_rate: Decimal::ZERO,
            internal_bill_rate: Decimal::ZERO,
            external_bill_rate: Decimal::ZERO,
        }
    }

    pub fn with_home_center(mut self, code: impl Into<String>) -> Self {
        self.delivery_center_code = Some(code.into());
        self
    }

    pub fn with_rates(
        mut self,
        internal_cost_rate: Decimal,
        internal_bill_rate: Decimal,
        external_bill_rate: Decimal,
    ) -> Self {
        self.internal_cost_rate = internal_cost_rate;
        self.internal_bill_rate = internal_bill_rate;
        self.external_bill_rate = external_bill_rate;
        self
    }
}
