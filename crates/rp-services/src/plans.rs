//! Plan-wide rate resolution

use std::sync::Arc;

use rp_core::config::EmployeeCostPolicy;
use rp_core::error::RpError;
use rp_core::types::RecordId;
use rp_finance::{resolve_rates, RateInputs, ResolvedRates};
use rp_models::{LineItem, ResourcePlan};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::reference::ReferenceData;
use crate::result::ServiceResult;

/// Resolution for one line item of a plan
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLineItem {
    pub line_item_id: Option<RecordId>,
    pub role_id: RecordId,
    pub employee_id: Option<RecordId>,
    #[serde(flatten)]
    pub rates: ResolvedRates,
}

/// Resolves `(cost, rate)` for every line item of a plan against the
/// current reference data
pub struct ResolvePlanService<R: ReferenceData> {
    reference: Arc<R>,
    policy: EmployeeCostPolicy,
}

impl<R: ReferenceData> ResolvePlanService<R> {
    pub fn new(reference: Arc<R>, policy: EmployeeCostPolicy) -> Self {
        Self { reference, policy }
    }

    /// One result per line item, in plan order. Items whose reference data
    /// is missing or stale fail individually.
    #[instrument(skip(self, plan), fields(plan_id = %plan.id))]
    pub fn call(&self, plan: &ResourcePlan) -> Vec<ServiceResult<ResolvedLineItem>> {
        let centers = self.reference.delivery_centers();
        let currency_rates = self.reference.currency_rates();

        plan.line_items
            .iter()
            .map(|item| {
                let Some(role_id) = item.role_id.clone() else {
                    return ServiceResult::failure_with_error("role", "can't be blank");
                };
                let role = self.reference.role(&role_id);
                let employee = item
                    .employee_id
                    .as_ref()
                    .map(|id| self.reference.employee(id))
                    .unwrap_or_default();

                let inputs = RateInputs {
                    role_id: &role_id,
                    role: role.as_ref(),
                    employee_id: item.employee_id.as_ref(),
                    employee: employee.as_ref(),
                    context_center_id: plan.invoice_center_id.as_ref(),
                    target_currency: &plan.currency,
                    centers: centers.as_ref(),
                    currency_rates: &currency_rates,
                    policy: self.policy,
                };

                match resolve_rates(&inputs) {
                    Ok(rates) => ServiceResult::success(resolved(item, role_id, rates)),
                    Err(err) => {
                        debug!(line_item = ?item.id, error = %err, "Resolution deferred");
                        ServiceResult::from_error(RpError::from(err))
                    }
                }
            })
            .collect()
    }
}

fn resolved(item: &LineItem, role_id: RecordId, rates: ResolvedRates) -> ResolvedLineItem {
    ResolvedLineItem {
        line_item_id: item.id.clone(),
        role_id,
        employee_id: item.employee_id.clone(),
        rates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::InMemoryReferenceData;
    use chrono::NaiveDate;
    use rp_finance::CurrencyRates;
    use rp_models::{DeliveryCenter, DeliveryCenterDirectory, PlanKind, Role, RoleRate};
    use rust_decimal_macros::dec;

    #[test]
    fn test_resolves_each_item() {
        let reference = InMemoryReferenceData::with_data(
            CurrencyRates::default(),
            vec![Role::new(3, "Developer", "USD")
                .with_defaults(dec!(45), dec!(90))
                .with_rate(RoleRate::new(1, dec!(50), dec!(100), "USD"))],
            Vec::new(),
            DeliveryCenterDirectory::new(vec![DeliveryCenter::new(1, "NYC", "New York", "USD")]),
        );
        let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        let plan = ResourcePlan::new(4, PlanKind::Estimate, "Build", "USD")
            .with_invoice_center(1)
            .with_line_item(LineItem::new("USD", d(10), d(23)).with_role(3))
            .with_line_item(LineItem::new("USD", d(10), d(23)).with_role(8))
            .with_line_item(LineItem::new("USD", d(10), d(23)));

        let service = ResolvePlanService::new(Arc::new(reference), EmployeeCostPolicy::default());
        let results = service.call(&plan);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].result().map(|r| r.rates.rate), Some(dec!(100)));
        assert_eq!(results[1].error_code(), Some("missing_reference_data"));
        assert!(results[2].errors().has_error("role"));
    }
}
