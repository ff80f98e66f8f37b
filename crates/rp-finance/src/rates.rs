//! Rate resolution
//!
//! Derives a line item's `(cost, rate)` pair from role and employee reference
//! data, expressed in the plan's currency and rounded to two decimals.
//!
//! - Rate always comes from the role: the role's rate for the context
//!   delivery center when one exists, otherwise the role default.
//! - Cost comes from the role the same way when no employee is attached.
//!   With an employee attached it comes from the employee, picking the
//!   internal cost rate or internal bill rate per [`EmployeeCostPolicy`].
//!
//! Reference data that has not finished loading, or that belongs to a
//! different record than the one requested, defers resolution: the caller
//! receives an error and keeps its current values.

use rp_core::config::EmployeeCostPolicy;
use rp_core::error::RpError;
use rp_core::types::{round_money, CurrencyCode, RecordId};
use rp_models::{DeliveryCenterDirectory, Employee, LineItem, Role};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::currency::{CurrencyError, CurrencyRates};

/// Reference data as seen by a consumer that may be ahead of its loader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference<T> {
    Loading,
    Loaded(T),
}

impl<T> Default for Reference<T> {
    fn default() -> Self {
        Reference::Loading
    }
}

impl<T> Reference<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Reference::Loaded(value) => Some(value),
            Reference::Loading => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Reference::Loaded(_))
    }

    pub fn as_ref(&self) -> Reference<&T> {
        match self {
            Reference::Loaded(value) => Reference::Loaded(value),
            Reference::Loading => Reference::Loading,
        }
    }
}

impl<T> From<Option<T>> for Reference<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Reference::Loaded(v),
            None => Reference::Loading,
        }
    }
}

/// Why resolution was deferred
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolutionError {
    #[error("{entity} {id} has not been loaded")]
    MissingReferenceData { entity: &'static str, id: String },

    #[error("Stale {entity}: expected {expected}, loaded {actual}")]
    StaleReferenceMismatch {
        entity: &'static str,
        expected: RecordId,
        actual: RecordId,
    },

    #[error(transparent)]
    Currency(#[from] CurrencyError),
}

impl From<ResolutionError> for RpError {
    fn from(err: ResolutionError) -> Self {
        match err {
            ResolutionError::MissingReferenceData { entity, id } => {
                RpError::MissingReferenceData { entity, id }
            }
            ResolutionError::StaleReferenceMismatch {
                entity,
                expected,
                actual,
            } => RpError::StaleReferenceMismatch {
                entity,
                expected: expected.to_string(),
                actual: actual.to_string(),
            },
            ResolutionError::Currency(CurrencyError::UnknownCurrency(code)) => {
                RpError::MissingReferenceData {
                    entity: "CurrencyRate",
                    id: code.to_string(),
                }
            }
            ResolutionError::Currency(CurrencyError::Overflow { amount, .. }) => {
                RpError::InvalidNumericInput {
                    field: "amount".to_string(),
                    value: amount.to_string(),
                }
            }
            ResolutionError::Currency(err) => RpError::Config(err.to_string()),
        }
    }
}

/// Where a resolved cost came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostSource {
    RoleCenterRate,
    RoleDefault,
    EmployeeInternalCost,
    EmployeeInternalBill,
}

/// Everything resolution reads
#[derive(Debug, Clone, Copy)]
pub struct RateInputs<'a> {
    /// Role selected on the line item
    pub role_id: &'a RecordId,
    pub role: Reference<&'a Role>,
    /// Employee attached to the line item, if any
    pub employee_id: Option<&'a RecordId>,
    pub employee: Reference<&'a Employee>,
    /// Invoice or engagement delivery center of the owning plan
    pub context_center_id: Option<&'a RecordId>,
    pub target_currency: &'a CurrencyCode,
    pub centers: Reference<&'a DeliveryCenterDirectory>,
    pub currency_rates: &'a CurrencyRates,
    pub policy: EmployeeCostPolicy,
}

/// Resolved `(cost, rate)` in the target currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRates {
    pub cost: Decimal,
    pub rate: Decimal,
    pub cost_source: CostSource,
}

/// Event that asks for re-resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTrigger {
    /// Rate always; cost only when no employee is attached
    RoleChanged,
    /// Cost only
    EmployeeChanged,
    /// Cost reverts to the role-based value
    EmployeeCleared,
    /// Context center or target currency changed; both values
    ContextChanged,
}

/// Fields to overwrite after a trigger; `None` leaves the field alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RateUpdate {
    pub cost: Option<Decimal>,
    pub rate: Option<Decimal>,
}

impl RateUpdate {
    pub fn is_empty(&self) -> bool {
        self.cost.is_none() && self.rate.is_none()
    }

    pub fn apply_to(&self, item: &mut LineItem) {
        if let Some(cost) = self.cost {
            item.cost = cost;
        }
        if let Some(rate) = self.rate {
            item.rate = rate;
        }
    }
}

/// Resolve both values
pub fn resolve_rates(inputs: &RateInputs<'_>) -> Result<ResolvedRates, ResolutionError> {
    let rate = resolve_rate(inputs)?;
    let (cost, cost_source) = resolve_cost(inputs)?;
    Ok(ResolvedRates {
        cost,
        rate,
        cost_source,
    })
}

/// Resolve only what `trigger` invalidates
pub fn reresolve(
    trigger: ResolutionTrigger,
    inputs: &RateInputs<'_>,
) -> Result<RateUpdate, ResolutionError> {
    let update = match trigger {
        ResolutionTrigger::RoleChanged => RateUpdate {
            rate: Some(resolve_rate(inputs)?),
            cost: match inputs.employee_id {
                None => Some(role_cost(inputs)?.0),
                Some(_) => None,
            },
        },
        ResolutionTrigger::EmployeeChanged => RateUpdate {
            rate: None,
            cost: Some(resolve_cost(inputs)?.0),
        },
        ResolutionTrigger::EmployeeCleared => RateUpdate {
            rate: None,
            cost: Some(role_cost(inputs)?.0),
        },
        ResolutionTrigger::ContextChanged => {
            let resolved = resolve_rates(inputs)?;
            RateUpdate {
                rate: Some(resolved.rate),
                cost: Some(resolved.cost),
            }
        }
    };
    debug!(?trigger, ?update, "re-resolved line item rates");
    Ok(update)
}

/// Billing rate, always role-based
fn resolve_rate(inputs: &RateInputs<'_>) -> Result<Decimal, ResolutionError> {
    let role = require_role(inputs)?;
    let (amount, currency) = match center_rate(role, inputs.context_center_id) {
        Some(rate) => (rate.external_rate, &rate.currency),
        None => (role.default_external_rate, &role.default_currency),
    };
    to_target(inputs, amount, currency)
}

fn resolve_cost(inputs: &RateInputs<'_>) -> Result<(Decimal, CostSource), ResolutionError> {
    match inputs.employee_id {
        None => role_cost(inputs),
        Some(employee_id) => employee_cost(inputs, employee_id),
    }
}

fn role_cost(inputs: &RateInputs<'_>) -> Result<(Decimal, CostSource), ResolutionError> {
    let role = require_role(inputs)?;
    let (amount, currency, source) = match center_rate(role, inputs.context_center_id) {
        Some(rate) => (
            rate.internal_cost_rate,
            &rate.currency,
            CostSource::RoleCenterRate,
        ),
        None => (
            role.default_internal_cost_rate,
            &role.default_currency,
            CostSource::RoleDefault,
        ),
    };
    Ok((to_target(inputs, amount, currency)?, source))
}

fn employee_cost(
    inputs: &RateInputs<'_>,
    employee_id: &RecordId,
) -> Result<(Decimal, CostSource), ResolutionError> {
    let employee = match inputs.employee {
        Reference::Loaded(employee) => employee,
        Reference::Loading => return Err(missing("Employee", employee_id)),
    };
    if employee.id != *employee_id {
        return Err(ResolutionError::StaleReferenceMismatch {
            entity: "Employee",
            expected: employee_id.clone(),
            actual: employee.id.clone(),
        });
    }

    let source = match inputs.policy {
        EmployeeCostPolicy::AlwaysInternalCost => CostSource::EmployeeInternalCost,
        EmployeeCostPolicy::CenterMatchSensitive => {
            let centers = match inputs.centers {
                Reference::Loaded(centers) => centers,
                Reference::Loading => {
                    return Err(ResolutionError::MissingReferenceData {
                        entity: "DeliveryCenter",
                        id: employee.delivery_center_code.clone().unwrap_or_default(),
                    })
                }
            };
            let home_center = employee
                .delivery_center_code
                .as_deref()
                .and_then(|code| centers.id_for_code(code));
            match (home_center, inputs.context_center_id) {
                (Some(home), Some(context)) if home == context => {
                    CostSource::EmployeeInternalCost
                }
                _ => CostSource::EmployeeInternalBill,
            }
        }
    };

    let amount = match source {
        CostSource::EmployeeInternalCost => employee.internal_cost_rate,
        _ => employee.internal_bill_rate,
    };
    Ok((to_target(inputs, amount, &employee.default_currency)?, source))
}

fn require_role<'a>(inputs: &RateInputs<'a>) -> Result<&'a Role, ResolutionError> {
    let role = match inputs.role {
        Reference::Loaded(role) => role,
        Reference::Loading => return Err(missing("Role", inputs.role_id)),
    };
    if role.id != *inputs.role_id {
        return Err(ResolutionError::StaleReferenceMismatch {
            entity: "Role",
            expected: inputs.role_id.clone(),
            actual: role.id.clone(),
        });
    }
    Ok(role)
}

fn center_rate<'a>(
    role: &'a Role,
    context_center_id: Option<&RecordId>,
) -> Option<&'a rp_models::RoleRate> {
    context_center_id.and_then(|center| role.rate_for_center(center))
}

fn to_target(
    inputs: &RateInputs<'_>,
    amount: Decimal,
    currency: &CurrencyCode,
) -> Result<Decimal, ResolutionError> {
    let converted = inputs
        .currency_rates
        .convert(amount, currency, inputs.target_currency)?;
    Ok(round_money(converted))
}

fn missing(entity: &'static str, id: &RecordId) -> ResolutionError {
    debug!(entity, %id, "reference data not loaded, deferring");
    ResolutionError::MissingReferenceData {
        entity,
        id: id.to_string(),
    }
}
