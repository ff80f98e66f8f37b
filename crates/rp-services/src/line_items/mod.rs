//! Line item services
//!
//! - create: contract-checked create inside an estimate or engagement
//! - update: apply params, zero weeks that left the date range, persist
//! - delete: remove the item and its weekly hours

mod create;
mod delete;
mod update;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rp_core::types::{CurrencyCode, RecordId};
use rp_models::LineItem;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use create::CreateLineItemService;
pub use delete::DeleteLineItemService;
pub use update::UpdateLineItemService;

/// Line item service params. Every field is optional; `None` leaves the
/// attribute untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemParams {
    pub role_id: Option<RecordId>,
    /// `Some(None)` detaches the employee
    pub employee_id: Option<Option<RecordId>>,
    pub delivery_center_id: Option<RecordId>,
    pub cost: Option<Decimal>,
    pub rate: Option<Decimal>,
    pub currency: Option<CurrencyCode>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub billable: Option<bool>,
    pub billable_expense_percentage: Option<Decimal>,
    /// Hours per week start
    #[serde(default)]
    pub hours: BTreeMap<NaiveDate, Decimal>,
}

impl LineItemParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role_id(mut self, role_id: impl Into<RecordId>) -> Self {
        self.role_id = Some(role_id.into());
        self
    }

    pub fn with_employee_id(mut self, employee_id: Option<RecordId>) -> Self {
        self.employee_id = Some(employee_id);
        self
    }

    pub fn with_cost(mut self, cost: Decimal) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn with_rate(mut self, rate: Decimal) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn with_dates(mut self, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self.end_date = Some(end_date);
        self
    }

    pub fn with_billable_expense_percentage(mut self, percentage: Decimal) -> Self {
        self.billable_expense_percentage = Some(percentage);
        self
    }

    pub fn with_hours(mut self, week: NaiveDate, hours: Decimal) -> Self {
        self.hours.insert(week, hours);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.changed_attributes().is_empty()
    }

    /// Fold a later edit into this one; fields set in `later` win
    pub fn merge(&mut self, later: LineItemParams) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if later.$field.is_some() {
                    self.$field = later.$field;
                })*
            };
        }
        take!(
            role_id,
            employee_id,
            delivery_center_id,
            cost,
            rate,
            currency,
            start_date,
            end_date,
            billable,
            billable_expense_percentage
        );
        self.hours.extend(later.hours);
    }

    /// Names of the attributes these params touch
    pub fn changed_attributes(&self) -> Vec<&'static str> {
        let mut changed = Vec::new();
        macro_rules! check {
            ($($field:ident),*) => {
                $(if self.$field.is_some() {
                    changed.push(stringify!($field));
                })*
            };
        }
        check!(
            role_id,
            employee_id,
            delivery_center_id,
            cost,
            rate,
            currency,
            start_date,
            end_date,
            billable,
            billable_expense_percentage
        );
        if !self.hours.is_empty() {
            changed.push("weekly_hours");
        }
        changed
    }

    /// Write the set attributes onto `item`
    pub fn apply_to(&self, item: &mut LineItem) {
        if let Some(role_id) = &self.role_id {
            item.role_id = Some(role_id.clone());
        }
        if let Some(employee_id) = &self.employee_id {
            item.employee_id = employee_id.clone();
        }
        if let Some(center) = &self.delivery_center_id {
            item.delivery_center_id = Some(center.clone());
        }
        if let Some(cost) = self.cost {
            item.cost = cost;
        }
        if let Some(rate) = self.rate {
            item.rate = rate;
        }
        if let Some(currency) = &self.currency {
            item.currency = currency.clone();
        }
        if let Some(start_date) = self.start_date {
            item.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            item.end_date = end_date;
        }
        if let Some(billable) = self.billable {
            item.billable = billable;
        }
        if let Some(percentage) = self.billable_expense_percentage {
            item.billable_expense_percentage = percentage;
        }
        for (week, hours) in &self.hours {
            item.set_weekly_hour(*week, *hours);
        }
    }
}
