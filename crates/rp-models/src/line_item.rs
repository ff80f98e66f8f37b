//! Line item model
//!
//! A line item is one row of an estimate or engagement resource plan: a role
//! (optionally staffed by an employee) with a cost, a billing rate and weekly
//! hours over a date range.

use chrono::{Datelike, NaiveDate, Weekday};
use rp_core::traits::{Entity, Identifiable, PlanScoped};
use rp_core::types::{CurrencyCode, DateRange, RecordId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Hours booked in one week. `week_start_date` is a Sunday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyHour {
    pub week_start_date: NaiveDate,
    pub hours: Decimal,
}

impl WeeklyHour {
    pub fn new(week_start_date: NaiveDate, hours: Decimal) -> Self {
        Self {
            week_start_date,
            hours,
        }
    }

    pub fn is_sunday_keyed(&self) -> bool {
        self.week_start_date.weekday() == Weekday::Sun
    }
}

/// Resource-plan line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Server id; `None` until the item has been created
    #[serde(default)]
    pub id: Option<RecordId>,

    /// Owning estimate or engagement
    #[serde(default)]
    pub plan_id: Option<RecordId>,

    #[serde(default)]
    pub role_id: Option<RecordId>,

    #[serde(default)]
    pub employee_id: Option<RecordId>,

    /// Payable delivery center
    #[serde(default)]
    pub delivery_center_id: Option<RecordId>,

    #[serde(default)]
    pub cost: Decimal,

    #[serde(default)]
    pub rate: Decimal,

    pub currency: CurrencyCode,

    pub start_date: NaiveDate,

    pub end_date: NaiveDate,

    #[serde(default)]
    pub billable: bool,

    #[serde(default)]
    pub billable_expense_percentage: Decimal,

    /// Ordered by week
    #[serde(default)]
    pub weekly_hours: Vec<WeeklyHour>,
}

impl Identifiable for LineItem {
    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

impl Entity for LineItem {
    const TYPE_NAME: &'static str = "LineItem";
}

impl PlanScoped for LineItem {
    fn plan_id(&self) -> Option<&RecordId> {
        self.plan_id.as_ref()
    }
}

impl LineItem {
    /// New, unsaved line item with zero cost and rate
    pub fn new(
        currency: impl Into<CurrencyCode>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            plan_id: None,
            role_id: None,
            employee_id: None,
            delivery_center_id: None,
            cost: Decimal::ZERO,
            rate: Decimal::ZERO,
            currency: currency.into(),
            start_date,
            end_date,
            billable: true,
            billable_expense_percentage: Decimal::ZERO,
            weekly_hours: Vec::new(),
        }
    }

    pub fn with_plan(mut self, plan_id: impl Into<RecordId>) -> Self {
        self.plan_id = Some(plan_id.into());
        self
    }

    pub fn with_role(mut self, role_id: impl Into<RecordId>) -> Self {
        self.role_id = Some(role_id.into());
        self
    }

    pub fn with_employee(mut self, employee_id: impl Into<RecordId>) -> Self {
        self.employee_id = Some(employee_id.into());
        self
    }

    pub fn with_delivery_center(mut self, delivery_center_id: impl Into<RecordId>) -> Self {
        self.delivery_center_id = Some(delivery_center_id.into());
        self
    }

    pub fn with_rates(mut self, cost: Decimal, rate: Decimal) -> Self {
        self.cost = cost;
        self.rate = rate;
        self
    }

    pub fn with_expense_percentage(mut self, percentage: Decimal) -> Self {
        self.billable_expense_percentage = percentage;
        self
    }

    pub fn with_hours(mut self, week_start_date: NaiveDate, hours: Decimal) -> Self {
        self.set_weekly_hour(week_start_date, hours);
        self
    }

    pub fn date_range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    /// Stored hours for the record keyed exactly on `week_start_date`
    pub fn hours_for_week(&self, week_start_date: NaiveDate) -> Option<Decimal> {
        self.weekly_hours
            .iter()
            .find(|w| w.week_start_date == week_start_date)
            .map(|w| w.hours)
    }

    /// Insert or replace the record for a week, keeping records ordered
    pub fn set_weekly_hour(&mut self, week_start_date: NaiveDate, hours: Decimal) {
        if let Some(existing) = self
            .weekly_hours
            .iter_mut()
            .find(|w| w.week_start_date == week_start_date)
        {
            existing.hours = hours;
            return;
        }
        let idx = self
            .weekly_hours
            .partition_point(|w| w.week_start_date < week_start_date);
        self.weekly_hours
            .insert(idx, WeeklyHour::new(week_start_date, hours));
    }

    pub fn remove_weekly_hour(&mut self, week_start_date: NaiveDate) -> Option<WeeklyHour> {
        let idx = self
            .weekly_hours
            .iter()
            .position(|w| w.week_start_date == week_start_date)?;
        Some(self.weekly_hours.remove(idx))
    }

    /// Restore week ordering after records were loaded or replaced wholesale
    pub fn sort_weekly_hours(&mut self) {
        self.weekly_hours.sort_by_key(|w| w.week_start_date);
    }

    pub fn has_role(&self) -> bool {
        self.role_id.is_some()
    }

    pub fn has_employee(&self) -> bool {
        self.employee_id.is_some()
    }
}
