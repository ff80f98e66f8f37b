//! Base contract for line items

use std::sync::LazyLock;

use regex::Regex;
use rp_core::error::ValidationErrors;
use rp_core::types::{CurrencyCode, MAX_AMOUNT};
use rp_models::{LineItem, WeeklyHour};
use rust_decimal::Decimal;

use crate::base::{Contract, ValidationResult};

static CURRENCY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{3}$").unwrap());

/// Base contract for line items with common validations
#[derive(Debug, Default, Clone, Copy)]
pub struct LineItemBaseContract;

impl LineItemBaseContract {
    pub fn new() -> Self {
        Self
    }

    /// Validate a role is selected
    pub fn validate_role(&self, item: &LineItem, errors: &mut ValidationErrors) {
        match &item.role_id {
            None => errors.add("role", "can't be blank"),
            Some(id) if id.as_str().trim().is_empty() => errors.add("role", "can't be blank"),
            Some(_) => {}
        }
    }

    /// Validate a monetary amount is neither negative nor oversized
    pub fn validate_amount(&self, field: &str, value: Decimal, errors: &mut ValidationErrors) {
        if value.is_sign_negative() && !value.is_zero() {
            errors.add(field, "must be greater than or equal to 0");
        } else if value > MAX_AMOUNT {
            errors.add(field, format!("must be less than or equal to {}", MAX_AMOUNT));
        }
    }

    /// Validate billable expense percentage is between 0 and 100
    pub fn validate_expense_percentage(&self, value: Decimal, errors: &mut ValidationErrors) {
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            errors.add("billable_expense_percentage", "must be between 0 and 100");
        }
    }

    /// Validate end date is not before start date
    pub fn validate_date_range(&self, item: &LineItem, errors: &mut ValidationErrors) {
        if item.date_range().is_empty() {
            errors.add("end_date", "must be on or after the start date");
        }
    }

    /// Validate the currency looks like an ISO-4217 code
    pub fn validate_currency(&self, currency: &CurrencyCode, errors: &mut ValidationErrors) {
        if !CURRENCY_PATTERN.is_match(currency.as_str()) {
            errors.add("currency", "is not a valid currency code");
        }
    }

    pub fn validate_weekly_hours(&self, weekly_hours: &[WeeklyHour], errors: &mut ValidationErrors) {
        if weekly_hours
            .iter()
            .any(|w| w.hours.is_sign_negative() && !w.hours.is_zero())
        {
            errors.add("weekly_hours", "must be greater than or equal to 0");
        }
        if weekly_hours.iter().any(|w| w.hours > MAX_AMOUNT) {
            errors.add(
                "weekly_hours",
                format!("must be less than or equal to {}", MAX_AMOUNT),
            );
        }
    }
}

impl Contract<LineItem> for LineItemBaseContract {
    fn validate(&self, entity: &LineItem) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        self.validate_role(entity, &mut errors);
        self.validate_amount("cost", entity.cost, &mut errors);
        self.validate_amount("rate", entity.rate, &mut errors);
        self.validate_expense_percentage(entity.billable_expense_percentage, &mut errors);
        self.validate_date_range(entity, &mut errors);
        self.validate_currency(&entity.currency, &mut errors);
        self.validate_weekly_hours(&entity.weekly_hours, &mut errors);

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn item() -> LineItem {
        LineItem::new(
            "USD",
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 23).unwrap(),
        )
        .with_role(3)
        .with_rates(dec!(50), dec!(100))
    }

    #[test]
    fn test_valid_line_item() {
        assert!(LineItemBaseContract::new().validate(&item()).is_ok());
    }

    #[test]
    fn test_missing_role() {
        let mut li = item();
        li.role_id = None;

        let errors = LineItemBaseContract::new().validate(&li).unwrap_err();
        assert!(errors.has_error("role"));
    }

    #[test]
    fn test_negative_amounts() {
        let li = item()
            .with_rates(dec!(-1), dec!(100))
            .with_hours(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(), dec!(-4));

        let errors = LineItemBaseContract::new().validate(&li).unwrap_err();
        assert!(errors.has_error("cost"));
        assert!(!errors.has_error("rate"));
        assert!(errors.has_error("weekly_hours"));
    }

    #[test]
    fn test_oversized_amounts() {
        let li = item()
            .with_rates(dec!(50), dec!(10000000000))
            .with_hours(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(), dec!(100000000000000000000));

        let errors = LineItemBaseContract::new().validate(&li).unwrap_err();
        assert!(!errors.has_error("cost"));
        assert!(errors.has_error("rate"));
        assert!(errors.has_error("weekly_hours"));
    }

    #[test]
    fn test_expense_percentage_bounds() {
        let contract = LineItemBaseContract::new();
        assert!(contract
            .validate(&item().with_expense_percentage(dec!(100)))
            .is_ok());

        let errors = contract
            .validate(&item().with_expense_percentage(dec!(100.5)))
            .unwrap_err();
        assert!(errors.has_error("billable_expense_percentage"));
    }

    #[test]
    fn test_inverted_dates_and_bad_currency() {
        let mut li = item();
        li.end_date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        li.currency = CurrencyCode::new("dollars");

        let errors = LineItemBaseContract::new().validate(&li).unwrap_err();
        assert!(errors.has_error("end_date"));
        assert!(errors.has_error("currency"));
    }
}
