//! Reference data contracts
//!
//! Roles must carry at most one rate per delivery center and no negative
//! rates; otherwise rate resolution is ambiguous.

use rp_core::error::ValidationErrors;
use rp_models::Role;
use rust_decimal::Decimal;
use validator::Validate;

use crate::base::{Contract, ValidationResult};

#[derive(Debug, Default, Clone, Copy)]
pub struct RoleContract;

impl RoleContract {
    pub fn new() -> Self {
        Self
    }

    /// Run the derive-based field validations
    fn validate_fields(&self, role: &Role, errors: &mut ValidationErrors) {
        if let Err(field_errors) = role.validate() {
            let mut fields: Vec<_> = field_errors.field_errors().into_iter().collect();
            fields.sort_by_key(|(field, _)| *field);
            for (field, list) in fields {
                for err in list {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("is invalid ({})", err.code));
                    errors.add(field, message);
                }
            }
        }
    }

    fn validate_unique_centers(&self, role: &Role, errors: &mut ValidationErrors) {
        if !role.has_unique_centers() {
            errors.add("rates", "has more than one rate for a delivery center");
        }
    }

    fn validate_rates(&self, role: &Role, errors: &mut ValidationErrors) {
        let negative = role.default_internal_cost_rate < Decimal::ZERO
            || role.default_external_rate < Decimal::ZERO
            || role
                .rates
                .iter()
                .any(|r| r.internal_cost_rate < Decimal::ZERO || r.external_rate < Decimal::ZERO);
        if negative {
            errors.add("rates", "must be greater than or equal to 0");
        }
    }
}

impl Contract<Role> for RoleContract {
    fn validate(&self, entity: &Role) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        self.validate_fields(entity, &mut errors);
        self.validate_unique_centers(entity, &mut errors);
        self.validate_rates(entity, &mut errors);

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rp_models::RoleRate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_valid_role() {
        let role = Role::new(1, "Developer", "USD")
            .with_defaults(dec!(50), dec!(100))
            .with_rate(RoleRate::new(2, dec!(40), dec!(90), "EUR"));
        assert!(RoleContract::new().validate(&role).is_ok());
    }

    #[test]
    fn test_duplicate_center_rates() {
        let mut role = Role::new(1, "Developer", "USD");
        role.rates.push(RoleRate::new(2, dec!(40), dec!(90), "EUR"));
        role.rates.push(RoleRate::new("2", dec!(45), dec!(95), "EUR"));

        let errors = RoleContract::new().validate(&role).unwrap_err();
        assert!(errors.has_error("rates"));
    }

    #[test]
    fn test_blank_name_and_negative_default() {
        let role = Role::new(1, "", "USD").with_defaults(dec!(-1), dec!(100));

        let errors = RoleContract::new().validate(&role).unwrap_err();
        assert!(errors.has_error("name"));
        assert!(errors.has_error("rates"));
    }
}
