//! Update contract for line items

use rp_core::error::ValidationErrors;
use rp_core::types::RecordId;
use rp_models::LineItem;

use super::base::LineItemBaseContract;
use super::WRITABLE_ATTRIBUTES;
use crate::base::{ChangeTracker, Contract, ValidationResult};

/// Contract for updating a persisted line item
#[derive(Debug, Clone)]
pub struct UpdateLineItemContract {
    base: LineItemBaseContract,
    line_item_id: RecordId,
    changes: ChangeTracker,
}

impl UpdateLineItemContract {
    pub fn new(line_item_id: impl Into<RecordId>) -> Self {
        Self {
            base: LineItemBaseContract::new(),
            line_item_id: line_item_id.into(),
            changes: ChangeTracker::new(),
        }
    }

    /// Mark an attribute as changed
    pub fn mark_changed(&mut self, attribute: impl Into<String>) {
        self.changes.mark_changed(attribute);
    }

    /// Contract for an update touching exactly `attributes`
    pub fn with_changes<I, S>(line_item_id: impl Into<RecordId>, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            changes: attributes.into_iter().collect(),
            ..Self::new(line_item_id)
        }
    }

    pub fn is_changed(&self, attribute: &str) -> bool {
        self.changes.is_changed(attribute)
    }

    pub fn line_item_id(&self) -> &RecordId {
        &self.line_item_id
    }

    fn validate_identity(&self, entity: &LineItem, errors: &mut ValidationErrors) {
        if entity.id.as_ref() != Some(&self.line_item_id) {
            errors.add("id", "does not match the line item being updated");
        }
    }

    fn validate_changed_attributes_writable(&self, errors: &mut ValidationErrors) {
        for attribute in self.changes.unwritable::<LineItem, _>(self) {
            errors.add(attribute, "is not writable");
        }
    }
}

impl Contract<LineItem> for UpdateLineItemContract {
    fn validate(&self, entity: &LineItem) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        self.validate_identity(entity, &mut errors);
        self.validate_changed_attributes_writable(&mut errors);

        if let Err(base_errors) = self.base.validate(entity) {
            errors.merge(base_errors);
        }

        errors.into_result()
    }

    fn is_writable(&self, attribute: &str) -> bool {
        WRITABLE_ATTRIBUTES.contains(&attribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn persisted() -> LineItem {
        let mut li = LineItem::new(
            "USD",
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 23).unwrap(),
        )
        .with_plan(4)
        .with_role(3);
        li.id = Some(RecordId::from(9));
        li
    }

    #[test]
    fn test_valid_update() {
        let mut contract = UpdateLineItemContract::new(9);
        contract.mark_changed("cost");
        assert!(contract.is_changed("cost"));
        assert!(contract.validate(&persisted()).is_ok());
    }

    #[test]
    fn test_plan_is_not_writable() {
        let mut contract = UpdateLineItemContract::new(9);
        contract.mark_changed("plan_id");

        let errors = contract.validate(&persisted()).unwrap_err();
        assert_eq!(errors.get("plan_id"), Some(&vec!["is not writable".to_string()]));
    }

    #[test]
    fn test_id_mismatch() {
        let contract = UpdateLineItemContract::new(10);
        let errors = contract.validate(&persisted()).unwrap_err();
        assert!(errors.has_error("id"));
    }
}
