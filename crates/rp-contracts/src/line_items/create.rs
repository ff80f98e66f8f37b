//! Create contract for line items

use rp_core::error::ValidationErrors;
use rp_core::traits::Identifiable;
use rp_core::types::RecordId;
use rp_models::LineItem;

use super::base::LineItemBaseContract;
use crate::base::{Contract, ValidationResult};

/// Contract for creating a line item inside an estimate or engagement
#[derive(Debug, Clone)]
pub struct CreateLineItemContract {
    base: LineItemBaseContract,
    plan_id: RecordId,
}

impl CreateLineItemContract {
    pub fn new(plan_id: impl Into<RecordId>) -> Self {
        Self {
            base: LineItemBaseContract::new(),
            plan_id: plan_id.into(),
        }
    }

    pub fn plan_id(&self) -> &RecordId {
        &self.plan_id
    }

    fn validate_new_record(&self, entity: &LineItem, errors: &mut ValidationErrors) {
        if entity.is_persisted() {
            errors.add_base("line item has already been created");
        }
    }

    fn validate_plan(&self, entity: &LineItem, errors: &mut ValidationErrors) {
        match &entity.plan_id {
            Some(id) if *id == self.plan_id => {}
            Some(_) => errors.add("plan", "does not match the target estimate"),
            None => errors.add("plan", "can't be blank"),
        }
    }
}

impl Contract<LineItem> for CreateLineItemContract {
    fn validate(&self, entity: &LineItem) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        self.validate_new_record(entity, &mut errors);
        self.validate_plan(entity, &mut errors);

        if let Err(base_errors) = self.base.validate(entity) {
            errors.merge(base_errors);
        }

        errors.into_result()
    }
}
