//! Create service for line items

use std::sync::Arc;

use rp_contracts::line_items::CreateLineItemContract;
use rp_contracts::Contract;
use rp_core::types::RecordId;
use rp_models::LineItem;
use tracing::{info, instrument, warn};

use crate::result::ServiceResult;
use crate::store::LineItemStore;

/// Service for creating line items
pub struct CreateLineItemService<S: LineItemStore> {
    store: Arc<S>,
}

impl<S: LineItemStore> CreateLineItemService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Validate and persist a new line item inside `plan_id`
    #[instrument(skip(self, plan_id, item), fields(plan_id = %plan_id))]
    pub async fn call(&self, plan_id: &RecordId, mut item: LineItem) -> ServiceResult<LineItem> {
        if item.plan_id.is_none() {
            item.plan_id = Some(plan_id.clone());
        }

        let contract = CreateLineItemContract::new(plan_id.clone());
        if let Err(errors) = contract.validate(&item) {
            return ServiceResult::failure(errors);
        }

        match self.store.create(item).await {
            Ok(created) => {
                info!(id = ?created.id, role_id = ?created.role_id, "Line item created");
                ServiceResult::success(created)
            }
            Err(err) => {
                warn!(error = %err, "Line item create failed");
                ServiceResult::from_error(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryLineItemStore, MockLineItemStore, StoreError};
    use chrono::NaiveDate;

    fn item() -> LineItem {
        LineItem::new(
            "USD",
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 23).unwrap(),
        )
        .with_role(3)
    }

    #[tokio::test]
    async fn test_create_sets_plan_and_id() {
        let store = Arc::new(MemoryLineItemStore::new());
        let service = CreateLineItemService::new(store.clone());

        let result = service.call(&RecordId::from(4), item()).await;
        assert!(result.is_success());
        let created = result.unwrap();
        assert!(created.id.is_some());
        assert_eq!(created.plan_id, Some(RecordId::from(4)));
        assert_eq!(store.create_count(), 1);
    }

    #[tokio::test]
    async fn test_contract_failure_skips_store() {
        let mut store = MockLineItemStore::new();
        store.expect_create().never();
        let service = CreateLineItemService::new(Arc::new(store));

        let mut li = item();
        li.role_id = None;
        let result = service.call(&RecordId::from(4), li).await;
        assert!(result.is_failure());
        assert!(result.errors().has_error("role"));
    }

    #[tokio::test]
    async fn test_store_failure_is_reported() {
        let mut store = MockLineItemStore::new();
        store
            .expect_create()
            .times(1)
            .returning(|_| Err(StoreError::Unavailable("timeout".into())));
        let service = CreateLineItemService::new(Arc::new(store));

        let result = service.call(&RecordId::from(4), item()).await;
        assert!(result.is_failure());
        assert_eq!(result.error_code(), Some("persistence_failure"));
    }
}
