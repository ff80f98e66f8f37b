//! Delete service for line items

use std::sync::Arc;

use rp_core::types::RecordId;
use tracing::{info, instrument, warn};

use crate::result::ServiceResult;
use crate::store::LineItemStore;

pub struct DeleteLineItemService<S: LineItemStore> {
    store: Arc<S>,
}

impl<S: LineItemStore> DeleteLineItemService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Delete a line item; its weekly hours go with it
    #[instrument(skip(self, id), fields(id = %id))]
    pub async fn call(&self, id: &RecordId) -> ServiceResult<RecordId> {
        match self.store.delete(id).await {
            Ok(()) => {
                info!("Line item deleted");
                ServiceResult::success(id.clone())
            }
            Err(err) => {
                warn!(error = %err, "Line item delete failed");
                ServiceResult::from_error(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryLineItemStore;
    use chrono::NaiveDate;
    use rp_models::LineItem;

    #[tokio::test]
    async fn test_delete() {
        let store = Arc::new(MemoryLineItemStore::new());
        let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        let id = store
            .create(LineItem::new("USD", d(10), d(23)).with_role(3))
            .await
            .unwrap()
            .id
            .unwrap();

        let service = DeleteLineItemService::new(store.clone());
        assert!(service.call(&id).await.is_success());
        assert!(store.get(&id).await.unwrap().is_none());

        let again = service.call(&id).await;
        assert_eq!(again.error_code(), Some("not_found"));
    }
}
