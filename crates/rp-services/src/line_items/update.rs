//! Update service for line items

use std::sync::Arc;

use rp_contracts::line_items::UpdateLineItemContract;
use rp_contracts::Contract;
use rp_core::error::{RpError, ValidationErrors};
use rp_core::types::RecordId;
use rp_finance::WeeklyHoursLedger;
use rp_models::LineItem;
use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use super::LineItemParams;
use crate::result::ServiceResult;
use crate::store::{LineItemStore, StoreError};

/// Service for updating persisted line items
pub struct UpdateLineItemService<S: LineItemStore> {
    store: Arc<S>,
}

impl<S: LineItemStore> UpdateLineItemService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Apply `params` to the stored line item and persist it.
    ///
    /// Moving or shrinking the date range zeroes the hours of weeks that no
    /// longer overlap it. Non-zero hours for weeks outside the new range are
    /// rejected.
    #[instrument(skip(self, id, params), fields(id = %id))]
    pub async fn call(&self, id: &RecordId, params: &LineItemParams) -> ServiceResult<LineItem> {
        let mut item = match self.store.get(id).await {
            Ok(Some(item)) => item,
            Ok(None) => return ServiceResult::from_error(StoreError::NotFound(id.clone()).into()),
            Err(err) => {
                warn!(error = %err, "Line item load failed");
                return ServiceResult::from_error(err.into());
            }
        };

        let previous_range = item.date_range();
        params.apply_to(&mut item);

        let contract = UpdateLineItemContract::with_changes(id.clone(), params.changed_attributes());
        if let Err(errors) = contract.validate(&item) {
            return ServiceResult::failure(errors);
        }

        let mut ledger = WeeklyHoursLedger::from_records(previous_range, &item.weekly_hours);
        let cleared = ledger.apply_date_range(item.date_range());
        for week in &cleared {
            item.set_weekly_hour(*week, Decimal::ZERO);
        }
        if let Err(errors) = validate_hours(&ledger, params) {
            return ServiceResult::failure(errors);
        }
        if !cleared.is_empty() {
            debug!(weeks = cleared.len(), "Cleared hours outside the new date range");
        }

        match self.store.update(&item).await {
            Ok(updated) => {
                debug!(changed = ?params.changed_attributes(), "Line item updated");
                ServiceResult::success(updated)
            }
            Err(err) => {
                warn!(error = %err, "Line item update failed");
                ServiceResult::from_error(RpError::from(err))
            }
        }
    }
}

/// Every week written by `params` must be editable in the ledger's range.
/// Zeroing a week outside the range is allowed.
fn validate_hours(ledger: &WeeklyHoursLedger, params: &LineItemParams) -> Result<(), ValidationErrors> {
    let mut scratch = ledger.clone();
    let mut errors = ValidationErrors::new();
    for (week, hours) in &params.hours {
        if hours.is_zero() && !scratch.is_editable(*week) {
            continue;
        }
        if let Err(err) = scratch.set_hours(*week, *hours) {
            errors.add("weekly_hours", err.to_string());
        }
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryLineItemStore;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    async fn seeded() -> (Arc<MemoryLineItemStore>, RecordId) {
        let store = Arc::new(MemoryLineItemStore::new());
        let item = LineItem::new("USD", d(10), d(30))
            .with_plan(4)
            .with_role(3)
            .with_hours(d(17), dec!(10))
            .with_hours(d(24), dec!(10));
        let id = store.create(item).await.unwrap().id.unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn test_update_cost() {
        let (store, id) = seeded().await;
        let service = UpdateLineItemService::new(store);

        let result = service
            .call(&id, &LineItemParams::new().with_cost(dec!(55)))
            .await;
        assert_eq!(result.unwrap().cost, dec!(55));
    }

    #[tokio::test]
    async fn test_shrinking_range_zeroes_hours() {
        let (store, id) = seeded().await;
        let service = UpdateLineItemService::new(store.clone());

        let params = LineItemParams::new().with_dates(d(10), d(20));
        let updated = service.call(&id, &params).await.unwrap();

        assert_eq!(updated.hours_for_week(d(24)), Some(Decimal::ZERO));
        assert_eq!(updated.hours_for_week(d(17)), Some(dec!(10)));
        let stored = store.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.hours_for_week(d(24)), Some(Decimal::ZERO));
    }

    #[tokio::test]
    async fn test_rejects_hours_outside_range() {
        let (store, id) = seeded().await;
        let service = UpdateLineItemService::new(store);

        let params = LineItemParams::new().with_hours(d(31), dec!(8));
        let result = service.call(&id, &params).await;
        assert!(result.is_failure());
        assert!(result.errors().has_error("weekly_hours"));
    }

    #[tokio::test]
    async fn test_zeroing_week_left_by_shrink() {
        let (store, id) = seeded().await;
        let service = UpdateLineItemService::new(store);

        let params = LineItemParams::new()
            .with_hours(d(24), dec!(12))
            .with_dates(d(10), d(20));
        assert!(service.call(&id, &params).await.is_failure());

        let params = LineItemParams::new()
            .with_hours(d(24), Decimal::ZERO)
            .with_dates(d(10), d(20));
        let updated = service.call(&id, &params).await.unwrap();
        assert_eq!(updated.end_date, d(20));
        assert_eq!(updated.hours_for_week(d(24)), Some(Decimal::ZERO));
        assert_eq!(updated.hours_for_week(d(17)), Some(dec!(10)));
    }

    #[tokio::test]
    async fn test_negative_cost_rejected() {
        let (store, id) = seeded().await;
        let service = UpdateLineItemService::new(store);

        let result = service
            .call(&id, &LineItemParams::new().with_cost(dec!(-5)))
            .await;
        assert!(result.errors().has_error("cost"));
    }

    #[tokio::test]
    async fn test_missing_item() {
        let store = Arc::new(MemoryLineItemStore::new());
        let service = UpdateLineItemService::new(store);

        let result = service.call(&RecordId::from(99), &LineItemParams::new()).await;
        assert_eq!(result.error_code(), Some("not_found"));
    }
}
