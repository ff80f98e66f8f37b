//! Line item persistence port
//!
//! The backend owns line items and their weekly hours. Everything in this
//! crate talks to it through [`LineItemStore`]; [`MemoryLineItemStore`]
//! stands in for it in tests and in the CLI.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use rp_core::error::RpError;
use rp_core::types::RecordId;
use rp_finance::{auto_fill, AutoFillPattern, WeeklyHoursLedger};
use rp_models::{LineItem, WeeklyHour};
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Store errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("Line item not found: {0}")]
    NotFound(RecordId),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Rejected by store: {0}")]
    Rejected(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for RpError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => RpError::NotFound {
                entity: "LineItem",
                field: "id",
                value: id.to_string(),
            },
            other => RpError::Persistence(other.to_string()),
        }
    }
}

/// Line item store trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LineItemStore: Send + Sync {
    /// Create a line item; the returned item carries the server id
    async fn create(&self, item: LineItem) -> StoreResult<LineItem>;

    async fn get(&self, id: &RecordId) -> StoreResult<Option<LineItem>>;

    /// Replace a persisted line item, returning the stored version
    async fn update(&self, item: &LineItem) -> StoreResult<LineItem>;

    /// Delete a line item together with its weekly hours
    async fn delete(&self, id: &RecordId) -> StoreResult<()>;

    async fn set_weekly_hours(
        &self,
        id: &RecordId,
        week: NaiveDate,
        hours: Decimal,
    ) -> StoreResult<LineItem>;

    /// Regenerate every weekly hours record from a pattern
    async fn auto_fill_hours(
        &self,
        id: &RecordId,
        pattern: &AutoFillPattern,
    ) -> StoreResult<LineItem>;

    async fn list_for_plan(&self, plan_id: &RecordId) -> StoreResult<Vec<LineItem>>;
}

/// In-memory line item store
pub struct MemoryLineItemStore {
    items: RwLock<BTreeMap<RecordId, LineItem>>,
    next_id: AtomicI64,
    offline: AtomicBool,
    creates: AtomicUsize,
}

impl Default for MemoryLineItemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLineItemStore {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            offline: AtomicBool::new(false),
            creates: AtomicUsize::new(0),
        }
    }

    /// While offline every call fails with [`StoreError::Unavailable`]
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of successful creates so far
    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    fn ensure_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("store is offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LineItemStore for MemoryLineItemStore {
    async fn create(&self, mut item: LineItem) -> StoreResult<LineItem> {
        self.ensure_online()?;
        if item.id.is_some() {
            return Err(StoreError::Rejected("line item already has an id".into()));
        }

        let id = RecordId::from(self.next_id.fetch_add(1, Ordering::SeqCst));
        item.id = Some(id.clone());
        item.sort_weekly_hours();

        self.items.write().await.insert(id.clone(), item.clone());
        self.creates.fetch_add(1, Ordering::SeqCst);
        info!(id = %id, "Line item created");

        Ok(item)
    }

    async fn get(&self, id: &RecordId) -> StoreResult<Option<LineItem>> {
        self.ensure_online()?;
        Ok(self.items.read().await.get(id).cloned())
    }

    async fn update(&self, item: &LineItem) -> StoreResult<LineItem> {
        self.ensure_online()?;
        let id = item
            .id
            .clone()
            .ok_or_else(|| StoreError::Rejected("line item has no id".into()))?;

        let mut items = self.items.write().await;
        let stored = items.get_mut(&id).ok_or_else(|| StoreError::NotFound(id.clone()))?;
        *stored = item.clone();
        stored.sort_weekly_hours();
        debug!(id = %id, "Line item updated");

        Ok(stored.clone())
    }

    async fn delete(&self, id: &RecordId) -> StoreResult<()> {
        self.ensure_online()?;
        let removed = self.items.write().await.remove(id);
        match removed {
            Some(item) => {
                info!(id = %id, weeks = item.weekly_hours.len(), "Line item deleted");
                Ok(())
            }
            None => Err(StoreError::NotFound(id.clone())),
        }
    }

    async fn set_weekly_hours(
        &self,
        id: &RecordId,
        week: NaiveDate,
        hours: Decimal,
    ) -> StoreResult<LineItem> {
        self.ensure_online()?;
        let mut items = self.items.write().await;
        let item = items.get_mut(id).ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let mut ledger = WeeklyHoursLedger::from_line_item(item);
        ledger
            .set_hours(week, hours)
            .map_err(|e| StoreError::Rejected(e.to_string()))?;
        item.set_weekly_hour(week, hours);
        debug!(id = %id, %week, %hours, "Weekly hours stored");

        Ok(item.clone())
    }

    async fn auto_fill_hours(
        &self,
        id: &RecordId,
        pattern: &AutoFillPattern,
    ) -> StoreResult<LineItem> {
        self.ensure_online()?;
        let mut items = self.items.write().await;
        let item = items.get_mut(id).ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let filled = auto_fill(pattern, item.date_range())
            .map_err(|e| StoreError::Rejected(e.to_string()))?;
        item.weekly_hours = filled
            .into_iter()
            .map(|(week, hours)| WeeklyHour::new(week, hours))
            .collect();
        info!(id = %id, weeks = item.weekly_hours.len(), "Weekly hours auto-filled");

        Ok(item.clone())
    }

    async fn list_for_plan(&self, plan_id: &RecordId) -> StoreResult<Vec<LineItem>> {
        self.ensure_online()?;
        Ok(self
            .items
            .read()
            .await
            .values()
            .filter(|item| item.plan_id.as_ref() == Some(plan_id))
            .cloned()
            .collect())
    }
}
