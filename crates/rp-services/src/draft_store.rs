//! Row draft persistence
//!
//! A draft is the unsaved state of one editable row, keyed by the parent
//! plan and the row's position. Drafts outlive the editing session so a
//! reload can pick up where the user left off. The server id is written to
//! the draft as soon as a create succeeds, so a reloaded row never creates a
//! second line item.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use rp_core::config::AutosaveConfig;
use rp_core::types::{CurrencyCode, RecordId};
use rp_finance::WeeklyHoursLedger;
use rp_models::LineItem;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum DraftStoreError {
    #[error("Draft store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Draft store is corrupt: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type DraftResult<T> = Result<T, DraftStoreError>;

/// Identifies one editable row
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DraftKey {
    pub parent_id: RecordId,
    pub row_index: usize,
}

impl DraftKey {
    pub fn new(parent_id: impl Into<RecordId>, row_index: usize) -> Self {
        Self {
            parent_id: parent_id.into(),
            row_index,
        }
    }
}

impl fmt::Display for DraftKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.parent_id, self.row_index)
    }
}

/// Unsaved row state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RowDraft {
    pub server_id: Option<RecordId>,
    pub role_id: Option<RecordId>,
    pub employee_id: Option<RecordId>,
    pub delivery_center_id: Option<RecordId>,
    pub cost: Decimal,
    pub rate: Decimal,
    pub currency: Option<CurrencyCode>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub billable: bool,
    pub billable_expense_percentage: Decimal,
    pub hours: BTreeMap<NaiveDate, Decimal>,
}

impl RowDraft {
    /// Draft mirroring a stored line item. Legacy week keys are folded onto
    /// their Sunday.
    pub fn from_line_item(item: &LineItem) -> Self {
        Self {
            server_id: item.id.clone(),
            role_id: item.role_id.clone(),
            employee_id: item.employee_id.clone(),
            delivery_center_id: item.delivery_center_id.clone(),
            cost: item.cost,
            rate: item.rate,
            currency: Some(item.currency.clone()),
            start_date: Some(item.start_date),
            end_date: Some(item.end_date),
            billable: item.billable,
            billable_expense_percentage: item.billable_expense_percentage,
            hours: WeeklyHoursLedger::from_line_item(item).iter().collect(),
        }
    }

    pub fn is_saved(&self) -> bool {
        self.server_id.is_some()
    }
}

#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn get(&self, key: &DraftKey) -> DraftResult<Option<RowDraft>>;

    async fn set(&self, key: &DraftKey, draft: &RowDraft) -> DraftResult<()>;

    async fn clear(&self, key: &DraftKey) -> DraftResult<()>;
}

#[derive(Default)]
pub struct MemoryDraftStore {
    drafts: RwLock<HashMap<DraftKey, RowDraft>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DraftStore for MemoryDraftStore {
    async fn get(&self, key: &DraftKey) -> DraftResult<Option<RowDraft>> {
        Ok(self.drafts.read().await.get(key).cloned())
    }

    async fn set(&self, key: &DraftKey, draft: &RowDraft) -> DraftResult<()> {
        self.drafts.write().await.insert(key.clone(), draft.clone());
        Ok(())
    }

    async fn clear(&self, key: &DraftKey) -> DraftResult<()> {
        self.drafts.write().await.remove(key);
        Ok(())
    }
}

/// Drafts kept in a single JSON file, rewritten on every change
pub struct JsonFileDraftStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileDraftStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// File-backed store at the configured path, if one is set
    pub fn from_config(config: &AutosaveConfig) -> Option<Self> {
        config.draft_store_path.as_ref().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> DraftResult<BTreeMap<String, RowDraft>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    async fn write_all(&self, drafts: &BTreeMap<String, RowDraft>) -> DraftResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(drafts)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl DraftStore for JsonFileDraftStore {
    async fn get(&self, key: &DraftKey) -> DraftResult<Option<RowDraft>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(&key.to_string()))
    }

    #[instrument(skip(self, key, draft), fields(key = %key))]
    async fn set(&self, key: &DraftKey, draft: &RowDraft) -> DraftResult<()> {
        let _guard = self.lock.lock().await;
        let mut drafts = self.read_all().await?;
        drafts.insert(key.to_string(), draft.clone());
        self.write_all(&drafts).await?;
        debug!("Draft saved");
        Ok(())
    }

    #[instrument(skip(self, key), fields(key = %key))]
    async fn clear(&self, key: &DraftKey) -> DraftResult<()> {
        let _guard = self.lock.lock().await;
        let mut drafts = self.read_all().await?;
        if drafts.remove(&key.to_string()).is_some() {
            self.write_all(&drafts).await?;
            debug!("Draft cleared");
        }
        Ok(())
    }
}
