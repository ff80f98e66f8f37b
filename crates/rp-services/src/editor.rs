//! Row editor
//!
//! Drives one editable line-item row: keeps its draft, re-derives cost and
//! rate when the role, employee or context changes, creates the line item
//! once the row has a role and dates, and queues every later edit through the
//! debounced [`SaveQueue`].
//!
//! A row creates at most one line item. The server id lands in the draft
//! store right after the create, so a reopened row updates instead.
//!
//! Re-derivation is suppressed while the row's save is in flight and runs
//! again against the server's item once the save settles. When reference
//! data is still loading the trigger is remembered and retried by
//! [`RowEditor::refresh`].

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use rp_core::config::EmployeeCostPolicy;
use rp_core::error::{RpError, ValidationErrors};
use rp_core::types::{parse_amount, CurrencyCode, DateRange, RecordId};
use rp_finance::{reresolve, LedgerError, RateInputs, ResolutionTrigger, WeeklyHoursLedger};
use rp_models::{LineItem, ResourcePlan, WeeklyHour};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::draft_store::{DraftKey, DraftStore, DraftStoreError, RowDraft};
use crate::line_items::{CreateLineItemService, DeleteLineItemService, LineItemParams};
use crate::reference::ReferenceData;
use crate::save_queue::{FlushOutcome, SaveQueue};
use crate::store::LineItemStore;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Drafts(#[from] DraftStoreError),

    #[error(transparent)]
    Input(#[from] RpError),

    #[error("Row has no date range yet")]
    MissingDates,

    #[error("Save failed: {}", .0.full_messages().join(", "))]
    SaveFailed(ValidationErrors),
}

/// Amount fields entered as free text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountField {
    Cost,
    Rate,
    BillableExpensePercentage,
}

impl AmountField {
    pub fn as_str(&self) -> &'static str {
        match self {
            AmountField::Cost => "cost",
            AmountField::Rate => "rate",
            AmountField::BillableExpensePercentage => "billable_expense_percentage",
        }
    }
}

/// Plan-level inputs shared by every row of a plan
#[derive(Debug, Clone, PartialEq)]
pub struct EditorContext {
    pub plan_id: RecordId,
    pub center_id: Option<RecordId>,
    pub currency: CurrencyCode,
    pub policy: EmployeeCostPolicy,
}

impl EditorContext {
    pub fn for_plan(plan: &ResourcePlan, policy: EmployeeCostPolicy) -> Self {
        Self {
            plan_id: plan.id.clone(),
            center_id: plan.invoice_center_id.clone(),
            currency: plan.currency.clone(),
            policy,
        }
    }
}

/// Collaborators shared by every row editor
pub struct EditorServices<S: LineItemStore, D: DraftStore, R: ReferenceData> {
    pub store: Arc<S>,
    pub drafts: Arc<D>,
    pub reference: Arc<R>,
    pub queue: Arc<SaveQueue<S>>,
}

impl<S: LineItemStore, D: DraftStore, R: ReferenceData> Clone for EditorServices<S, D, R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            drafts: self.drafts.clone(),
            reference: self.reference.clone(),
            queue: self.queue.clone(),
        }
    }
}

pub struct RowEditor<S: LineItemStore, D: DraftStore, R: ReferenceData> {
    key: DraftKey,
    context: EditorContext,
    services: EditorServices<S, D, R>,
    draft: RowDraft,
    last_good: RowDraft,
    deferred: Option<ResolutionTrigger>,
}

impl<S: LineItemStore, D: DraftStore, R: ReferenceData> RowEditor<S, D, R> {
    /// Open the row, resuming its stored draft if there is one
    #[instrument(skip(key, context, services), fields(key = %key))]
    pub async fn open(
        key: DraftKey,
        context: EditorContext,
        services: EditorServices<S, D, R>,
    ) -> Result<Self, EditorError> {
        let draft = match services.drafts.get(&key).await? {
            Some(draft) => draft,
            None => RowDraft {
                currency: Some(context.currency.clone()),
                billable: true,
                ..RowDraft::default()
            },
        };

        let last_good = match &draft.server_id {
            Some(id) => match services.store.get(id).await {
                Ok(Some(item)) => RowDraft::from_line_item(&item),
                Ok(None) => draft.clone(),
                Err(err) => {
                    warn!(error = %err, "Could not load saved line item");
                    draft.clone()
                }
            },
            None => draft.clone(),
        };

        debug!(saved = draft.is_saved(), "Row opened");
        Ok(Self {
            key,
            context,
            services,
            draft,
            last_good,
            deferred: None,
        })
    }

    pub fn key(&self) -> &DraftKey {
        &self.key
    }

    pub fn draft(&self) -> &RowDraft {
        &self.draft
    }

    pub fn server_id(&self) -> Option<&RecordId> {
        self.draft.server_id.as_ref()
    }

    /// Trigger waiting for reference data or for a save to settle
    pub fn deferred(&self) -> Option<ResolutionTrigger> {
        self.deferred
    }

    pub fn is_in_flight(&self) -> bool {
        self.server_id()
            .is_some_and(|id| self.services.queue.is_in_flight(id))
    }

    pub fn has_pending_save(&self) -> bool {
        self.server_id()
            .is_some_and(|id| self.services.queue.pending(id).is_some())
    }

    pub async fn select_role(
        &mut self,
        role_id: impl Into<RecordId>,
        now: Instant,
    ) -> Result<(), EditorError> {
        let role_id = role_id.into();
        self.draft.role_id = Some(role_id.clone());
        let mut params = LineItemParams::new().with_role_id(role_id);
        self.rederive(ResolutionTrigger::RoleChanged, &mut params);
        self.commit(params, now).await
    }

    /// Attach an employee, or detach with `None`
    pub async fn select_employee(
        &mut self,
        employee_id: Option<RecordId>,
        now: Instant,
    ) -> Result<(), EditorError> {
        let trigger = match employee_id {
            Some(_) => ResolutionTrigger::EmployeeChanged,
            None => ResolutionTrigger::EmployeeCleared,
        };
        self.draft.employee_id = employee_id.clone();
        let mut params = LineItemParams::new().with_employee_id(employee_id);
        self.rederive(trigger, &mut params);
        self.commit(params, now).await
    }

    /// The plan's invoice center or currency changed
    pub async fn set_context(
        &mut self,
        center_id: Option<RecordId>,
        currency: CurrencyCode,
        now: Instant,
    ) -> Result<(), EditorError> {
        self.context.center_id = center_id;
        self.context.currency = currency.clone();
        self.draft.currency = Some(currency.clone());

        let mut params = LineItemParams {
            currency: Some(currency),
            ..LineItemParams::new()
        };
        self.rederive(ResolutionTrigger::ContextChanged, &mut params);
        self.commit(params, now).await
    }

    /// Change the date range. Returns the weeks whose hours were zeroed.
    pub async fn set_dates(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
        now: Instant,
    ) -> Result<Vec<NaiveDate>, EditorError> {
        let range = DateRange::new(start, end);
        if range.is_empty() {
            let mut errors = ValidationErrors::new();
            errors.add("end_date", "must be on or after the start date");
            return Err(RpError::Validation(errors).into());
        }

        let previous = self.date_range().unwrap_or(range);
        let mut ledger = WeeklyHoursLedger::from_records(previous, &self.weekly_records());
        let cleared = ledger.apply_date_range(range);
        for week in &cleared {
            self.draft.hours.insert(*week, Decimal::ZERO);
        }
        self.draft.start_date = Some(start);
        self.draft.end_date = Some(end);

        // Zeroes replace any queued hours for the cleared weeks.
        let mut params = LineItemParams::new().with_dates(start, end);
        for week in &cleared {
            params = params.with_hours(*week, Decimal::ZERO);
        }
        if !cleared.is_empty() {
            debug!(key = %self.key, weeks = ?cleared, "Hours cleared outside the new range");
        }
        self.commit(params, now).await?;
        Ok(cleared)
    }

    pub async fn set_hours(
        &mut self,
        week: NaiveDate,
        hours: Decimal,
        now: Instant,
    ) -> Result<(), EditorError> {
        let range = self.date_range().ok_or(EditorError::MissingDates)?;
        let mut ledger = WeeklyHoursLedger::from_records(range, &self.weekly_records());
        ledger.set_hours(week, hours)?;

        self.draft.hours.insert(week, hours);
        self.commit(LineItemParams::new().with_hours(week, hours), now)
            .await
    }

    /// Hours typed into a week cell; blank means zero
    pub async fn enter_hours(
        &mut self,
        week: NaiveDate,
        raw: &str,
        now: Instant,
    ) -> Result<(), EditorError> {
        let hours = parse_amount("hours", raw)?;
        self.set_hours(week, hours, now).await
    }

    /// Overwrite cost, rate or expense percentage from user input
    pub async fn set_amount(
        &mut self,
        field: AmountField,
        raw: &str,
        now: Instant,
    ) -> Result<(), EditorError> {
        let value = parse_amount(field.as_str(), raw)?;
        let mut params = LineItemParams::new();
        match field {
            AmountField::Cost => {
                self.draft.cost = value;
                params.cost = Some(value);
            }
            AmountField::Rate => {
                self.draft.rate = value;
                params.rate = Some(value);
            }
            AmountField::BillableExpensePercentage => {
                self.draft.billable_expense_percentage = value;
                params.billable_expense_percentage = Some(value);
            }
        }
        self.commit(params, now).await
    }

    /// Retry a deferred re-derivation. Returns whether it resolved.
    pub async fn refresh(&mut self, now: Instant) -> Result<bool, EditorError> {
        let Some(trigger) = self.deferred.take() else {
            return Ok(false);
        };
        let mut params = LineItemParams::new();
        self.rederive(trigger, &mut params);
        let resolved = self.deferred.is_none();
        if !params.is_empty() {
            self.commit(params, now).await?;
        }
        Ok(resolved)
    }

    /// Flush this row's save if its debounce window has elapsed
    pub async fn tick(&mut self, now: Instant) -> Result<FlushOutcome, EditorError> {
        let due = self
            .server_id()
            .is_some_and(|id| self.services.queue.due(now).contains(id));
        if !due {
            return Ok(FlushOutcome::Idle);
        }
        self.flush(now).await
    }

    /// Send this row's pending save now.
    ///
    /// On failure the fields that were being saved roll back to their last
    /// saved values, unless a newer edit to the same field is still queued.
    /// Failed saves are not retried.
    #[instrument(skip(self, now), fields(key = %self.key))]
    pub async fn flush(&mut self, now: Instant) -> Result<FlushOutcome, EditorError> {
        let Some(id) = self.draft.server_id.clone() else {
            return Ok(FlushOutcome::Idle);
        };

        let sending = self.services.queue.pending(&id);
        let mut result = self.services.queue.flush(&id).await;
        if result.is_failure() {
            let errors = result.errors().clone();
            if let Some(failed) = sending {
                self.rollback(&failed).await?;
            }
            return Err(EditorError::SaveFailed(errors));
        }

        let outcome = result.take_result().unwrap_or(FlushOutcome::Idle);
        if let FlushOutcome::Applied(item) = &outcome {
            self.apply_server_response(item, now).await?;
        }
        Ok(outcome)
    }

    /// Take the server's item as the last-known-good state. The draft follows
    /// it unless newer edits are queued.
    pub async fn apply_server_response(
        &mut self,
        item: &LineItem,
        now: Instant,
    ) -> Result<(), EditorError> {
        self.last_good = RowDraft::from_line_item(item);
        if !self.has_pending_save() {
            self.draft = self.last_good.clone();
        }
        self.save_draft().await?;

        if self.deferred.is_some() && !self.is_in_flight() {
            self.refresh(now).await?;
        }
        Ok(())
    }

    /// Leave the row; its draft stays for the next session
    pub fn abandon(self) {
        if let Some(id) = self.server_id() {
            self.services.queue.cancel(id);
        }
        debug!(key = %self.key, "Row abandoned");
    }

    /// Discard the row's draft and any queued save
    pub async fn clear(self) -> Result<(), EditorError> {
        if let Some(id) = self.server_id() {
            self.services.queue.cancel(id);
        }
        self.services.drafts.clear(&self.key).await?;
        debug!(key = %self.key, "Row cleared");
        Ok(())
    }

    /// Delete the saved line item and discard the row
    pub async fn delete(self) -> Result<(), EditorError> {
        if let Some(id) = self.server_id() {
            self.services.queue.cancel(id);
            let result = DeleteLineItemService::new(self.services.store.clone())
                .call(id)
                .await;
            if result.is_failure() {
                return Err(EditorError::SaveFailed(result.errors().clone()));
            }
        }
        self.services.drafts.clear(&self.key).await?;
        info!(key = %self.key, "Row deleted");
        Ok(())
    }

    fn date_range(&self) -> Option<DateRange> {
        Some(DateRange::new(self.draft.start_date?, self.draft.end_date?))
    }

    fn weekly_records(&self) -> Vec<WeeklyHour> {
        self.draft
            .hours
            .iter()
            .map(|(week, hours)| WeeklyHour::new(*week, *hours))
            .collect()
    }

    fn rederive(&mut self, trigger: ResolutionTrigger, params: &mut LineItemParams) {
        // Two different pending triggers together touch both cost and rate.
        let trigger = match self.deferred.take() {
            Some(previous) if previous != trigger => ResolutionTrigger::ContextChanged,
            _ => trigger,
        };

        if self.is_in_flight() {
            debug!(key = %self.key, ?trigger, "Save in flight, re-derivation suppressed");
            self.deferred = Some(trigger);
            return;
        }

        let Some(role_id) = self.draft.role_id.clone() else {
            return;
        };
        let reference = &self.services.reference;
        let role = reference.role(&role_id);
        let employee = self
            .draft
            .employee_id
            .as_ref()
            .map(|id| reference.employee(id))
            .unwrap_or_default();
        let centers = reference.delivery_centers();
        let currency_rates = reference.currency_rates();

        let inputs = RateInputs {
            role_id: &role_id,
            role: role.as_ref(),
            employee_id: self.draft.employee_id.as_ref(),
            employee: employee.as_ref(),
            context_center_id: self.context.center_id.as_ref(),
            target_currency: &self.context.currency,
            centers: centers.as_ref(),
            currency_rates: &currency_rates,
            policy: self.context.policy,
        };

        match reresolve(trigger, &inputs) {
            Ok(update) => {
                if let Some(cost) = update.cost {
                    self.draft.cost = cost;
                    params.cost = Some(cost);
                }
                if let Some(rate) = update.rate {
                    self.draft.rate = rate;
                    params.rate = Some(rate);
                }
            }
            Err(err) => {
                debug!(key = %self.key, ?trigger, error = %err, "Rate resolution deferred");
                self.deferred = Some(trigger);
            }
        }
    }

    async fn commit(&mut self, params: LineItemParams, now: Instant) -> Result<(), EditorError> {
        self.save_draft().await?;
        match self.draft.server_id.clone() {
            Some(id) => {
                if !params.is_empty() {
                    self.services.queue.enqueue(&id, params, now);
                }
                Ok(())
            }
            None => self.ensure_created().await,
        }
    }

    /// Create the line item once the row has a role and dates
    async fn ensure_created(&mut self) -> Result<(), EditorError> {
        if self.draft.server_id.is_some() || self.draft.role_id.is_none() {
            return Ok(());
        }
        let Some(item) = self.new_line_item() else {
            return Ok(());
        };

        let mut result = CreateLineItemService::new(self.services.store.clone())
            .call(&self.context.plan_id, item)
            .await;
        if result.is_failure() {
            return Err(EditorError::SaveFailed(result.errors().clone()));
        }

        if let Some(created) = result.take_result() {
            self.draft.server_id = created.id.clone();
            self.save_draft().await?;
            self.last_good = RowDraft::from_line_item(&created);
            info!(key = %self.key, id = ?created.id, "Row saved");
        }
        Ok(())
    }

    fn new_line_item(&self) -> Option<LineItem> {
        let draft = &self.draft;
        let currency = draft
            .currency
            .clone()
            .unwrap_or_else(|| self.context.currency.clone());
        let mut item = LineItem::new(currency, draft.start_date?, draft.end_date?);
        item.role_id = draft.role_id.clone();
        item.employee_id = draft.employee_id.clone();
        item.delivery_center_id = draft.delivery_center_id.clone();
        item.cost = draft.cost;
        item.rate = draft.rate;
        item.billable = draft.billable;
        item.billable_expense_percentage = draft.billable_expense_percentage;
        item.weekly_hours = self.weekly_records();
        Some(item)
    }

    async fn rollback(&mut self, failed: &LineItemParams) -> Result<(), EditorError> {
        let newer = self
            .server_id()
            .and_then(|id| self.services.queue.pending(id))
            .map(|pending| pending.changed_attributes())
            .unwrap_or_default();

        let mut restored = Vec::new();
        for attribute in failed.changed_attributes() {
            if !newer.contains(&attribute) {
                restore(&mut self.draft, &self.last_good, attribute);
                restored.push(attribute);
            }
        }
        warn!(key = %self.key, fields = ?restored, "Save failed, rolled back");
        self.save_draft().await
    }

    async fn save_draft(&self) -> Result<(), EditorError> {
        self.services.drafts.set(&self.key, &self.draft).await?;
        Ok(())
    }
}

fn restore(draft: &mut RowDraft, good: &RowDraft, attribute: &str) {
    match attribute {
        "role_id" => draft.role_id = good.role_id.clone(),
        "employee_id" => draft.employee_id = good.employee_id.clone(),
        "delivery_center_id" => draft.delivery_center_id = good.delivery_center_id.clone(),
        "cost" => draft.cost = good.cost,
        "rate" => draft.rate = good.rate,
        "currency" => draft.currency = good.currency.clone(),
        "start_date" => draft.start_date = good.start_date,
        "end_date" => draft.end_date = good.end_date,
        "billable" => draft.billable = good.billable,
        "billable_expense_percentage" => {
            draft.billable_expense_percentage = good.billable_expense_percentage
        }
        "weekly_hours" => draft.hours = good.hours.clone(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft_store::MemoryDraftStore;
    use crate::reference::InMemoryReferenceData;
    use crate::store::MemoryLineItemStore;
    use rp_finance::CurrencyRates;
    use rp_models::{DeliveryCenter, DeliveryCenterDirectory, Employee, PlanKind, Role, RoleRate};
    use rust_decimal_macros::dec;
    use std::time::Duration;

    type Editor = RowEditor<MemoryLineItemStore, MemoryDraftStore, InMemoryReferenceData>;

    const DEBOUNCE: Duration = Duration::from_millis(400);

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn roles() -> Vec<Role> {
        vec![Role::new(3, "Developer", "USD")
            .with_defaults(dec!(45), dec!(90))
            .with_rate(RoleRate::new(1, dec!(50), dec!(100), "USD"))]
    }

    fn employees() -> Vec<Employee> {
        vec![Employee::new(5, "Ada", "USD")
            .with_home_center("NYC")
            .with_rates(dec!(40), dec!(60), dec!(120))]
    }

    fn centers() -> DeliveryCenterDirectory {
        DeliveryCenterDirectory::new(vec![
            DeliveryCenter::new(1, "NYC", "New York", "USD"),
            DeliveryCenter::new(2, "LON", "London", "GBP"),
        ])
    }

    fn services(reference: InMemoryReferenceData) -> EditorServices<MemoryLineItemStore, MemoryDraftStore, InMemoryReferenceData> {
        let store = Arc::new(MemoryLineItemStore::new());
        EditorServices {
            queue: Arc::new(SaveQueue::new(store.clone(), DEBOUNCE)),
            store,
            drafts: Arc::new(MemoryDraftStore::new()),
            reference: Arc::new(reference),
        }
    }

    fn loaded() -> InMemoryReferenceData {
        InMemoryReferenceData::with_data(CurrencyRates::default(), roles(), employees(), centers())
    }

    fn context() -> EditorContext {
        let plan = ResourcePlan::new(4, PlanKind::Estimate, "Build", "USD").with_invoice_center(1);
        EditorContext::for_plan(&plan, EmployeeCostPolicy::default())
    }

    async fn saved_row(
        services: EditorServices<MemoryLineItemStore, MemoryDraftStore, InMemoryReferenceData>,
        now: Instant,
    ) -> Editor {
        let mut editor = Editor::open(DraftKey::new(4, 0), context(), services)
            .await
            .unwrap();
        editor.set_dates(d(10), d(23), now).await.unwrap();
        editor.select_role(3, now).await.unwrap();
        editor
    }

    #[tokio::test]
    async fn test_role_selection_resolves_and_creates() {
        let services = services(loaded());
        let editor = saved_row(services.clone(), Instant::now()).await;

        assert_eq!(editor.draft().cost, dec!(50));
        assert_eq!(editor.draft().rate, dec!(100));
        let id = editor.server_id().unwrap().clone();
        let stored = services.store.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.rate, dec!(100));

        let draft = services.drafts.get(&DraftKey::new(4, 0)).await.unwrap().unwrap();
        assert_eq!(draft.server_id, Some(id));
    }

    #[tokio::test]
    async fn test_reopened_row_never_creates_twice() {
        let services = services(loaded());
        let now = Instant::now();
        saved_row(services.clone(), now).await.abandon();

        let mut reopened = Editor::open(DraftKey::new(4, 0), context(), services.clone())
            .await
            .unwrap();
        reopened.select_role(3, now).await.unwrap();
        reopened.set_amount(AmountField::Rate, "110", now).await.unwrap();

        assert_eq!(services.store.create_count(), 1);
        assert!(reopened.has_pending_save());
    }

    #[tokio::test]
    async fn test_employee_switches_cost_only() {
        let services = services(loaded());
        let now = Instant::now();
        let mut editor = saved_row(services, now).await;

        editor.select_employee(Some(RecordId::from(5)), now).await.unwrap();
        assert_eq!(editor.draft().cost, dec!(40));
        assert_eq!(editor.draft().rate, dec!(100));

        editor.select_employee(None, now).await.unwrap();
        assert_eq!(editor.draft().cost, dec!(50));
    }

    #[tokio::test]
    async fn test_loading_reference_data_defers() {
        let services = services(InMemoryReferenceData::default());
        let now = Instant::now();
        let mut editor = saved_row(services.clone(), now).await;

        assert_eq!(editor.draft().cost, Decimal::ZERO);
        assert_eq!(editor.deferred(), Some(ResolutionTrigger::RoleChanged));

        services.reference.load_roles(roles());
        services.reference.load_delivery_centers(centers());
        assert!(editor.refresh(now).await.unwrap());
        assert_eq!(editor.draft().rate, dec!(100));
        assert!(editor.deferred().is_none());
        assert!(editor.has_pending_save());
    }

    #[tokio::test]
    async fn test_tick_flushes_after_debounce() {
        let services = services(loaded());
        let now = Instant::now();
        let mut editor = saved_row(services.clone(), now).await;

        editor.set_amount(AmountField::Cost, "55", now).await.unwrap();
        editor.set_amount(AmountField::Cost, "57.5", now).await.unwrap();
        assert_eq!(editor.tick(now).await.unwrap(), FlushOutcome::Idle);

        let outcome = editor.tick(now + DEBOUNCE).await.unwrap();
        assert!(matches!(outcome, FlushOutcome::Applied(_)));
        let stored = services
            .store
            .get(editor.server_id().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.cost, dec!(57.5));
    }

    #[tokio::test]
    async fn test_failed_save_rolls_back() {
        let services = services(loaded());
        let now = Instant::now();
        let mut editor = saved_row(services.clone(), now).await;

        editor.set_amount(AmountField::Cost, "75", now).await.unwrap();
        services.store.set_offline(true);

        let err = editor.flush(now).await.unwrap_err();
        assert!(matches!(err, EditorError::SaveFailed(_)));
        assert_eq!(editor.draft().cost, dec!(50));
        assert!(!editor.has_pending_save());

        let draft = services.drafts.get(editor.key()).await.unwrap().unwrap();
        assert_eq!(draft.cost, dec!(50));
    }

    #[tokio::test]
    async fn test_invalid_amount_rejected() {
        let services = services(loaded());
        let now = Instant::now();
        let mut editor = saved_row(services, now).await;

        let err = editor
            .set_amount(AmountField::Cost, "-3", now)
            .await
            .unwrap_err();
        assert!(matches!(err, EditorError::Input(RpError::InvalidNumericInput { .. })));
        assert_eq!(editor.draft().cost, dec!(50));
    }

    #[tokio::test]
    async fn test_hours_outside_range_rejected() {
        let services = services(loaded());
        let now = Instant::now();
        let mut editor = saved_row(services, now).await;

        editor.enter_hours(d(17), "8", now).await.unwrap();
        let err = editor.set_hours(d(31), dec!(8), now).await.unwrap_err();
        assert!(matches!(
            err,
            EditorError::Ledger(LedgerError::WeekOutOfRange { .. })
        ));
    }

    #[tokio::test]
    async fn test_shrinking_dates_clears_hours() {
        let services = services(loaded());
        let now = Instant::now();
        let mut editor = saved_row(services, now).await;

        editor.set_hours(d(10), dec!(8), now).await.unwrap();
        editor.set_hours(d(17), dec!(6), now).await.unwrap();
        let cleared = editor.set_dates(d(10), d(16), now).await.unwrap();

        assert_eq!(cleared, vec![d(17)]);
        assert_eq!(editor.draft().hours.get(&d(17)), Some(&Decimal::ZERO));
        assert_eq!(editor.draft().hours.get(&d(10)), Some(&dec!(8)));
    }

    #[tokio::test]
    async fn test_shrink_after_queued_hours_saves_both() {
        let services = services(loaded());
        let now = Instant::now();
        let mut editor = saved_row(services.clone(), now).await;
        editor.set_dates(d(10), d(30), now).await.unwrap();
        editor.flush(now).await.unwrap();

        editor.set_hours(d(17), dec!(6), now).await.unwrap();
        editor.set_hours(d(24), dec!(10), now).await.unwrap();
        let cleared = editor.set_dates(d(10), d(20), now).await.unwrap();
        assert_eq!(cleared, vec![d(24)]);
        assert_eq!(
            editor.services.queue.pending(editor.server_id().unwrap()).unwrap().hours.get(&d(24)),
            Some(&Decimal::ZERO)
        );

        let outcome = editor.flush(now).await.unwrap();
        assert!(matches!(outcome, FlushOutcome::Applied(_)));
        assert_eq!(editor.draft().end_date, Some(d(20)));
        assert_eq!(
            editor.draft().hours.get(&d(24)).copied().unwrap_or_default(),
            Decimal::ZERO
        );

        let stored = services
            .store
            .get(editor.server_id().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.end_date, d(20));
        assert_eq!(stored.hours_for_week(d(17)), Some(dec!(6)));
        assert_eq!(stored.hours_for_week(d(24)).unwrap_or_default(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_hours_need_dates() {
        let services = services(loaded());
        let mut editor = Editor::open(DraftKey::new(4, 1), context(), services)
            .await
            .unwrap();
        let err = editor
            .set_hours(d(10), dec!(8), Instant::now())
            .await
            .unwrap_err();
        assert!(matches!(err, EditorError::MissingDates));
    }

    #[tokio::test]
    async fn test_delete_removes_item_and_draft() {
        let services = services(loaded());
        let editor = saved_row(services.clone(), Instant::now()).await;
        let id = editor.server_id().unwrap().clone();

        editor.delete().await.unwrap();
        assert!(services.store.get(&id).await.unwrap().is_none());
        assert!(services.drafts.get(&DraftKey::new(4, 0)).await.unwrap().is_none());
    }
}
