//! Debounced save queue
//!
//! Each line item owns at most one pending write. Edits arriving within the
//! debounce window merge into that write and push its deadline back. Time is
//! passed in by the caller; the queue never sleeps.
//!
//! Every enqueue takes a fresh generation number. When a write comes back
//! and the item's generation has moved on (a newer edit was enqueued, or the
//! row was cancelled), the response is reported as
//! [`FlushOutcome::Superseded`] and must not be applied over local state.
//!
//! Writes for one item never overlap. A flush that starts while another
//! write for the same item is in flight waits for it, then sends whatever is
//! pending at that point on top of the stored result.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::Mutex as WriteLock;
use rp_core::config::AutosaveConfig;
use rp_core::types::RecordId;
use rp_models::LineItem;
use tracing::{debug, instrument, warn};

use crate::line_items::{LineItemParams, UpdateLineItemService};
use crate::result::ServiceResult;
use crate::store::LineItemStore;

/// Result of flushing one line item
#[derive(Debug, Clone, PartialEq)]
pub enum FlushOutcome {
    /// The write succeeded and is the latest; the stored item is authoritative
    Applied(LineItem),
    /// The write succeeded but newer edits exist; ignore the response
    Superseded,
    /// Nothing was pending
    Idle,
}

#[derive(Debug)]
struct Slot {
    pending: Option<LineItemParams>,
    deadline: Option<Instant>,
    generation: u64,
    in_flight: usize,
}

impl Slot {
    fn is_settled(&self) -> bool {
        self.pending.is_none() && self.in_flight == 0
    }
}

pub struct SaveQueue<S: LineItemStore> {
    updates: UpdateLineItemService<S>,
    debounce: Duration,
    slots: Mutex<HashMap<RecordId, Slot>>,
    writers: Mutex<HashMap<RecordId, Arc<WriteLock<()>>>>,
    generations: AtomicU64,
}

impl<S: LineItemStore> SaveQueue<S> {
    pub fn new(store: Arc<S>, debounce: Duration) -> Self {
        Self {
            updates: UpdateLineItemService::new(store),
            debounce,
            slots: Mutex::new(HashMap::new()),
            writers: Mutex::new(HashMap::new()),
            generations: AtomicU64::new(0),
        }
    }

    pub fn from_config(store: Arc<S>, config: &AutosaveConfig) -> Self {
        Self::new(store, Duration::from_millis(config.debounce_ms))
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Merge `params` into the item's pending write and restart its
    /// debounce window. Returns the new generation.
    pub fn enqueue(&self, id: &RecordId, params: LineItemParams, now: Instant) -> u64 {
        let generation = self.next_generation();
        let mut slots = self.slots.lock();
        let slot = slots.entry(id.clone()).or_insert_with(|| Slot {
            pending: None,
            deadline: None,
            generation,
            in_flight: 0,
        });

        match slot.pending.as_mut() {
            Some(pending) => pending.merge(params),
            None => slot.pending = Some(params),
        }
        slot.deadline = Some(now + self.debounce);
        slot.generation = generation;
        debug!(id = %id, generation, "Edit queued");
        generation
    }

    /// Items whose debounce window has elapsed, ordered by id
    pub fn due(&self, now: Instant) -> Vec<RecordId> {
        let slots = self.slots.lock();
        let mut due: Vec<RecordId> = slots
            .iter()
            .filter(|(_, slot)| slot.pending.is_some())
            .filter(|(_, slot)| slot.deadline.is_some_and(|deadline| deadline <= now))
            .map(|(id, _)| id.clone())
            .collect();
        due.sort();
        due
    }

    pub fn pending(&self, id: &RecordId) -> Option<LineItemParams> {
        self.slots.lock().get(id).and_then(|slot| slot.pending.clone())
    }

    pub fn deadline(&self, id: &RecordId) -> Option<Instant> {
        self.slots.lock().get(id).and_then(|slot| slot.deadline)
    }

    pub fn generation(&self, id: &RecordId) -> Option<u64> {
        self.slots.lock().get(id).map(|slot| slot.generation)
    }

    /// Whether a write for the item is outstanding
    pub fn is_in_flight(&self, id: &RecordId) -> bool {
        self.slots
            .lock()
            .get(id)
            .is_some_and(|slot| slot.in_flight > 0)
    }

    /// Drop the item's pending write. A write already in flight will come
    /// back as superseded.
    pub fn cancel(&self, id: &RecordId) -> Option<LineItemParams> {
        let generation = self.next_generation();
        let mut slots = self.slots.lock();
        let slot = slots.get_mut(id)?;
        let dropped = slot.pending.take();
        slot.deadline = None;
        slot.generation = generation;
        if slot.is_settled() {
            slots.remove(id);
        }
        if dropped.is_some() {
            debug!(id = %id, "Pending edit cancelled");
        }
        dropped
    }

    pub fn cancel_all(&self) {
        let ids: Vec<RecordId> = self.slots.lock().keys().cloned().collect();
        for id in ids {
            self.cancel(&id);
        }
    }

    fn writer(&self, id: &RecordId) -> Arc<WriteLock<()>> {
        self.writers.lock().entry(id.clone()).or_default().clone()
    }

    fn release_writer(&self, id: &RecordId, writer: Arc<WriteLock<()>>) {
        let mut writers = self.writers.lock();
        // Ours plus the map's: nobody else is waiting.
        if Arc::strong_count(&writer) == 2 {
            writers.remove(id);
        }
    }

    /// Send the item's pending write now, regardless of its deadline.
    /// Waits for a write of the same item that is already in flight.
    #[instrument(skip(self, id), fields(id = %id))]
    pub async fn flush(&self, id: &RecordId) -> ServiceResult<FlushOutcome> {
        let writer = self.writer(id);
        let result = {
            let _write = writer.lock().await;
            self.write(id).await
        };
        self.release_writer(id, writer);
        result
    }

    async fn write(&self, id: &RecordId) -> ServiceResult<FlushOutcome> {
        let (params, generation) = {
            let mut slots = self.slots.lock();
            let Some(slot) = slots.get_mut(id) else {
                return ServiceResult::success(FlushOutcome::Idle);
            };
            let Some(params) = slot.pending.take() else {
                return ServiceResult::success(FlushOutcome::Idle);
            };
            slot.deadline = None;
            slot.in_flight += 1;
            (params, slot.generation)
        };

        let result = self.updates.call(id, &params).await;

        let latest = {
            let mut slots = self.slots.lock();
            match slots.get_mut(id) {
                Some(slot) => {
                    slot.in_flight = slot.in_flight.saturating_sub(1);
                    let latest = slot.generation;
                    if slot.is_settled() {
                        slots.remove(id);
                    }
                    latest
                }
                None => generation.wrapping_add(1),
            }
        };

        if result.is_failure() {
            warn!(errors = ?result.full_messages(), "Save failed");
            return result.map(FlushOutcome::Applied);
        }
        if latest != generation {
            debug!(generation, latest, "Save response superseded");
            return ServiceResult::success(FlushOutcome::Superseded);
        }
        result.map(FlushOutcome::Applied)
    }

    /// Flush every item whose debounce window has elapsed
    pub async fn flush_due(&self, now: Instant) -> Vec<(RecordId, ServiceResult<FlushOutcome>)> {
        let mut results = Vec::new();
        for id in self.due(now) {
            let result = self.flush(&id).await;
            results.push((id, result));
        }
        results
    }
}
