//! History read model over cash record streams.
//!
//! Keeps one denormalized view per record, updated from bus envelopes.
//! Consumers are idempotent: a per-stream cursor drops duplicates, and a
//! sequence gap is surfaced as an error so the caller can rebuild from the
//! store instead of silently serving a stale view.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use cuadre_core::{BusinessDate, RecordId};
use cuadre_drawer::{ClosingSnapshot, DrawerEvent, DrawerStatus, ExpenseLedger, Operator};
use cuadre_events::EventEnvelope;
use cuadre_money::Money;

/// Denormalized view of one cash record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashRecordView {
    pub record_id: RecordId,
    pub date: BusinessDate,
    pub status: DrawerStatus,
    pub opened_by: Operator,
    pub closed_by: Option<Operator>,
    pub initial_balance: Money,
    pub expenses: ExpenseLedger,
    pub notes: Option<String>,
    pub snapshot: Option<ClosingSnapshot>,
}

/// Optional filters for history queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilters {
    pub status: Option<DrawerStatus>,
    pub start_date: Option<BusinessDate>,
    pub end_date: Option<BusinessDate>,
}

impl HistoryFilters {
    fn matches(&self, view: &CashRecordView) -> bool {
        if self.status.is_some_and(|s| s != view.status) {
            return false;
        }
        if self.start_date.is_some_and(|d| view.date < d) {
            return false;
        }
        if self.end_date.is_some_and(|d| view.date > d) {
            return false;
        }
        true
    }
}

#[derive(Debug, Error)]
pub enum HistoryProjectionError {
    #[error("failed to deserialize drawer event: {0}")]
    Deserialize(String),
    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },
    #[error("event for an unknown record (stream starts mid-way)")]
    UnknownRecord,
}

/// In-memory projection of every cash record, keyed by record id.
#[derive(Debug, Default)]
pub struct DrawerHistoryProjection {
    views: RwLock<HashMap<RecordId, CashRecordView>>,
    cursors: RwLock<HashMap<RecordId, u64>>,
}

impl DrawerHistoryProjection {
    pub fn new() -> Self {
        Self::default()
    }

    fn cursor(&self, record_id: RecordId) -> u64 {
        match self.cursors.read() {
            Ok(cursors) => *cursors.get(&record_id).unwrap_or(&0),
            Err(_) => 0,
        }
    }

    fn update_cursor(&self, record_id: RecordId, seq: u64) {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.insert(record_id, seq);
        }
    }

    pub fn get(&self, record_id: RecordId) -> Option<CashRecordView> {
        self.views.read().ok()?.get(&record_id).cloned()
    }

    /// Look up a record by its business date.
    pub fn get_by_date(&self, date: BusinessDate) -> Option<CashRecordView> {
        self.get(RecordId::for_date(date))
    }

    /// Oldest still-open record strictly before `date`, if any. A pending
    /// closure from an earlier day blocks opening a new drawer.
    pub fn open_record_before(&self, date: BusinessDate) -> Option<CashRecordView> {
        let views = self.views.read().ok()?;
        views
            .values()
            .filter(|v| v.status == DrawerStatus::Open && v.date < date)
            .min_by_key(|v| v.date)
            .cloned()
    }

    /// Records matching `filters`, newest date first, with offset pagination.
    pub fn list_history(
        &self,
        filters: &HistoryFilters,
        offset: usize,
        limit: usize,
    ) -> Vec<CashRecordView> {
        let views = match self.views.read() {
            Ok(views) => views,
            Err(_) => return Vec::new(),
        };

        let mut matching: Vec<CashRecordView> = views
            .values()
            .filter(|v| filters.matches(v))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.date.cmp(&a.date));
        matching.into_iter().skip(offset).take(limit).collect()
    }

    /// Apply one bus envelope. Duplicates (already-seen sequence numbers)
    /// are a no-op.
    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), HistoryProjectionError> {
        let record_id = envelope.record_id();
        let seq = envelope.sequence_number();

        let last = self.cursor(record_id);
        if seq == 0 {
            return Err(HistoryProjectionError::NonMonotonicSequence { last, found: seq });
        }
        if seq <= last {
            return Ok(());
        }
        if seq != last + 1 {
            return Err(HistoryProjectionError::NonMonotonicSequence { last, found: seq });
        }

        let event: DrawerEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| HistoryProjectionError::Deserialize(e.to_string()))?;

        self.apply_event(record_id, &event)?;
        self.update_cursor(record_id, seq);
        Ok(())
    }

    fn apply_event(
        &self,
        record_id: RecordId,
        event: &DrawerEvent,
    ) -> Result<(), HistoryProjectionError> {
        let mut views = match self.views.write() {
            Ok(views) => views,
            Err(_) => return Ok(()),
        };

        match event {
            DrawerEvent::DrawerOpened(e) => {
                views.insert(
                    record_id,
                    CashRecordView {
                        record_id,
                        date: e.date,
                        status: DrawerStatus::Open,
                        opened_by: e.opened_by.clone(),
                        closed_by: None,
                        initial_balance: e.initial_balance,
                        expenses: ExpenseLedger::new(),
                        notes: None,
                        snapshot: None,
                    },
                );
            }
            DrawerEvent::ExpenseAdded(e) => {
                let view = views
                    .get_mut(&record_id)
                    .ok_or(HistoryProjectionError::UnknownRecord)?;
                view.expenses.push(e.entry.clone());
            }
            DrawerEvent::ExpenseRemoved(e) => {
                let view = views
                    .get_mut(&record_id)
                    .ok_or(HistoryProjectionError::UnknownRecord)?;
                let _ = view.expenses.remove(e.index);
            }
            DrawerEvent::DrawerClosed(e) => {
                let view = views
                    .get_mut(&record_id)
                    .ok_or(HistoryProjectionError::UnknownRecord)?;
                view.status = DrawerStatus::Closed;
                view.closed_by = Some(e.closed_by.clone());
                view.notes = e.snapshot.notes.clone();
                view.snapshot = Some(e.snapshot.clone());
            }
            DrawerEvent::DrawerReopened(_) => {
                let view = views
                    .get_mut(&record_id)
                    .ok_or(HistoryProjectionError::UnknownRecord)?;
                if let Some(snapshot) = view.snapshot.take() {
                    view.expenses = ExpenseLedger::from_entries(snapshot.expenses_details);
                    view.notes = snapshot.notes;
                }
                view.status = DrawerStatus::Open;
                view.closed_by = None;
            }
        }

        Ok(())
    }

    /// Rebuild the whole projection from the raw store contents (startup
    /// recovery).
    pub fn rebuild(
        &self,
        stored: Vec<crate::store::StoredEvent>,
    ) -> Result<(), HistoryProjectionError> {
        if let (Ok(mut views), Ok(mut cursors)) = (self.views.write(), self.cursors.write()) {
            views.clear();
            cursors.clear();
        }

        let mut sorted = stored;
        sorted.sort_by_key(|e| (*e.record_id.as_uuid(), e.sequence_number));

        for e in sorted {
            self.apply_envelope(&e.to_envelope())?;
        }
        Ok(())
    }
}
