//! Infrastructure wiring and application operations.
//!
//! `AppServices` composes the event store, bus, dispatcher, history
//! projection, billing provider, and store settings, and exposes one method
//! per operation. Handlers stay thin; everything here is synchronous and
//! fully testable without HTTP.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value as JsonValue;

use cuadre_core::{BusinessDate, RecordId};
use cuadre_drawer::{
    AddExpense, CashDrawer, CloseDrawer, ClosingSnapshot, DrawerCommand, DrawerStatus,
    ExpenseDraft, ExpenseLedger, LiveTotals, OpenDrawer, Operator, RemoveExpense, ReopenDrawer,
};
use cuadre_events::{EventEnvelope, InMemoryEventBus};
use cuadre_infra::{
    CashRecordView, CommandDispatcher, DispatchError, DrawerHistoryProjection, HistoryFilters,
    InMemoryDrawerStore, StoredEvent,
};
use cuadre_money::Money;
use cuadre_sales::{
    aggregate_sales_for_date, DailySalesAggregate, SalesFetchError, SalesProvider,
};

use crate::config::StoreSettings;
use crate::context::CallerContext;

type DrawerDispatcher =
    CommandDispatcher<Arc<InMemoryDrawerStore>, Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>>;

#[derive(Debug)]
pub enum ServiceError {
    Dispatch(DispatchError),
    /// Billing fetch failed where the operation cannot proceed without it.
    SalesUnavailable(SalesFetchError),
    /// Caller's role does not allow the operation.
    Forbidden(String),
    /// Operation clashes with existing state outside the target stream.
    Conflict(String),
    NotFound,
}

impl From<DispatchError> for ServiceError {
    fn from(value: DispatchError) -> Self {
        match value {
            DispatchError::NotFound => ServiceError::NotFound,
            other => ServiceError::Dispatch(other),
        }
    }
}

/// The state of today's record as returned to clients.
///
/// While the record is open, `sales` and `live` carry figures recomputed on
/// this read; once closed, `snapshot` carries the frozen closure and the
/// live fields are absent.
#[derive(Debug, Clone)]
pub struct TodayStatus {
    pub record_id: RecordId,
    pub date: BusinessDate,
    pub status: DrawerStatus,
    pub opened_by: Option<Operator>,
    pub closed_by: Option<Operator>,
    pub initial_balance: Money,
    pub expenses: ExpenseLedger,
    /// Closing notes; after a reopen, the prior closure's notes as a draft.
    pub notes: Option<String>,
    pub sales: Option<DailySalesAggregate>,
    pub live: Option<LiveTotals>,
    pub snapshot: Option<ClosingSnapshot>,
    /// Present when billing was unreachable and zeroed figures are shown.
    pub sales_warning: Option<String>,
}

pub struct AppServices {
    dispatcher: DrawerDispatcher,
    projection: Arc<DrawerHistoryProjection>,
    sales: Arc<dyn SalesProvider>,
    settings: StoreSettings,
}

impl AppServices {
    pub fn new(
        store: Arc<InMemoryDrawerStore>,
        bus: Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>,
        projection: Arc<DrawerHistoryProjection>,
        sales: Arc<dyn SalesProvider>,
        settings: StoreSettings,
    ) -> Self {
        Self {
            dispatcher: CommandDispatcher::new(store, bus),
            projection,
            sales,
            settings,
        }
    }

    pub fn today(&self) -> BusinessDate {
        BusinessDate::today()
    }

    fn operator_of(ctx: &CallerContext) -> Operator {
        Operator {
            user_id: ctx.user_id(),
            username: ctx.username().to_string(),
        }
    }

    /// Dispatch a command against the record for `date`, then fold the
    /// committed events into the history projection. The projection is
    /// idempotent, so the background bus subscriber seeing the same
    /// envelopes again is harmless.
    fn dispatch_drawer(
        &self,
        date: BusinessDate,
        command: DrawerCommand,
    ) -> Result<Vec<StoredEvent>, ServiceError> {
        let record_id = RecordId::for_date(date);
        let committed = self
            .dispatcher
            .dispatch::<CashDrawer>(record_id, command, |id| CashDrawer::empty(id, date))?;

        for stored in &committed {
            if let Err(e) = self.projection.apply_envelope(&stored.to_envelope()) {
                tracing::warn!("history projection apply failed: {e}");
            }
        }

        Ok(committed)
    }

    fn load_drawer(&self, date: BusinessDate) -> Result<CashDrawer, ServiceError> {
        let record_id = RecordId::for_date(date);
        Ok(self
            .dispatcher
            .load::<CashDrawer>(record_id, |id| CashDrawer::empty(id, date))?)
    }

    /// Open today's drawer. At most one record can exist per date; a second
    /// open surfaces as a conflict from the optimistic append. An earlier
    /// day's record left open must be closed before a new one can start.
    pub fn open_today(
        &self,
        ctx: &CallerContext,
        initial_balance_override: Option<Money>,
    ) -> Result<TodayStatus, ServiceError> {
        let date = self.today();

        if let Some(pending) = self.projection.open_record_before(date) {
            return Err(ServiceError::Conflict(format!(
                "an open cash record from {} must be closed first",
                pending.date
            )));
        }

        self.dispatch_drawer(
            date,
            DrawerCommand::OpenDrawer(OpenDrawer {
                record_id: RecordId::for_date(date),
                date,
                opened_by: Self::operator_of(ctx),
                role: ctx.role(),
                default_balance: self.settings.initial_cash_balance,
                initial_balance_override,
                occurred_at: Utc::now(),
            }),
        )?;

        tracing::info!(date = %date, user = ctx.username(), "cash drawer opened");
        self.get_today(ctx, None)
    }

    /// Current state of today's record.
    ///
    /// For an open record the live totals are recomputed against billing on
    /// every call; a billing outage degrades to zeroed sales figures with a
    /// warning marker rather than failing the read. A closed record returns
    /// its frozen snapshot and never re-fetches.
    pub fn get_today(
        &self,
        _ctx: &CallerContext,
        counted_preview: Option<Money>,
    ) -> Result<TodayStatus, ServiceError> {
        let date = self.today();
        let drawer = self.load_drawer(date)?;

        if !drawer.is_created() {
            return Err(ServiceError::NotFound);
        }

        let record_id = RecordId::for_date(date);
        if drawer.status() == DrawerStatus::Closed {
            return Ok(TodayStatus {
                record_id,
                date,
                status: DrawerStatus::Closed,
                opened_by: drawer.opened_by().cloned(),
                closed_by: drawer.closed_by().cloned(),
                initial_balance: drawer.initial_balance(),
                expenses: drawer.expenses().clone(),
                notes: drawer.notes().map(str::to_string),
                sales: None,
                live: None,
                snapshot: drawer.snapshot().cloned(),
                sales_warning: None,
            });
        }

        let (sales, sales_warning) = match aggregate_sales_for_date(self.sales.as_ref(), date) {
            Ok(aggregate) => (aggregate, None),
            Err(e) => {
                tracing::warn!("sales fetch failed, serving zeroed figures: {e}");
                (DailySalesAggregate::empty(date), Some(e.to_string()))
            }
        };

        let live = LiveTotals::compute(
            drawer.initial_balance(),
            &sales,
            drawer.expenses(),
            counted_preview,
        );

        Ok(TodayStatus {
            record_id,
            date,
            status: DrawerStatus::Open,
            opened_by: drawer.opened_by().cloned(),
            closed_by: None,
            initial_balance: drawer.initial_balance(),
            expenses: drawer.expenses().clone(),
            notes: drawer.notes().map(str::to_string),
            sales: Some(sales),
            live: Some(live),
            snapshot: None,
            sales_warning,
        })
    }

    pub fn add_expense(
        &self,
        ctx: &CallerContext,
        draft: ExpenseDraft,
    ) -> Result<TodayStatus, ServiceError> {
        let date = self.today();

        self.dispatch_drawer(
            date,
            DrawerCommand::AddExpense(AddExpense {
                record_id: RecordId::for_date(date),
                draft,
                occurred_at: Utc::now(),
            }),
        )?;

        self.get_today(ctx, None)
    }

    pub fn remove_expense(
        &self,
        ctx: &CallerContext,
        index: usize,
    ) -> Result<TodayStatus, ServiceError> {
        let date = self.today();

        self.dispatch_drawer(
            date,
            DrawerCommand::RemoveExpense(RemoveExpense {
                record_id: RecordId::for_date(date),
                index,
                occurred_at: Utc::now(),
            }),
        )?;

        self.get_today(ctx, None)
    }

    /// Close today's drawer against a fresh billing fetch.
    ///
    /// Unlike a read, a close aborts on a billing outage: a snapshot must
    /// never be frozen with unknown income.
    pub fn close_today(
        &self,
        ctx: &CallerContext,
        counted_cash: Money,
        notes: Option<String>,
    ) -> Result<TodayStatus, ServiceError> {
        let date = self.today();

        let sales = aggregate_sales_for_date(self.sales.as_ref(), date)
            .map_err(ServiceError::SalesUnavailable)?;

        self.dispatch_drawer(
            date,
            DrawerCommand::CloseDrawer(CloseDrawer {
                record_id: RecordId::for_date(date),
                counted_cash,
                notes,
                sales,
                closed_by: Self::operator_of(ctx),
                role: ctx.role(),
                occurred_at: Utc::now(),
            }),
        )?;

        tracing::info!(date = %date, user = ctx.username(), "cash drawer closed");
        self.get_today(ctx, None)
    }

    /// Reopen today's closed drawer (privileged, same-day only; both are
    /// enforced by the aggregate).
    pub fn reopen_today(&self, ctx: &CallerContext) -> Result<TodayStatus, ServiceError> {
        let date = self.today();

        self.dispatch_drawer(
            date,
            DrawerCommand::ReopenDrawer(ReopenDrawer {
                record_id: RecordId::for_date(date),
                requested_by: Self::operator_of(ctx),
                role: ctx.role(),
                current_date: date,
                occurred_at: Utc::now(),
            }),
        )?;

        tracing::info!(date = %date, user = ctx.username(), "cash drawer reopened");
        self.get_today(ctx, None)
    }

    /// Closed-and-open record history, newest first. Admin/soporte only.
    pub fn list_history(
        &self,
        ctx: &CallerContext,
        filters: &HistoryFilters,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<CashRecordView>, ServiceError> {
        if !ctx.role().is_privileged() {
            return Err(ServiceError::Forbidden(
                "history is restricted to admin or soporte".to_string(),
            ));
        }

        Ok(self.projection.list_history(filters, skip, limit))
    }
}

/// Wire the full in-memory service stack, handing the bus and projection
/// back so the caller can attach subscribers.
pub fn build_services(
    sales: Arc<dyn SalesProvider>,
    settings: StoreSettings,
) -> (
    AppServices,
    Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>,
    Arc<DrawerHistoryProjection>,
) {
    let store = Arc::new(InMemoryDrawerStore::new());
    let bus: Arc<InMemoryEventBus<EventEnvelope<JsonValue>>> = Arc::new(InMemoryEventBus::new());
    let projection = Arc::new(DrawerHistoryProjection::new());

    let services = AppServices::new(store, bus.clone(), projection.clone(), sales, settings);
    (services, bus, projection)
}
