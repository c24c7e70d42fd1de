//! Daily cash record aggregate.
//!
//! One aggregate instance per business date. The stream identifier is derived
//! deterministically from the date, so "at most one record per day" is
//! enforced by the store's optimistic append rather than by a lookup.
//!
//! Authorization lives inside the transition functions: who may close and who
//! may reopen is part of the lifecycle contract, not a concern of the HTTP
//! layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cuadre_core::{Aggregate, AggregateRoot, BusinessDate, DomainError, RecordId, Role, UserId};
use cuadre_events::Event;
use cuadre_money::Money;
use cuadre_sales::DailySalesAggregate;

use crate::ledger::{ExpenseDraft, ExpenseLedger};
use crate::totals::ClosingSnapshot;

/// Identity of the user performing an operation, as attested by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub user_id: UserId,
    pub username: String,
}

/// Cash record lifecycle status.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawerStatus {
    Open,
    Closed,
}

impl DrawerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DrawerStatus::Open => "open",
            DrawerStatus::Closed => "closed",
        }
    }
}

impl core::fmt::Display for DrawerStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for DrawerStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(DrawerStatus::Open),
            "closed" => Ok(DrawerStatus::Closed),
            other => Err(DomainError::validation(format!(
                "unknown drawer status: {other}"
            ))),
        }
    }
}

/// Aggregate root: the cash drawer record for one business date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CashDrawer {
    id: RecordId,
    date: BusinessDate,
    status: DrawerStatus,
    opened_by: Option<Operator>,
    closed_by: Option<Operator>,
    initial_balance: Money,
    expenses: ExpenseLedger,
    /// Closing notes. While open after a reopen these are the prior
    /// closure's notes, kept as an editable draft.
    notes: Option<String>,
    snapshot: Option<ClosingSnapshot>,
    version: u64,
    created: bool,
}

impl CashDrawer {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: RecordId, date: BusinessDate) -> Self {
        Self {
            id,
            date,
            status: DrawerStatus::Open,
            opened_by: None,
            closed_by: None,
            initial_balance: Money::ZERO,
            expenses: ExpenseLedger::new(),
            notes: None,
            snapshot: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> RecordId {
        self.id
    }

    pub fn date(&self) -> BusinessDate {
        self.date
    }

    pub fn status(&self) -> DrawerStatus {
        self.status
    }

    pub fn opened_by(&self) -> Option<&Operator> {
        self.opened_by.as_ref()
    }

    pub fn closed_by(&self) -> Option<&Operator> {
        self.closed_by.as_ref()
    }

    pub fn initial_balance(&self) -> Money {
        self.initial_balance
    }

    pub fn expenses(&self) -> &ExpenseLedger {
        &self.expenses
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn snapshot(&self) -> Option<&ClosingSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn is_open(&self) -> bool {
        self.created && self.status == DrawerStatus::Open
    }
}

impl AggregateRoot for CashDrawer {
    type Id = RecordId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: OpenDrawer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenDrawer {
    pub record_id: RecordId,
    pub date: BusinessDate,
    pub opened_by: Operator,
    pub role: Role,
    /// Configured store-level starting float.
    pub default_balance: Money,
    /// Privileged callers may override the configured float for the day.
    pub initial_balance_override: Option<Money>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddExpense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddExpense {
    pub record_id: RecordId,
    pub draft: ExpenseDraft,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveExpense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveExpense {
    pub record_id: RecordId,
    pub index: usize,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CloseDrawer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseDrawer {
    pub record_id: RecordId,
    pub counted_cash: Money,
    pub notes: Option<String>,
    /// Sales figures fetched for the record's date at close time.
    pub sales: DailySalesAggregate,
    pub closed_by: Operator,
    pub role: Role,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReopenDrawer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReopenDrawer {
    pub record_id: RecordId,
    pub requested_by: Operator,
    pub role: Role,
    /// The caller's current business date; only same-day records may reopen.
    pub current_date: BusinessDate,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawerCommand {
    OpenDrawer(OpenDrawer),
    AddExpense(AddExpense),
    RemoveExpense(RemoveExpense),
    CloseDrawer(CloseDrawer),
    ReopenDrawer(ReopenDrawer),
}

/// Event: DrawerOpened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawerOpened {
    pub record_id: RecordId,
    pub date: BusinessDate,
    pub opened_by: Operator,
    pub initial_balance: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ExpenseAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseAdded {
    pub record_id: RecordId,
    pub entry: crate::ledger::ExpenseEntry,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ExpenseRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRemoved {
    pub record_id: RecordId,
    pub index: usize,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DrawerClosed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawerClosed {
    pub record_id: RecordId,
    pub closed_by: Operator,
    pub snapshot: ClosingSnapshot,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DrawerReopened.
///
/// Reopening never rewrites history: the prior `DrawerClosed` stays in the
/// stream, which is the audit trail for the discarded closure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawerReopened {
    pub record_id: RecordId,
    pub requested_by: Operator,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawerEvent {
    DrawerOpened(DrawerOpened),
    ExpenseAdded(ExpenseAdded),
    ExpenseRemoved(ExpenseRemoved),
    DrawerClosed(DrawerClosed),
    DrawerReopened(DrawerReopened),
}

impl Event for DrawerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DrawerEvent::DrawerOpened(_) => "drawer.opened",
            DrawerEvent::ExpenseAdded(_) => "drawer.expense_added",
            DrawerEvent::ExpenseRemoved(_) => "drawer.expense_removed",
            DrawerEvent::DrawerClosed(_) => "drawer.closed",
            DrawerEvent::DrawerReopened(_) => "drawer.reopened",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            DrawerEvent::DrawerOpened(e) => e.occurred_at,
            DrawerEvent::ExpenseAdded(e) => e.occurred_at,
            DrawerEvent::ExpenseRemoved(e) => e.occurred_at,
            DrawerEvent::DrawerClosed(e) => e.occurred_at,
            DrawerEvent::DrawerReopened(e) => e.occurred_at,
        }
    }
}

impl Aggregate for CashDrawer {
    type Command = DrawerCommand;
    type Event = DrawerEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            DrawerEvent::DrawerOpened(e) => {
                self.id = e.record_id;
                self.date = e.date;
                self.status = DrawerStatus::Open;
                self.opened_by = Some(e.opened_by.clone());
                self.closed_by = None;
                self.initial_balance = e.initial_balance;
                self.expenses = ExpenseLedger::new();
                self.notes = None;
                self.snapshot = None;
                self.created = true;
            }
            DrawerEvent::ExpenseAdded(e) => {
                self.expenses.push(e.entry.clone());
            }
            DrawerEvent::ExpenseRemoved(e) => {
                // handle() validated the index against the same state; the
                // guard keeps replay total even against a corrupted stream.
                let _ = self.expenses.remove(e.index);
            }
            DrawerEvent::DrawerClosed(e) => {
                self.status = DrawerStatus::Closed;
                self.closed_by = Some(e.closed_by.clone());
                self.notes = e.snapshot.notes.clone();
                self.snapshot = Some(e.snapshot.clone());
            }
            DrawerEvent::DrawerReopened(_) => {
                // The discarded closure's expenses and notes come back as an
                // editable draft.
                if let Some(snapshot) = self.snapshot.take() {
                    self.expenses = ExpenseLedger::from_entries(snapshot.expenses_details);
                    self.notes = snapshot.notes;
                }
                self.status = DrawerStatus::Open;
                self.closed_by = None;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            DrawerCommand::OpenDrawer(cmd) => self.handle_open(cmd),
            DrawerCommand::AddExpense(cmd) => self.handle_add_expense(cmd),
            DrawerCommand::RemoveExpense(cmd) => self.handle_remove_expense(cmd),
            DrawerCommand::CloseDrawer(cmd) => self.handle_close(cmd),
            DrawerCommand::ReopenDrawer(cmd) => self.handle_reopen(cmd),
        }
    }
}

impl CashDrawer {
    fn ensure_record_id(&self, record_id: RecordId) -> Result<(), DomainError> {
        if self.id != record_id {
            return Err(DomainError::invariant("record_id mismatch"));
        }
        Ok(())
    }

    fn handle_open(&self, cmd: &OpenDrawer) -> Result<Vec<DrawerEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict(format!(
                "a cash record already exists for {}",
                cmd.date
            )));
        }

        // Non-privileged callers always get the configured float; the
        // override field is ignored rather than rejected so that a shared
        // front-end form works for every role.
        let initial_balance = match cmd.initial_balance_override {
            Some(amount) if cmd.role.is_privileged() => {
                if amount.is_negative() {
                    return Err(DomainError::validation(
                        "initial balance must not be negative",
                    ));
                }
                amount
            }
            _ => cmd.default_balance,
        };

        Ok(vec![DrawerEvent::DrawerOpened(DrawerOpened {
            record_id: cmd.record_id,
            date: cmd.date,
            opened_by: cmd.opened_by.clone(),
            initial_balance,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_expense(&self, cmd: &AddExpense) -> Result<Vec<DrawerEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_record_id(cmd.record_id)?;

        if self.status == DrawerStatus::Closed {
            return Err(DomainError::invariant(
                "cannot modify expenses on a closed record",
            ));
        }

        let entry = cmd.draft.clone().into_entry(self.date)?;

        Ok(vec![DrawerEvent::ExpenseAdded(ExpenseAdded {
            record_id: cmd.record_id,
            entry,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove_expense(&self, cmd: &RemoveExpense) -> Result<Vec<DrawerEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_record_id(cmd.record_id)?;

        if self.status == DrawerStatus::Closed {
            return Err(DomainError::invariant(
                "cannot modify expenses on a closed record",
            ));
        }

        if cmd.index >= self.expenses.len() {
            return Err(DomainError::validation(format!(
                "expense index {} out of range (ledger has {} entries)",
                cmd.index,
                self.expenses.len()
            )));
        }

        Ok(vec![DrawerEvent::ExpenseRemoved(ExpenseRemoved {
            record_id: cmd.record_id,
            index: cmd.index,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_close(&self, cmd: &CloseDrawer) -> Result<Vec<DrawerEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_record_id(cmd.record_id)?;

        if self.status == DrawerStatus::Closed {
            return Err(DomainError::conflict("cash record is already closed"));
        }

        let is_opener = self
            .opened_by
            .as_ref()
            .is_some_and(|op| op.user_id == cmd.closed_by.user_id);
        if !is_opener && !cmd.role.is_privileged() {
            return Err(DomainError::unauthorized(
                "only the opening user, an admin, or soporte may close this record",
            ));
        }

        if cmd.counted_cash.is_negative() {
            return Err(DomainError::validation(
                "counted cash must not be negative",
            ));
        }

        if cmd.sales.date != self.date {
            return Err(DomainError::validation(format!(
                "sales figures are for {}, record is for {}",
                cmd.sales.date, self.date
            )));
        }

        // A close without notes keeps the draft restored by a reopen, so a
        // re-close does not silently drop the prior closure's remarks.
        let notes = cmd.notes.clone().or_else(|| self.notes.clone());

        let snapshot = ClosingSnapshot::compute(
            self.initial_balance,
            &cmd.sales,
            &self.expenses,
            cmd.counted_cash,
            notes,
            cmd.occurred_at,
        );

        Ok(vec![DrawerEvent::DrawerClosed(DrawerClosed {
            record_id: cmd.record_id,
            closed_by: cmd.closed_by.clone(),
            snapshot,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reopen(&self, cmd: &ReopenDrawer) -> Result<Vec<DrawerEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_record_id(cmd.record_id)?;

        if self.status != DrawerStatus::Closed {
            return Err(DomainError::conflict("cash record is not closed"));
        }

        if !cmd.role.is_privileged() {
            return Err(DomainError::unauthorized(
                "only an admin or soporte may reopen a closed record",
            ));
        }

        if self.date != cmd.current_date {
            return Err(DomainError::unauthorized(
                "only the current day's record may be reopened",
            ));
        }

        Ok(vec![DrawerEvent::DrawerReopened(DrawerReopened {
            record_id: cmd.record_id,
            requested_by: cmd.requested_by.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::ExpensePaymentMethod;
    use cuadre_sales::SaleSummary;

    fn record_date() -> BusinessDate {
        "2026-08-29".parse().unwrap()
    }

    fn test_record_id() -> RecordId {
        RecordId::for_date(record_date())
    }

    fn test_operator(name: &str) -> Operator {
        Operator {
            user_id: UserId::new(),
            username: name.to_string(),
        }
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn m(s: &str) -> Money {
        s.parse().unwrap()
    }

    fn open_cmd(opened_by: Operator, role: Role, override_balance: Option<Money>) -> DrawerCommand {
        DrawerCommand::OpenDrawer(OpenDrawer {
            record_id: test_record_id(),
            date: record_date(),
            opened_by,
            role,
            default_balance: m("100000"),
            initial_balance_override: override_balance,
            occurred_at: test_time(),
        })
    }

    fn expense_draft(value: &str) -> ExpenseDraft {
        ExpenseDraft {
            concept: "Domicilio".to_string(),
            value: m(value),
            recipient_id: None,
            expense_date: None,
            payment_method: ExpensePaymentMethod::Cash,
        }
    }

    fn sales_for(date: BusinessDate, cash: &str) -> DailySalesAggregate {
        DailySalesAggregate::from_sales(
            date,
            vec![SaleSummary {
                invoice_number: "INV-1".to_string(),
                customer_name: "Cliente".to_string(),
                customer_document: "123".to_string(),
                total_amount: m(cash),
                payment_method: "Efectivo".to_string(),
                items: vec![],
            }],
        )
    }

    fn opened_drawer(opener: &Operator) -> CashDrawer {
        let mut drawer = CashDrawer::empty(test_record_id(), record_date());
        let events = drawer
            .handle(&open_cmd(opener.clone(), Role::Caja, None))
            .unwrap();
        for e in &events {
            drawer.apply(e);
        }
        drawer
    }

    fn close_cmd(closer: Operator, role: Role, counted: &str) -> DrawerCommand {
        DrawerCommand::CloseDrawer(CloseDrawer {
            record_id: test_record_id(),
            counted_cash: m(counted),
            notes: None,
            sales: sales_for(record_date(), "250000"),
            closed_by: closer,
            role,
            occurred_at: test_time(),
        })
    }

    fn closed_drawer(opener: &Operator) -> CashDrawer {
        let mut drawer = opened_drawer(opener);
        let events = drawer
            .handle(&close_cmd(opener.clone(), Role::Caja, "350000"))
            .unwrap();
        for e in &events {
            drawer.apply(e);
        }
        drawer
    }

    #[test]
    fn open_emits_drawer_opened_with_default_balance() {
        let drawer = CashDrawer::empty(test_record_id(), record_date());
        let events = drawer
            .handle(&open_cmd(test_operator("caja1"), Role::Caja, None))
            .unwrap();

        assert_eq!(events.len(), 1);
        match &events[0] {
            DrawerEvent::DrawerOpened(e) => {
                assert_eq!(e.initial_balance, m("100000"));
                assert_eq!(e.date, record_date());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn second_open_is_a_conflict() {
        let opener = test_operator("caja1");
        let drawer = opened_drawer(&opener);

        let err = drawer
            .handle(&open_cmd(opener, Role::Caja, None))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn non_privileged_override_is_ignored() {
        let drawer = CashDrawer::empty(test_record_id(), record_date());
        let events = drawer
            .handle(&open_cmd(test_operator("caja1"), Role::Caja, Some(m("999"))))
            .unwrap();

        match &events[0] {
            DrawerEvent::DrawerOpened(e) => assert_eq!(e.initial_balance, m("100000")),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn privileged_override_is_honored() {
        let drawer = CashDrawer::empty(test_record_id(), record_date());
        let events = drawer
            .handle(&open_cmd(
                test_operator("admin1"),
                Role::Admin,
                Some(m("55000")),
            ))
            .unwrap();

        match &events[0] {
            DrawerEvent::DrawerOpened(e) => assert_eq!(e.initial_balance, m("55000")),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn privileged_negative_override_fails_validation() {
        let drawer = CashDrawer::empty(test_record_id(), record_date());
        let err = drawer
            .handle(&open_cmd(test_operator("admin1"), Role::Admin, Some(m("-5"))))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn add_expense_on_missing_record_is_not_found() {
        let drawer = CashDrawer::empty(test_record_id(), record_date());
        let err = drawer
            .handle(&DrawerCommand::AddExpense(AddExpense {
                record_id: test_record_id(),
                draft: expense_draft("15000"),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound));
    }

    #[test]
    fn add_expense_defaults_date_to_record_date() {
        let opener = test_operator("caja1");
        let drawer = opened_drawer(&opener);

        let events = drawer
            .handle(&DrawerCommand::AddExpense(AddExpense {
                record_id: test_record_id(),
                draft: expense_draft("15000"),
                occurred_at: test_time(),
            }))
            .unwrap();

        match &events[0] {
            DrawerEvent::ExpenseAdded(e) => assert_eq!(e.entry.expense_date, record_date()),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn closed_record_rejects_expense_changes() {
        let opener = test_operator("caja1");
        let drawer = closed_drawer(&opener);

        let add = drawer
            .handle(&DrawerCommand::AddExpense(AddExpense {
                record_id: test_record_id(),
                draft: expense_draft("15000"),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(add, DomainError::InvariantViolation(_)));

        let remove = drawer
            .handle(&DrawerCommand::RemoveExpense(RemoveExpense {
                record_id: test_record_id(),
                index: 0,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(remove, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn remove_expense_out_of_range_fails_validation() {
        let opener = test_operator("caja1");
        let drawer = opened_drawer(&opener);

        let err = drawer
            .handle(&DrawerCommand::RemoveExpense(RemoveExpense {
                record_id: test_record_id(),
                index: 0,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn close_by_unrelated_caja_is_unauthorized() {
        let opener = test_operator("caja1");
        let drawer = opened_drawer(&opener);

        let err = drawer
            .handle(&close_cmd(test_operator("caja2"), Role::Caja, "350000"))
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[test]
    fn close_by_privileged_non_opener_is_allowed() {
        let opener = test_operator("caja1");
        let drawer = opened_drawer(&opener);

        let events = drawer
            .handle(&close_cmd(test_operator("soporte1"), Role::Soporte, "350000"))
            .unwrap();
        assert!(matches!(events[0], DrawerEvent::DrawerClosed(_)));
    }

    #[test]
    fn close_with_negative_counted_cash_fails_validation() {
        let opener = test_operator("caja1");
        let drawer = opened_drawer(&opener);

        let err = drawer
            .handle(&close_cmd(opener, Role::Caja, "-1"))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn close_with_mismatched_sales_date_fails_validation() {
        let opener = test_operator("caja1");
        let drawer = opened_drawer(&opener);

        let err = drawer
            .handle(&DrawerCommand::CloseDrawer(CloseDrawer {
                record_id: test_record_id(),
                counted_cash: m("350000"),
                notes: None,
                sales: sales_for("2026-08-28".parse().unwrap(), "250000"),
                closed_by: opener,
                role: Role::Caja,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn close_freezes_a_correct_snapshot() {
        let opener = test_operator("caja1");
        let mut drawer = opened_drawer(&opener);

        let add = drawer
            .handle(&DrawerCommand::AddExpense(AddExpense {
                record_id: test_record_id(),
                draft: expense_draft("15000"),
                occurred_at: test_time(),
            }))
            .unwrap();
        for e in &add {
            drawer.apply(e);
        }

        // initial 100 000 + cash 250 000 - cash expense 15 000 = 335 000
        let events = drawer
            .handle(&close_cmd(opener, Role::Caja, "340000"))
            .unwrap();
        match &events[0] {
            DrawerEvent::DrawerClosed(e) => {
                assert_eq!(e.snapshot.expected_cash, m("335000"));
                assert_eq!(e.snapshot.difference, m("5000"));
                assert_eq!(e.snapshot.cash_to_consign, m("235000"));
                assert_eq!(e.snapshot.expenses_details.len(), 1);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn double_close_is_a_conflict() {
        let opener = test_operator("caja1");
        let drawer = closed_drawer(&opener);

        let err = drawer
            .handle(&close_cmd(opener, Role::Caja, "350000"))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn reopen_requires_privileged_role() {
        let opener = test_operator("caja1");
        let drawer = closed_drawer(&opener);

        let err = drawer
            .handle(&DrawerCommand::ReopenDrawer(ReopenDrawer {
                record_id: test_record_id(),
                requested_by: opener,
                role: Role::Caja,
                current_date: record_date(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[test]
    fn reopen_of_a_past_day_is_unauthorized() {
        let opener = test_operator("caja1");
        let drawer = closed_drawer(&opener);

        let err = drawer
            .handle(&DrawerCommand::ReopenDrawer(ReopenDrawer {
                record_id: test_record_id(),
                requested_by: test_operator("admin1"),
                role: Role::Admin,
                current_date: "2026-08-30".parse().unwrap(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[test]
    fn reopen_of_an_open_record_is_a_conflict() {
        let opener = test_operator("caja1");
        let drawer = opened_drawer(&opener);

        let err = drawer
            .handle(&DrawerCommand::ReopenDrawer(ReopenDrawer {
                record_id: test_record_id(),
                requested_by: test_operator("admin1"),
                role: Role::Admin,
                current_date: record_date(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn reopen_restores_expenses_and_clears_snapshot() {
        let opener = test_operator("caja1");
        let mut drawer = opened_drawer(&opener);

        let add = drawer
            .handle(&DrawerCommand::AddExpense(AddExpense {
                record_id: test_record_id(),
                draft: expense_draft("15000"),
                occurred_at: test_time(),
            }))
            .unwrap();
        for e in &add {
            drawer.apply(e);
        }

        let close = drawer
            .handle(&close_cmd(opener.clone(), Role::Caja, "335000"))
            .unwrap();
        for e in &close {
            drawer.apply(e);
        }
        assert_eq!(drawer.status(), DrawerStatus::Closed);

        let reopen = drawer
            .handle(&DrawerCommand::ReopenDrawer(ReopenDrawer {
                record_id: test_record_id(),
                requested_by: test_operator("admin1"),
                role: Role::Admin,
                current_date: record_date(),
                occurred_at: test_time(),
            }))
            .unwrap();
        for e in &reopen {
            drawer.apply(e);
        }

        assert_eq!(drawer.status(), DrawerStatus::Open);
        assert!(drawer.snapshot().is_none());
        assert!(drawer.closed_by().is_none());
        assert_eq!(drawer.expenses().len(), 1);
        assert_eq!(drawer.opened_by(), Some(&opener));
    }

    #[test]
    fn reopen_keeps_closing_notes_as_an_editable_draft() {
        let opener = test_operator("caja1");
        let mut drawer = opened_drawer(&opener);

        let close = drawer
            .handle(&DrawerCommand::CloseDrawer(CloseDrawer {
                record_id: test_record_id(),
                counted_cash: m("350000"),
                notes: Some("falto consignar el datafono".to_string()),
                sales: sales_for(record_date(), "250000"),
                closed_by: opener.clone(),
                role: Role::Caja,
                occurred_at: test_time(),
            }))
            .unwrap();
        for e in &close {
            drawer.apply(e);
        }

        let reopen = drawer
            .handle(&DrawerCommand::ReopenDrawer(ReopenDrawer {
                record_id: test_record_id(),
                requested_by: test_operator("admin1"),
                role: Role::Admin,
                current_date: record_date(),
                occurred_at: test_time(),
            }))
            .unwrap();
        for e in &reopen {
            drawer.apply(e);
        }

        assert_eq!(drawer.notes(), Some("falto consignar el datafono"));

        // A re-close without retyping the notes keeps the draft.
        let reclose = drawer
            .handle(&close_cmd(opener, Role::Caja, "350000"))
            .unwrap();
        match &reclose[0] {
            DrawerEvent::DrawerClosed(e) => {
                assert_eq!(
                    e.snapshot.notes.as_deref(),
                    Some("falto consignar el datafono")
                );
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn close_notes_override_the_reopened_draft() {
        let opener = test_operator("caja1");
        let mut drawer = opened_drawer(&opener);

        let close = drawer
            .handle(&DrawerCommand::CloseDrawer(CloseDrawer {
                record_id: test_record_id(),
                counted_cash: m("350000"),
                notes: Some("primer cierre".to_string()),
                sales: sales_for(record_date(), "250000"),
                closed_by: opener.clone(),
                role: Role::Caja,
                occurred_at: test_time(),
            }))
            .unwrap();
        for e in &close {
            drawer.apply(e);
        }

        let reopen = drawer
            .handle(&DrawerCommand::ReopenDrawer(ReopenDrawer {
                record_id: test_record_id(),
                requested_by: test_operator("admin1"),
                role: Role::Admin,
                current_date: record_date(),
                occurred_at: test_time(),
            }))
            .unwrap();
        for e in &reopen {
            drawer.apply(e);
        }

        let reclose = drawer
            .handle(&DrawerCommand::CloseDrawer(CloseDrawer {
                record_id: test_record_id(),
                counted_cash: m("350000"),
                notes: Some("cierre corregido".to_string()),
                sales: sales_for(record_date(), "250000"),
                closed_by: opener,
                role: Role::Caja,
                occurred_at: test_time(),
            }))
            .unwrap();
        match &reclose[0] {
            DrawerEvent::DrawerClosed(e) => {
                assert_eq!(e.snapshot.notes.as_deref(), Some("cierre corregido"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let opener = test_operator("caja1");
        let drawer = opened_drawer(&opener);
        let before = drawer.clone();

        let _ = drawer.handle(&DrawerCommand::AddExpense(AddExpense {
            record_id: test_record_id(),
            draft: expense_draft("15000"),
            occurred_at: test_time(),
        }));

        assert_eq!(drawer, before);
    }

    #[test]
    fn version_increments_once_per_applied_event() {
        let opener = test_operator("caja1");
        let drawer = opened_drawer(&opener);
        assert_eq!(drawer.version(), 1);

        let drawer = closed_drawer(&opener);
        assert_eq!(drawer.version(), 2);
    }

    #[test]
    fn replay_from_scratch_reproduces_state() {
        let opener = test_operator("caja1");
        let mut live = opened_drawer(&opener);
        let mut log: Vec<DrawerEvent> = Vec::new();

        let add = live
            .handle(&DrawerCommand::AddExpense(AddExpense {
                record_id: test_record_id(),
                draft: expense_draft("15000"),
                occurred_at: test_time(),
            }))
            .unwrap();
        for e in &add {
            live.apply(e);
        }
        log.extend(add);

        let close = live
            .handle(&close_cmd(opener.clone(), Role::Caja, "335000"))
            .unwrap();
        for e in &close {
            live.apply(e);
        }
        log.extend(close);

        let mut replayed = CashDrawer::empty(test_record_id(), record_date());
        let open = CashDrawer::empty(test_record_id(), record_date())
            .handle(&open_cmd(opener.clone(), Role::Caja, None))
            .unwrap();
        for e in open.iter().chain(log.iter()) {
            replayed.apply(e);
        }

        assert_eq!(replayed, live);
    }
}
