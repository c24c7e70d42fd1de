//! `cuadre-drawer` — the cash drawer reconciliation state machine.
//!
//! One aggregate per business date: NoRecord → Open → Closed, with a
//! privileged same-day Reopen back to Open. Decisions (`handle`) are pure
//! and IO-free; state evolves only through `apply`, so every transition is
//! testable without storage or HTTP. The event stream doubles as the audit
//! trail: reopen appends, it never erases the original closure.

pub mod ledger;
pub mod record;
pub mod totals;

pub use ledger::{ExpenseDraft, ExpenseEntry, ExpenseLedger, ExpensePaymentMethod};
pub use record::{
    AddExpense, CashDrawer, CloseDrawer, DrawerCommand, DrawerEvent, DrawerStatus, OpenDrawer,
    Operator, RemoveExpense, ReopenDrawer,
};
pub use totals::{ClosingSnapshot, DifferenceLabel, LiveTotals};
