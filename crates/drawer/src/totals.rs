//! Reconciliation arithmetic: the live projection recomputed on every read
//! while a record is open, and the snapshot frozen at close time.
//!
//! Every figure flows through `Money`, so there is a single rounding path;
//! the spur-of-the-moment display on screen and the frozen closure sheet can
//! never disagree by a rounding artifact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cuadre_money::Money;
use cuadre_sales::DailySalesAggregate;

use crate::ledger::{ExpenseEntry, ExpenseLedger};

/// Three-way reading of the closure difference. Sign convention is
/// `counted − expected`: positive means surplus, negative shortfall.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifferenceLabel {
    Sobrante,
    Faltante,
    CuadreExacto,
}

impl DifferenceLabel {
    /// Classify a difference. |d| < 0.001 reads as an exact match so that
    /// residual rounding noise never shows a false surplus or shortfall.
    pub fn for_amount(difference: Money) -> Self {
        if difference.is_zero_eps() {
            DifferenceLabel::CuadreExacto
        } else if difference.is_positive() {
            DifferenceLabel::Sobrante
        } else {
            DifferenceLabel::Faltante
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DifferenceLabel::Sobrante => "Sobrante",
            DifferenceLabel::Faltante => "Faltante",
            DifferenceLabel::CuadreExacto => "Cuadre Exacto",
        }
    }
}

impl core::fmt::Display for DifferenceLabel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live projection over an open record. Recomputed on every read, never
/// persisted; only a close freezes these numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveTotals {
    pub total_income: Money,
    pub total_expenses: Money,
    pub cash_expenses: Money,
    pub profit: Money,
    pub expected_cash: Money,
    /// Present only when the operator has typed a not-yet-committed count.
    pub difference: Option<Money>,
    pub cash_to_consign: Money,
}

impl LiveTotals {
    pub fn compute(
        initial_balance: Money,
        sales: &DailySalesAggregate,
        ledger: &ExpenseLedger,
        counted_cash: Option<Money>,
    ) -> Self {
        let total_income = sales.total;
        let total_expenses = ledger.total_all();
        let cash_expenses = ledger.total_cash();
        let profit = total_income - total_expenses;
        let expected_cash = initial_balance + sales.cash - cash_expenses;
        let difference = counted_cash.map(|counted| counted - expected_cash);
        let cash_to_consign = (sales.cash - cash_expenses).max_zero();

        Self {
            total_income,
            total_expenses,
            cash_expenses,
            profit,
            expected_cash,
            difference,
            cash_to_consign,
        }
    }
}

/// The frozen set of computed totals written once at close and never
/// recomputed while the record stays closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingSnapshot {
    pub cash_sales: Money,
    pub card_sales: Money,
    pub transfer_sales: Money,
    pub total_income: Money,
    pub total_expenses: Money,
    pub cash_expenses: Money,
    pub profit: Money,
    pub expected_cash: Money,
    pub counted_cash: Money,
    pub difference: Money,
    pub cash_to_consign: Money,
    pub notes: Option<String>,
    pub closing_time: DateTime<Utc>,
    /// Frozen copy of the ledger at close time; restored verbatim on reopen.
    pub expenses_details: Vec<ExpenseEntry>,
}

impl ClosingSnapshot {
    pub fn compute(
        initial_balance: Money,
        sales: &DailySalesAggregate,
        ledger: &ExpenseLedger,
        counted_cash: Money,
        notes: Option<String>,
        closing_time: DateTime<Utc>,
    ) -> Self {
        let live = LiveTotals::compute(initial_balance, sales, ledger, Some(counted_cash));

        Self {
            cash_sales: sales.cash,
            card_sales: sales.card,
            transfer_sales: sales.transfer,
            total_income: live.total_income,
            total_expenses: live.total_expenses,
            cash_expenses: live.cash_expenses,
            profit: live.profit,
            expected_cash: live.expected_cash,
            counted_cash,
            difference: counted_cash - live.expected_cash,
            cash_to_consign: live.cash_to_consign,
            notes,
            closing_time,
            expenses_details: ledger.entries().to_vec(),
        }
    }

    pub fn difference_label(&self) -> DifferenceLabel {
        DifferenceLabel::for_amount(self.difference)
    }
}
