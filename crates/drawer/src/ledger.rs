//! Expense ledger: the ordered list of manually entered outgoings attached
//! to one open cash record.

use serde::{Deserialize, Serialize};

use cuadre_core::{BusinessDate, DomainError, DomainResult};
use cuadre_money::Money;

/// How an expense was paid out. Only cash-paid expenses reduce the expected
/// cash in the physical drawer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpensePaymentMethod {
    Cash,
    BankAccount,
    CompanyCard,
    Other,
}

impl ExpensePaymentMethod {
    pub fn is_cash(self) -> bool {
        matches!(self, ExpensePaymentMethod::Cash)
    }
}

/// Expense as entered by the operator, before normalization.
///
/// `expense_date` is optional; when absent it defaults to the record's own
/// business date (backdating is allowed, for late-arriving receipts).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseDraft {
    pub concept: String,
    pub value: Money,
    pub recipient_id: Option<String>,
    pub expense_date: Option<BusinessDate>,
    pub payment_method: ExpensePaymentMethod,
}

/// Validated expense entry owned by its parent cash record.
///
/// Identity is positional: entries are addressed by index while the record
/// is open, and become immutable once it closes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseEntry {
    pub concept: String,
    pub value: Money,
    pub recipient_id: Option<String>,
    pub expense_date: BusinessDate,
    pub payment_method: ExpensePaymentMethod,
}

impl ExpenseDraft {
    /// Validate and normalize against the owning record's date.
    pub fn into_entry(self, record_date: BusinessDate) -> DomainResult<ExpenseEntry> {
        let concept = self.concept.trim().to_string();
        if concept.is_empty() {
            return Err(DomainError::validation("expense concept must not be empty"));
        }
        if !self.value.is_positive() {
            return Err(DomainError::validation("expense value must be positive"));
        }

        Ok(ExpenseEntry {
            concept,
            value: self.value,
            recipient_id: self.recipient_id.filter(|r| !r.trim().is_empty()),
            expense_date: self.expense_date.unwrap_or(record_date),
            payment_method: self.payment_method,
        })
    }
}

/// Ordered expense list with rounded totals.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseLedger(Vec<ExpenseEntry>);

impl ExpenseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from a frozen snapshot copy.
    pub fn from_entries(entries: Vec<ExpenseEntry>) -> Self {
        Self(entries)
    }

    pub fn entries(&self) -> &[ExpenseEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, entry: ExpenseEntry) {
        self.0.push(entry);
    }

    /// Remove by position. Out-of-range indexes are a validation failure,
    /// not a panic: the index came from a client.
    pub fn remove(&mut self, index: usize) -> DomainResult<ExpenseEntry> {
        if index >= self.0.len() {
            return Err(DomainError::validation(format!(
                "expense index {index} out of range (ledger has {} entries)",
                self.0.len()
            )));
        }
        Ok(self.0.remove(index))
    }

    /// Sum of all expense values, rounded.
    pub fn total_all(&self) -> Money {
        self.0.iter().map(|e| e.value).sum()
    }

    /// Sum of cash-paid expense values, rounded.
    pub fn total_cash(&self) -> Money {
        self.0
            .iter()
            .filter(|e| e.payment_method.is_cash())
            .map(|e| e.value)
            .sum()
    }
}

impl From<Vec<ExpenseEntry>> for ExpenseLedger {
    fn from(entries: Vec<ExpenseEntry>) -> Self {
        Self(entries)
    }
}

impl From<ExpenseLedger> for Vec<ExpenseEntry> {
    fn from(ledger: ExpenseLedger) -> Self {
        ledger.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn record_date() -> BusinessDate {
        "2026-08-29".parse().unwrap()
    }

    fn draft(concept: &str, value: &str, method: ExpensePaymentMethod) -> ExpenseDraft {
        ExpenseDraft {
            concept: concept.to_string(),
            value: value.parse().unwrap(),
            recipient_id: None,
            expense_date: None,
            payment_method: method,
        }
    }

    #[test]
    fn rejects_blank_concept() {
        let err = draft("   ", "10", ExpensePaymentMethod::Cash)
            .into_entry(record_date())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn rejects_non_positive_value() {
        for v in ["0", "-5"] {
            let err = draft("Domicilio", v, ExpensePaymentMethod::Cash)
                .into_entry(record_date())
                .unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)));
        }
    }

    #[test]
    fn defaults_expense_date_to_record_date() {
        let entry = draft("Domicilio", "15000", ExpensePaymentMethod::Cash)
            .into_entry(record_date())
            .unwrap();
        assert_eq!(entry.expense_date, record_date());
    }

    #[test]
    fn backdated_expense_date_is_kept() {
        let mut d = draft("Domicilio", "15000", ExpensePaymentMethod::Cash);
        d.expense_date = Some("2026-08-27".parse().unwrap());
        let entry = d.into_entry(record_date()).unwrap();
        assert_eq!(entry.expense_date.to_string(), "2026-08-27");
    }

    #[test]
    fn total_cash_ignores_non_cash_methods() {
        let mut ledger = ExpenseLedger::new();
        for (value, method) in [
            ("100", ExpensePaymentMethod::Cash),
            ("200", ExpensePaymentMethod::BankAccount),
            ("50", ExpensePaymentMethod::Cash),
            ("75", ExpensePaymentMethod::CompanyCard),
        ] {
            ledger.push(
                draft("Egreso", value, method).into_entry(record_date()).unwrap(),
            );
        }
        assert_eq!(ledger.total_all(), "425".parse().unwrap());
        assert_eq!(ledger.total_cash(), "150".parse().unwrap());
    }

    #[test]
    fn remove_is_positional_and_bounds_checked() {
        let mut ledger = ExpenseLedger::new();
        ledger.push(draft("A", "1", ExpensePaymentMethod::Cash).into_entry(record_date()).unwrap());
        ledger.push(draft("B", "2", ExpensePaymentMethod::Cash).into_entry(record_date()).unwrap());

        let removed = ledger.remove(0).unwrap();
        assert_eq!(removed.concept, "A");
        assert_eq!(ledger.entries()[0].concept, "B");
        assert!(ledger.remove(5).is_err());
    }

    proptest! {
        /// total_cash never exceeds total_all, and both equal the rounded
        /// sums of their underlying entries.
        #[test]
        fn totals_are_consistent(cents in prop::collection::vec((1i64..10_000_000i64, any::<bool>()), 0..20)) {
            let mut ledger = ExpenseLedger::new();
            let mut all = Money::ZERO;
            let mut cash = Money::ZERO;
            for (c, is_cash) in cents {
                let value = Money::new(Decimal::new(c, 2));
                let method = if is_cash {
                    ExpensePaymentMethod::Cash
                } else {
                    ExpensePaymentMethod::BankAccount
                };
                ledger.push(ExpenseEntry {
                    concept: "Egreso".to_string(),
                    value,
                    recipient_id: None,
                    expense_date: record_date(),
                    payment_method: method,
                });
                all = all + value;
                if is_cash {
                    cash = cash + value;
                }
            }
            prop_assert_eq!(ledger.total_all(), all);
            prop_assert_eq!(ledger.total_cash(), cash);
            prop_assert!(ledger.total_cash() <= ledger.total_all());
        }
    }
}
