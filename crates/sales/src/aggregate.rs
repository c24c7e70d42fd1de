use serde::{Deserialize, Serialize};

use cuadre_core::BusinessDate;
use cuadre_money::Money;

use crate::provider::{SalesFetchError, SalesProvider};

/// One line of a completed sale (drill-down detail only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItem {
    pub description: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// A completed sale as the billing subsystem reports it.
///
/// `payment_method` is free text on the wire ("Efectivo", "Tarjeta de
/// Crédito", ...); classification into buckets happens here, not upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleSummary {
    pub invoice_number: String,
    pub customer_name: String,
    pub customer_document: String,
    pub total_amount: Money,
    pub payment_method: String,
    pub items: Vec<SaleItem>,
}

/// Bucket a raw payment-method string resolves to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SalesBucket {
    Cash,
    Card,
    Transfer,
    /// Not one of the three named buckets; still counted in `total`.
    Unclassified,
}

/// Case-insensitive payment-method classification.
///
/// "efectivo" is an exact match; card matches any string containing
/// "tarjeta" (credit and debit variants both flow through the card bucket).
pub fn classify_payment_method(raw: &str) -> SalesBucket {
    let lowered = raw.trim().to_lowercase();
    if lowered == "efectivo" {
        SalesBucket::Cash
    } else if lowered.contains("tarjeta") {
        SalesBucket::Card
    } else if lowered == "transferencia" {
        SalesBucket::Transfer
    } else {
        SalesBucket::Unclassified
    }
}

/// Completed sales for one business date, bucketed by payment method.
///
/// Invariant: `total == round2(cash + card + transfer)` plus whatever landed
/// outside the named buckets — see [`DailySalesAggregate::from_sales`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySalesAggregate {
    pub date: BusinessDate,
    pub cash: Money,
    pub card: Money,
    pub transfer: Money,
    pub total: Money,
    pub sales: Vec<SaleSummary>,
}

impl DailySalesAggregate {
    /// Zeroed aggregate, used when the billing fetch fails and the caller
    /// degrades to a stale/empty view instead of aborting.
    pub fn empty(date: BusinessDate) -> Self {
        Self {
            date,
            cash: Money::ZERO,
            card: Money::ZERO,
            transfer: Money::ZERO,
            total: Money::ZERO,
            sales: Vec::new(),
        }
    }

    /// Bucket a list of completed sales.
    ///
    /// Unclassified methods are excluded from the named buckets but still
    /// included in `total`, so the income figure never under-reports.
    pub fn from_sales(date: BusinessDate, sales: Vec<SaleSummary>) -> Self {
        let mut cash = Money::ZERO;
        let mut card = Money::ZERO;
        let mut transfer = Money::ZERO;
        let mut total = Money::ZERO;

        for sale in &sales {
            match classify_payment_method(&sale.payment_method) {
                SalesBucket::Cash => cash = cash + sale.total_amount,
                SalesBucket::Card => card = card + sale.total_amount,
                SalesBucket::Transfer => transfer = transfer + sale.total_amount,
                SalesBucket::Unclassified => {}
            }
            total = total + sale.total_amount;
        }

        Self {
            date,
            cash,
            card,
            transfer,
            total,
            sales,
        }
    }
}

/// Fetch completed sales for `date` and bucket them.
///
/// A fetch failure is surfaced as-is; retrying is a caller concern, and the
/// caller must keep its prior aggregate rather than silently zeroing it.
pub fn aggregate_sales_for_date(
    provider: &dyn SalesProvider,
    date: BusinessDate,
) -> Result<DailySalesAggregate, SalesFetchError> {
    let sales = provider.completed_sales_on(date)?;
    Ok(DailySalesAggregate::from_sales(date, sales))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::InMemorySalesProvider;

    fn date() -> BusinessDate {
        "2026-08-29".parse().unwrap()
    }

    fn sale(method: &str, amount: &str) -> SaleSummary {
        SaleSummary {
            invoice_number: "INV-001".to_string(),
            customer_name: "Cliente".to_string(),
            customer_document: "123".to_string(),
            total_amount: amount.parse().unwrap(),
            payment_method: method.to_string(),
            items: vec![],
        }
    }

    fn m(s: &str) -> Money {
        s.parse().unwrap()
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(classify_payment_method("EFECTIVO"), SalesBucket::Cash);
        assert_eq!(classify_payment_method("Tarjeta de Crédito"), SalesBucket::Card);
        assert_eq!(classify_payment_method("transferencia"), SalesBucket::Transfer);
        assert_eq!(classify_payment_method("cheque"), SalesBucket::Unclassified);
    }

    #[test]
    fn buckets_sum_by_method() {
        let agg = DailySalesAggregate::from_sales(
            date(),
            vec![
                sale("Efectivo", "250000"),
                sale("Tarjeta", "80000"),
                sale("Transferencia", "0"),
            ],
        );
        assert_eq!(agg.cash, m("250000"));
        assert_eq!(agg.card, m("80000"));
        assert_eq!(agg.transfer, m("0"));
        assert_eq!(agg.total, m("330000"));
    }

    #[test]
    fn unclassified_methods_count_only_toward_total() {
        let agg = DailySalesAggregate::from_sales(
            date(),
            vec![sale("Efectivo", "100"), sale("Cheque", "50")],
        );
        assert_eq!(agg.cash, m("100"));
        assert_eq!(agg.card, Money::ZERO);
        assert_eq!(agg.transfer, Money::ZERO);
        assert_eq!(agg.total, m("150"));
    }

    #[test]
    fn total_equals_rounded_bucket_sum_when_all_classified() {
        let agg = DailySalesAggregate::from_sales(
            date(),
            vec![sale("Efectivo", "0.1"), sale("Tarjeta", "0.2")],
        );
        assert_eq!(agg.total, (agg.cash + agg.card + agg.transfer).round2());
        assert_eq!(agg.total, m("0.30"));
    }

    #[test]
    fn aggregate_surfaces_fetch_failure() {
        let provider = InMemorySalesProvider::new();
        provider.set_unavailable(true);
        assert!(aggregate_sales_for_date(&provider, date()).is_err());
    }

    #[test]
    fn aggregate_reads_from_provider() {
        let provider = InMemorySalesProvider::new();
        provider.put(date(), vec![sale("Efectivo", "25.50")]);
        let agg = aggregate_sales_for_date(&provider, date()).unwrap();
        assert_eq!(agg.cash, m("25.50"));
        assert_eq!(agg.sales.len(), 1);
    }
}
