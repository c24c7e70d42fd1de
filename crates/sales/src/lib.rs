//! `cuadre-sales` — the billing boundary: daily sales aggregation.
//!
//! The reconciliation engine never sees individual invoices being built; it
//! consumes a per-date aggregate of completed sales, bucketed by payment
//! method. The aggregate is a borrowed view, recomputed on demand and never
//! persisted here.

pub mod aggregate;
pub mod provider;

pub use aggregate::{
    aggregate_sales_for_date, classify_payment_method, DailySalesAggregate, SaleItem, SaleSummary,
    SalesBucket,
};
pub use provider::{InMemorySalesProvider, SalesFetchError, SalesProvider};
