use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

use cuadre_core::BusinessDate;

use crate::aggregate::SaleSummary;

/// Billing fetch failure. Non-fatal to viewing an already-open record;
/// fatal to completing a close (never freeze a snapshot with unknown income).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SalesFetchError {
    #[error("billing backend unavailable: {0}")]
    Unavailable(String),
}

/// Boundary to the billing subsystem.
///
/// Implementations fetch sales with status `completed` whose date equals the
/// requested business date. The engine performs no retries of its own.
pub trait SalesProvider: Send + Sync {
    fn completed_sales_on(&self, date: BusinessDate) -> Result<Vec<SaleSummary>, SalesFetchError>;
}

/// In-memory provider for dev and tests.
#[derive(Debug, Default)]
pub struct InMemorySalesProvider {
    sales: RwLock<HashMap<BusinessDate, Vec<SaleSummary>>>,
    unavailable: RwLock<bool>,
}

impl InMemorySalesProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the completed sales recorded for a date.
    pub fn put(&self, date: BusinessDate, sales: Vec<SaleSummary>) {
        if let Ok(mut map) = self.sales.write() {
            map.insert(date, sales);
        }
    }

    /// Simulate a billing outage (fetches fail until cleared).
    pub fn set_unavailable(&self, down: bool) {
        if let Ok(mut flag) = self.unavailable.write() {
            *flag = down;
        }
    }
}

impl SalesProvider for InMemorySalesProvider {
    fn completed_sales_on(&self, date: BusinessDate) -> Result<Vec<SaleSummary>, SalesFetchError> {
        if self.unavailable.read().map(|f| *f).unwrap_or(false) {
            return Err(SalesFetchError::Unavailable(
                "simulated billing outage".to_string(),
            ));
        }

        let map = self
            .sales
            .read()
            .map_err(|_| SalesFetchError::Unavailable("sales lock poisoned".to_string()))?;
        Ok(map.get(&date).cloned().unwrap_or_default())
    }
}
