//! Process configuration.

use cuadre_money::Money;

/// Store-level settings consumed by the drawer engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    /// Default starting float for a newly opened drawer.
    pub initial_cash_balance: Money,
}

impl StoreSettings {
    /// Read settings from the environment.
    ///
    /// `CUADRE_INITIAL_CASH_BALANCE` holds the default float as a decimal
    /// string; unset or unparsable values fall back to zero with a warning.
    pub fn from_env() -> Self {
        let initial_cash_balance = match std::env::var("CUADRE_INITIAL_CASH_BALANCE") {
            Ok(raw) => match raw.parse::<Money>() {
                Ok(amount) if !amount.is_negative() => amount,
                Ok(_) => {
                    tracing::warn!("CUADRE_INITIAL_CASH_BALANCE is negative; using 0.00");
                    Money::ZERO
                }
                Err(e) => {
                    tracing::warn!("CUADRE_INITIAL_CASH_BALANCE is not a number ({e}); using 0.00");
                    Money::ZERO
                }
            },
            Err(_) => Money::ZERO,
        };

        Self {
            initial_cash_balance,
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            initial_cash_balance: Money::ZERO,
        }
    }
}
