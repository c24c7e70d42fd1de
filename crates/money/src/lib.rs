//! `cuadre-money` — fixed-precision monetary arithmetic.
//!
//! Every monetary figure the reconciliation engine produces is user-visible
//! on a printed closure sheet, so sums and differences must never show
//! binary floating point drift. `Money` wraps [`rust_decimal::Decimal`] and
//! re-rounds on every addition and subtraction, which makes "all arithmetic
//! passes through `round2`" a property of the type rather than a discipline
//! call sites have to remember.

use core::ops::{Add, Neg, Sub};
use core::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Monetary amount, always held at 2 decimal places (round-half-up).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Wrap a raw decimal, normalizing to 2 decimal places.
    pub fn new(amount: Decimal) -> Self {
        Self(round2(amount))
    }

    /// Convert from a JSON-level float. `None` for non-finite input; this is
    /// the "non-numeric" rejection path for API payloads.
    pub fn from_f64(value: f64) -> Option<Self> {
        Decimal::from_f64_retain(value).map(Self::new)
    }

    /// Lossy conversion for response payloads. Safe at 2 decimal places.
    pub fn to_f64(self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    /// Round-half-up to 2 decimal places. Idempotent.
    pub fn round2(self) -> Self {
        Self(round2(self.0))
    }

    /// Epsilon comparison (|x| < 0.001) instead of exact equality.
    ///
    /// The closure difference is a derived quantity; exact equality would
    /// surface residual rounding noise as a false "Faltante"/"Sobrante".
    pub fn is_zero_eps(self) -> bool {
        self.0.abs() < Decimal::new(1, 3)
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn is_positive(self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Floor at zero. The consign amount must never go negative.
    pub fn max_zero(self) -> Self {
        if self.is_negative() { Self::ZERO } else { self }
    }
}

fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money::new(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money::new(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money::new(-self.0)
    }
}

impl core::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s).map(Money::new)
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Money::new(Decimal::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn m(s: &str) -> Money {
        s.parse().unwrap()
    }

    #[test]
    fn one_tenth_plus_two_tenths_is_exactly_three_tenths() {
        assert_eq!(m("0.1") + m("0.2"), m("0.30"));
    }

    #[test]
    fn rounds_half_up_on_the_decimal_representation() {
        assert_eq!(Money::new("2.675".parse().unwrap()), m("2.68"));
        assert_eq!(Money::new("0.005".parse().unwrap()), m("0.01"));
        assert_eq!(Money::new("-0.005".parse().unwrap()), m("-0.01"));
        assert_eq!(Money::new("1.004".parse().unwrap()), m("1.00"));
    }

    #[test]
    fn epsilon_zero_check() {
        // Construction normalizes to 2 decimal places, so sub-cent noise
        // collapses to an exact match.
        assert!((m("100.0009") - m("100")).is_zero_eps());
        assert!(Money::ZERO.is_zero_eps());
        assert!(!m("0.01").is_zero_eps());
        assert!(!m("-0.01").is_zero_eps());
    }

    #[test]
    fn max_zero_floors_negative_amounts() {
        assert_eq!(m("-20").max_zero(), Money::ZERO);
        assert_eq!(m("20").max_zero(), m("20"));
    }

    #[test]
    fn from_f64_rejects_non_finite_input() {
        assert!(Money::from_f64(f64::NAN).is_none());
        assert!(Money::from_f64(f64::INFINITY).is_none());
        assert_eq!(Money::from_f64(150.0).unwrap(), m("150"));
    }

    proptest! {
        /// round2 is idempotent for any representable amount.
        #[test]
        fn round2_is_idempotent(cents in -1_000_000_000i64..1_000_000_000i64) {
            let x = Money::new(Decimal::new(cents, 3));
            prop_assert_eq!(x.round2(), x);
        }

        /// Addition stays at 2 decimal places and agrees with integer cents.
        #[test]
        fn addition_matches_integer_cents(a in -1_000_000i64..1_000_000i64,
                                          b in -1_000_000i64..1_000_000i64) {
            let sum = Money::new(Decimal::new(a, 2)) + Money::new(Decimal::new(b, 2));
            prop_assert_eq!(sum, Money::new(Decimal::new(a + b, 2)));
        }
    }
}
