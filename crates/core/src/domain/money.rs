use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A currency known to the store, with the exchange rate from the primary
/// store currency and the minor-unit precision used for rounding.
///
/// All monetary math runs on `rust_decimal` values; floats never touch a
/// price. `rate_from_primary` is the number of units of this currency per one
/// unit of the primary currency (so the primary currency itself carries a
/// rate of 1).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
    pub minor_unit_digits: u32,
    pub rate_from_primary: Decimal,
}

impl Currency {
    pub fn new(code: impl Into<String>, minor_unit_digits: u32, rate_from_primary: Decimal) -> Self {
        Self { code: code.into(), minor_unit_digits, rate_from_primary }
    }

    /// Rounds to this currency's minor-unit precision, midpoint away from zero.
    pub fn round(&self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.minor_unit_digits, RoundingStrategy::MidpointAwayFromZero)
    }
}

/// An amount expressed in a concrete display currency.
///
/// Raw pipeline amounts stay plain `Decimal`s in the primary store currency;
/// `Money` only appears on the output side, after the finalize step converted
/// and rounded everything exactly once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: Decimal,
    pub currency: String,
}

impl Money {
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self { amount, currency: currency.into() }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}
