use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::money::{Currency, Money};
use crate::errors::CalculationError;

/// Currency collaborator. Conversion always starts from the primary store
/// currency; the pipeline never carries amounts in any other currency.
#[async_trait]
pub trait CurrencyService: Send + Sync {
    fn primary_currency(&self) -> &Currency;

    async fn convert_from_primary(
        &self,
        amount: Decimal,
        target: &Currency,
    ) -> Result<Money, CalculationError>;

    /// Display post-formatting that annotates tax inclusivity.
    fn apply_tax_format(&self, money: &Money, inclusive: bool) -> String {
        if inclusive {
            format!("{money} incl. tax")
        } else {
            format!("{money} excl. tax")
        }
    }
}

/// Converts with the fixed `rate_from_primary` carried on each currency and
/// rounds to the target's minor units.
pub struct FixedRateCurrencyService {
    primary: Currency,
}

impl FixedRateCurrencyService {
    pub fn new(primary: Currency) -> Self {
        Self { primary }
    }
}

#[async_trait]
impl CurrencyService for FixedRateCurrencyService {
    fn primary_currency(&self) -> &Currency {
        &self.primary
    }

    async fn convert_from_primary(
        &self,
        amount: Decimal,
        target: &Currency,
    ) -> Result<Money, CalculationError> {
        if target.code == self.primary.code {
            return Ok(Money::new(amount, target.code.clone()));
        }
        if target.rate_from_primary <= Decimal::ZERO {
            return Err(CalculationError::MissingCollaboratorData(format!(
                "no exchange rate from {} to {}",
                self.primary.code, target.code
            )));
        }
        let converted = target.round(amount * target.rate_from_primary);
        Ok(Money::new(converted, target.code.clone()))
    }
}
