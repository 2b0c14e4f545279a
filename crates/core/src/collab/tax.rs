use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::customer::Customer;
use crate::domain::money::Currency;
use crate::domain::product::Product;
use crate::errors::CalculationError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate {
    pub percent: Decimal,
    pub category: Option<String>,
}

impl TaxRate {
    pub fn new(percent: Decimal) -> Self {
        Self { percent, category: None }
    }

    pub fn zero() -> Self {
        Self::new(Decimal::ZERO)
    }
}

/// The outcome of applying a tax rate to a single amount.
///
/// `price` is the amount the caller should continue with, already honoring
/// the requested inclusivity and rounded to the rounding currency.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tax {
    pub rate: TaxRate,
    pub amount: Decimal,
    pub price: Decimal,
    pub is_gross: bool,
    pub inclusive: bool,
}

/// Tax collaborator. Rate lookup is the only I/O-shaped operation; the two
/// tax formulas are pure and shared by every implementation.
#[async_trait]
pub trait TaxService: Send + Sync {
    async fn get_tax_rate(
        &self,
        product: &Product,
        customer: &Customer,
    ) -> Result<TaxRate, CalculationError>;

    /// Splits a gross amount into net and tax.
    fn calculate_tax_from_gross(
        &self,
        amount: Decimal,
        rate: &TaxRate,
        inclusive: bool,
        rounding_currency: &Currency,
    ) -> Tax {
        let divisor = Decimal::ONE_HUNDRED + rate.percent;
        let tax_amount = if divisor.is_zero() {
            Decimal::ZERO
        } else {
            rounding_currency.round(amount * rate.percent / divisor)
        };
        let price = if inclusive { amount } else { amount - tax_amount };
        Tax {
            rate: rate.clone(),
            amount: tax_amount,
            price: rounding_currency.round(price),
            is_gross: true,
            inclusive,
        }
    }

    /// Adds tax on top of a net amount.
    fn calculate_tax_from_net(
        &self,
        amount: Decimal,
        rate: &TaxRate,
        inclusive: bool,
        rounding_currency: &Currency,
    ) -> Tax {
        let tax_amount = rounding_currency.round(amount * rate.percent / Decimal::ONE_HUNDRED);
        let price = if inclusive { amount + tax_amount } else { amount };
        Tax {
            rate: rate.clone(),
            amount: tax_amount,
            price: rounding_currency.round(price),
            is_gross: false,
            inclusive,
        }
    }
}

/// Rate table keyed by tax category, with a fallback rate for uncategorized
/// products. Tax-exempt customers always resolve to a zero rate.
pub struct DeterministicTaxService {
    rates: HashMap<String, Decimal>,
    fallback_percent: Decimal,
}

impl DeterministicTaxService {
    pub fn new(rates: HashMap<String, Decimal>, fallback_percent: Decimal) -> Self {
        Self { rates, fallback_percent }
    }

    pub fn flat(percent: Decimal) -> Self {
        Self::new(HashMap::new(), percent)
    }

    pub fn untaxed() -> Self {
        Self::flat(Decimal::ZERO)
    }
}

#[async_trait]
impl TaxService for DeterministicTaxService {
    async fn get_tax_rate(
        &self,
        product: &Product,
        customer: &Customer,
    ) -> Result<TaxRate, CalculationError> {
        if customer.tax_exempt {
            return Ok(TaxRate::zero());
        }
        let percent = product
            .tax_category
            .as_ref()
            .and_then(|category| self.rates.get(category).copied())
            .unwrap_or(self.fallback_percent);
        Ok(TaxRate { percent, category: product.tax_category.clone() })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{DeterministicTaxService, TaxRate, TaxService};
    use crate::domain::customer::Customer;
    use crate::domain::money::Currency;
    use crate::domain::product::Product;

    fn eur() -> Currency {
        Currency::new("EUR", 2, Decimal::ONE)
    }

    #[test]
    fn tax_from_gross_splits_amount() {
        let service = DeterministicTaxService::untaxed();
        let rate = TaxRate::new(Decimal::from(19));
        let tax = service.calculate_tax_from_gross(Decimal::from(119), &rate, false, &eur());

        assert_eq!(tax.amount, Decimal::from(19));
        assert_eq!(tax.price, Decimal::from(100));
        assert!(tax.is_gross);
    }

    #[test]
    fn tax_from_gross_keeps_amount_when_inclusive() {
        let service = DeterministicTaxService::untaxed();
        let rate = TaxRate::new(Decimal::from(19));
        let tax = service.calculate_tax_from_gross(Decimal::from(119), &rate, true, &eur());

        assert_eq!(tax.price, Decimal::from(119));
    }

    #[test]
    fn tax_from_net_adds_on_top_when_inclusive() {
        let service = DeterministicTaxService::untaxed();
        let rate = TaxRate::new(Decimal::from(19));
        let tax = service.calculate_tax_from_net(Decimal::from(100), &rate, true, &eur());

        assert_eq!(tax.amount, Decimal::from(19));
        assert_eq!(tax.price, Decimal::from(119));
        assert!(!tax.is_gross);
    }

    #[tokio::test]
    async fn exempt_customer_resolves_to_zero_rate() {
        let service = DeterministicTaxService::flat(Decimal::from(19));
        let product = Product::simple("widget", Decimal::from(10));
        let mut customer = Customer::new("c-1");
        customer.tax_exempt = true;

        let rate = service.get_tax_rate(&product, &customer).await.unwrap();
        assert_eq!(rate.percent, Decimal::ZERO);
    }

    #[tokio::test]
    async fn categorized_product_uses_its_category_rate() {
        let mut rates = std::collections::HashMap::new();
        rates.insert("reduced".to_owned(), Decimal::from(7));
        let service = DeterministicTaxService::new(rates, Decimal::from(19));

        let mut product = Product::simple("book", Decimal::from(10));
        product.tax_category = Some("reduced".to_owned());
        let customer = Customer::new("c-1");

        let rate = service.get_tax_rate(&product, &customer).await.unwrap();
        assert_eq!(rate.percent, Decimal::from(7));
    }
}
