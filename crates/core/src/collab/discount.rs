use async_trait::async_trait;

use crate::domain::customer::Customer;
use crate::domain::discount::Discount;
use crate::domain::product::Product;
use crate::errors::CalculationError;

/// Discount resolution collaborator.
///
/// Returns every discount whose assignment matches the product/customer
/// pair. Validity windows are deliberately left to the caller, which checks
/// them against the calculation's fixed `valid_at` instant so a price stays
/// reproducible.
#[async_trait]
pub trait DiscountService: Send + Sync {
    async fn get_allowed_discounts(
        &self,
        product: &Product,
        customer: &Customer,
    ) -> Result<Vec<Discount>, CalculationError>;
}

/// Scope matching over an in-memory discount set.
#[derive(Default)]
pub struct CatalogDiscountService {
    discounts: Vec<Discount>,
}

impl CatalogDiscountService {
    pub fn new(discounts: Vec<Discount>) -> Self {
        Self { discounts }
    }
}

#[async_trait]
impl DiscountService for CatalogDiscountService {
    async fn get_allowed_discounts(
        &self,
        product: &Product,
        customer: &Customer,
    ) -> Result<Vec<Discount>, CalculationError> {
        Ok(self
            .discounts
            .iter()
            .filter(|discount| discount.applies_to(product, customer))
            .cloned()
            .collect())
    }
}
