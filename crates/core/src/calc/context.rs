use std::sync::Arc;

use rust_decimal::Decimal;

use crate::calc::calculator::Calculator;
use crate::calc::options::CalculationOptions;
use crate::domain::discount::DiscountId;
use crate::domain::product::{BundleItem, Product, ProductId};
use crate::errors::CalculationError;

/// A raw attribute surcharge accumulated during the pipeline run. Converted
/// to money only at finalize time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributePriceAdjustment {
    pub attribute_id: String,
    pub value_id: String,
    pub label: String,
    pub raw_amount: Decimal,
}

/// The mutable accumulator threaded through the calculator chain.
///
/// Exclusively owned by one logical calculation; nested child products get a
/// fresh context of their own. Product, quantity and options are fixed at
/// construction; calculators adjust only the price fields. Every monetary
/// field stays a raw decimal in the primary store currency until the
/// finalize step converts it exactly once.
pub struct CalculatorContext {
    product: Arc<Product>,
    quantity: u32,
    options: CalculationOptions,
    selected_attribute_values: Vec<String>,
    ancestors: Vec<ProductId>,

    /// List price before any discount or tier adjustment.
    pub regular_price: Decimal,
    /// Active special price, when its window matched.
    pub offer_price: Option<Decimal>,
    /// Price implied by the preselected attribute combination.
    pub preselected_price: Option<Decimal>,
    /// Lowest attainable price, filled on request.
    pub lowest_price: Option<Decimal>,
    /// Cumulative discount; starts at zero, never shrinks within a run.
    pub discount_amount: Decimal,
    /// The running price. Authoritative output of the pipeline.
    pub final_price: Decimal,
    pub applied_discount_ids: Vec<DiscountId>,
    pub attribute_adjustments: Vec<AttributePriceAdjustment>,
    pub has_price_range: bool,
    /// Set when a tier price replaced the working price; consulted by the
    /// discount and attribute stages for their interaction options.
    pub tier_price_applied: bool,
    /// Explicit calculator override, bypassing factory resolution.
    pub calculators: Option<Arc<[Arc<dyn Calculator>]>>,
    /// Set when this context prices one component of a bundle.
    pub bundle_item: Option<BundleItem>,
}

impl std::fmt::Debug for CalculatorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalculatorContext")
            .field("product", &self.product)
            .field("quantity", &self.quantity)
            .field("selected_attribute_values", &self.selected_attribute_values)
            .field("ancestors", &self.ancestors)
            .field("regular_price", &self.regular_price)
            .field("offer_price", &self.offer_price)
            .field("preselected_price", &self.preselected_price)
            .field("lowest_price", &self.lowest_price)
            .field("discount_amount", &self.discount_amount)
            .field("final_price", &self.final_price)
            .field("applied_discount_ids", &self.applied_discount_ids)
            .field("attribute_adjustments", &self.attribute_adjustments)
            .field("has_price_range", &self.has_price_range)
            .field("tier_price_applied", &self.tier_price_applied)
            .field("bundle_item", &self.bundle_item)
            .finish_non_exhaustive()
    }
}

impl CalculatorContext {
    pub fn new(
        product: Arc<Product>,
        quantity: u32,
        options: CalculationOptions,
    ) -> Result<Self, CalculationError> {
        if quantity == 0 {
            return Err(CalculationError::InvalidArgument {
                argument: "quantity",
                reason: "quantity must be at least 1".to_owned(),
            });
        }
        let seed = product.price;
        Ok(Self {
            product,
            quantity,
            options,
            selected_attribute_values: Vec::new(),
            ancestors: Vec::new(),
            regular_price: seed,
            offer_price: None,
            preselected_price: None,
            lowest_price: None,
            discount_amount: Decimal::ZERO,
            final_price: seed,
            applied_discount_ids: Vec::new(),
            attribute_adjustments: Vec::new(),
            has_price_range: false,
            tier_price_applied: false,
            calculators: None,
            bundle_item: None,
        })
    }

    pub fn with_selected_attributes(mut self, value_ids: Vec<String>) -> Self {
        self.selected_attribute_values = value_ids;
        self
    }

    pub fn product(&self) -> &Arc<Product> {
        &self.product
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn options(&self) -> &CalculationOptions {
        &self.options
    }

    pub fn selected_attribute_values(&self) -> &[String] {
        &self.selected_attribute_values
    }

    /// A fresh context for a nested child product, guarding against direct
    /// self-reference and indirect cycles through the ancestor chain.
    pub(crate) fn child(&self, product: Arc<Product>) -> Result<Self, CalculationError> {
        if product.id == self.product.id {
            return Err(CalculationError::SelfReferencingProduct(product.id.clone()));
        }
        if self.ancestors.contains(&product.id) {
            let mut path: Vec<String> =
                self.ancestors.iter().map(|id| id.0.clone()).collect();
            path.push(self.product.id.0.clone());
            path.push(product.id.0.clone());
            return Err(CalculationError::CircularProductReference { path: path.join(" -> ") });
        }

        let mut ancestors = self.ancestors.clone();
        ancestors.push(self.product.id.clone());

        let mut child = Self::new(product, 1, self.options.for_child())?;
        child.ancestors = ancestors;
        Ok(child)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::CalculatorContext;
    use crate::calc::options::CalculationOptions;
    use crate::domain::customer::{Customer, StoreId};
    use crate::domain::money::Currency;
    use crate::domain::product::Product;
    use crate::errors::CalculationError;

    fn options() -> CalculationOptions {
        let eur = Currency::new("EUR", 2, Decimal::ONE);
        CalculationOptions::new(
            Customer::new("c-1"),
            StoreId("main".to_owned()),
            eur.clone(),
            eur,
            Utc::now(),
        )
    }

    #[test]
    fn context_seeds_prices_from_the_product() {
        let product = Arc::new(Product::simple("widget", Decimal::new(4999, 2)));
        let ctx = CalculatorContext::new(product, 1, options()).unwrap();

        assert_eq!(ctx.regular_price, Decimal::new(4999, 2));
        assert_eq!(ctx.final_price, Decimal::new(4999, 2));
        assert_eq!(ctx.discount_amount, Decimal::ZERO);
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let product = Arc::new(Product::simple("widget", Decimal::TEN));
        let error = CalculatorContext::new(product, 0, options()).unwrap_err();
        assert!(matches!(error, CalculationError::InvalidArgument { argument: "quantity", .. }));
    }

    #[test]
    fn child_of_itself_is_rejected() {
        let product = Arc::new(Product::simple("widget", Decimal::TEN));
        let ctx = CalculatorContext::new(Arc::clone(&product), 1, options()).unwrap();

        let error = ctx.child(product).unwrap_err();
        assert!(matches!(error, CalculationError::SelfReferencingProduct(_)));
    }

    #[test]
    fn indirect_cycle_is_rejected_through_the_ancestor_chain() {
        let a = Arc::new(Product::simple("kit-a", Decimal::TEN));
        let b = Arc::new(Product::simple("kit-b", Decimal::TEN));

        let root = CalculatorContext::new(Arc::clone(&a), 1, options()).unwrap();
        let middle = root.child(Arc::clone(&b)).unwrap();
        let error = middle.child(a).unwrap_err();

        assert!(matches!(error, CalculationError::CircularProductReference { path } if path == "kit-a -> kit-b -> kit-a"));
    }
}
