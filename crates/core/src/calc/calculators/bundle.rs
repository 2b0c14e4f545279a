use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::calc::calculator::{Calculator, Chain};
use crate::calc::context::CalculatorContext;
use crate::errors::CalculationError;

/// Aggregates a per-item-priced bundle: each component runs its own nested
/// pipeline, the component results are scaled by quantity and summed, and
/// the chain is short-circuited. Bundles priced as a whole fall through to
/// the normal stages instead.
pub struct BundleCalculator;

#[async_trait]
impl Calculator for BundleCalculator {
    fn name(&self) -> &'static str {
        "bundle"
    }

    async fn calculate(
        &self,
        ctx: &mut CalculatorContext,
        chain: Chain<'_>,
    ) -> Result<(), CalculationError> {
        let product = Arc::clone(ctx.product());
        if !product.bundle_per_item_pricing || product.bundle_items.is_empty() {
            return chain.next(ctx).await;
        }

        let mut final_total = Decimal::ZERO;
        let mut regular_total = Decimal::ZERO;
        let mut discount_total = Decimal::ZERO;

        for item in &product.bundle_items {
            let configure = |child: &mut CalculatorContext| {
                child.bundle_item = Some(item.clone());
            };
            let child = chain.calculate_child(&item.product_id, ctx, Some(&configure)).await?;

            let quantity = Decimal::from(item.quantity.max(1));
            let mut unit_price = child.final_price;
            let mut unit_discount = child.discount_amount;
            if let Some(percent) = item.discount_percent {
                let item_discount = unit_price * percent / Decimal::ONE_HUNDRED;
                unit_price -= item_discount;
                unit_discount += item_discount;
            }

            final_total += unit_price * quantity;
            regular_total += child.regular_price * quantity;
            discount_total += unit_discount * quantity;
        }

        ctx.regular_price = regular_total;
        ctx.final_price = final_total;
        ctx.discount_amount = discount_total;
        Ok(())
    }
}
