use async_trait::async_trait;
use std::sync::Arc;

use crate::calc::calculator::{Calculator, Chain};
use crate::calc::context::CalculatorContext;
use crate::calc::tier::resolve_tier_price;
use crate::errors::CalculationError;

/// Resolves the product's quantity-price ladder against the requested
/// quantity. A qualifying tier replaces the working price only when it is
/// cheaper, and flags the context for the tier/discount interaction options.
pub struct TierPriceCalculator;

#[async_trait]
impl Calculator for TierPriceCalculator {
    fn name(&self) -> &'static str {
        "tier_price"
    }

    async fn calculate(
        &self,
        ctx: &mut CalculatorContext,
        chain: Chain<'_>,
    ) -> Result<(), CalculationError> {
        let product = Arc::clone(ctx.product());
        if let Some(candidate) =
            resolve_tier_price(&product.tier_prices, ctx.quantity(), ctx.regular_price)
        {
            if candidate < ctx.final_price {
                ctx.final_price = candidate;
                ctx.tier_price_applied = true;
            }
        }
        chain.next(ctx).await
    }
}
