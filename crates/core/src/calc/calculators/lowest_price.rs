use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::calc::calculator::{Calculator, Chain};
use crate::calc::context::CalculatorContext;
use crate::calc::tier::lowest_tier_price;
use crate::errors::CalculationError;

/// Determines the lowest attainable price, on request, once the rest of the
/// chain has settled the working price. Considers the finished price and
/// the whole tier ladder.
pub struct LowestPriceCalculator;

#[async_trait]
impl Calculator for LowestPriceCalculator {
    fn name(&self) -> &'static str {
        "lowest_price"
    }

    async fn calculate(
        &self,
        ctx: &mut CalculatorContext,
        chain: Chain<'_>,
    ) -> Result<(), CalculationError> {
        chain.next(ctx).await?;

        if !ctx.options().determine_lowest_price {
            return Ok(());
        }

        let product = Arc::clone(ctx.product());
        let mut lowest = ctx.final_price;
        if let Some(tier_low) = lowest_tier_price(&product.tier_prices, ctx.regular_price) {
            if tier_low < lowest {
                lowest = tier_low;
            }
        }
        if lowest < Decimal::ZERO {
            lowest = Decimal::ZERO;
        }

        if ctx.lowest_price.map_or(true, |current| lowest < current) {
            ctx.lowest_price = Some(lowest);
        }
        if !product.tier_prices.is_empty() && lowest < ctx.final_price {
            ctx.has_price_range = true;
        }
        Ok(())
    }
}
