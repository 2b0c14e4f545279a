use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::calc::calculator::{Calculator, Chain};
use crate::calc::context::CalculatorContext;
use crate::errors::CalculationError;

/// Prices a grouped product as the lowest of its associates, each computed
/// through an independent nested pipeline. Short-circuits the chain when
/// associates exist; a grouped product without associates falls through to
/// the normal stages.
pub struct GroupedProductCalculator;

#[async_trait]
impl Calculator for GroupedProductCalculator {
    fn name(&self) -> &'static str {
        "grouped_product"
    }

    async fn calculate(
        &self,
        ctx: &mut CalculatorContext,
        chain: Chain<'_>,
    ) -> Result<(), CalculationError> {
        let product = Arc::clone(ctx.product());
        if product.associated.is_empty() {
            return chain.next(ctx).await;
        }

        let mut lowest: Option<Decimal> = None;
        let mut highest: Option<Decimal> = None;
        for associate_id in &product.associated {
            let child = chain.calculate_child(associate_id, ctx, None).await?;
            let price = child.final_price;
            lowest = Some(lowest.map_or(price, |current: Decimal| current.min(price)));
            highest = Some(highest.map_or(price, |current: Decimal| current.max(price)));
        }

        if let (Some(lowest), Some(highest)) = (lowest, highest) {
            ctx.regular_price = lowest;
            ctx.final_price = lowest;
            ctx.has_price_range = lowest < highest;
            if ctx.options().determine_lowest_price {
                ctx.lowest_price = Some(lowest);
            }
        }
        Ok(())
    }
}
