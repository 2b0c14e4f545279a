use async_trait::async_trait;

use crate::calc::calculator::{Calculator, Chain};
use crate::calc::context::CalculatorContext;
use crate::errors::CalculationError;

/// Short-circuits the entire pipeline for products where the customer names
/// the price. The context keeps its seed values; the host substitutes the
/// entered amount downstream of the engine.
pub struct CustomerEnteredPriceCalculator;

#[async_trait]
impl Calculator for CustomerEnteredPriceCalculator {
    fn name(&self) -> &'static str {
        "customer_entered_price"
    }

    async fn calculate(
        &self,
        ctx: &mut CalculatorContext,
        chain: Chain<'_>,
    ) -> Result<(), CalculationError> {
        if ctx.product().customer_enters_price {
            return Ok(());
        }
        chain.next(ctx).await
    }
}
