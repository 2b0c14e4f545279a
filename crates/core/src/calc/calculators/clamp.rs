use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::calc::calculator::{Calculator, Chain};
use crate::calc::context::CalculatorContext;
use crate::errors::CalculationError;

/// Registered last: after all other stages ran, a price can never stay
/// negative.
pub struct ClampCalculator;

#[async_trait]
impl Calculator for ClampCalculator {
    fn name(&self) -> &'static str {
        "clamp"
    }

    async fn calculate(
        &self,
        ctx: &mut CalculatorContext,
        chain: Chain<'_>,
    ) -> Result<(), CalculationError> {
        chain.next(ctx).await?;

        if ctx.final_price < Decimal::ZERO {
            ctx.final_price = Decimal::ZERO;
        }
        if ctx.regular_price < Decimal::ZERO {
            ctx.regular_price = Decimal::ZERO;
        }
        Ok(())
    }
}
