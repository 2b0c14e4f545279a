use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::calc::calculator::{Calculator, Chain};
use crate::calc::context::CalculatorContext;
use crate::collab::DiscountService;
use crate::errors::CalculationError;

/// Applies the single best allowed discount to the working price.
///
/// Both the per-calculation option and the per-product flag suppress
/// discounts entirely. Percentage discounts are skipped after a tier price
/// when the calculation says so.
pub struct DiscountCalculator {
    discounts: Arc<dyn DiscountService>,
}

impl DiscountCalculator {
    pub fn new(discounts: Arc<dyn DiscountService>) -> Self {
        Self { discounts }
    }
}

#[async_trait]
impl Calculator for DiscountCalculator {
    fn name(&self) -> &'static str {
        "discount"
    }

    async fn calculate(
        &self,
        ctx: &mut CalculatorContext,
        chain: Chain<'_>,
    ) -> Result<(), CalculationError> {
        if ctx.options().ignore_discounts || ctx.product().ignore_discounts {
            return chain.next(ctx).await;
        }

        let product = Arc::clone(ctx.product());
        let customer = ctx.options().customer.clone();
        let valid_at = ctx.options().valid_at;
        let skip_percentage =
            ctx.tier_price_applied && ctx.options().ignore_percentage_discount_on_tier_prices;

        let allowed = self.discounts.get_allowed_discounts(&product, &customer).await?;
        let working_price = ctx.final_price;
        let best = allowed
            .into_iter()
            .filter(|discount| discount.is_active_at(valid_at))
            .filter(|discount| !(skip_percentage && discount.use_percentage))
            .max_by(|a, b| a.value_for(working_price).cmp(&b.value_for(working_price)));

        if let Some(discount) = best {
            let value = discount.value_for(working_price);
            if value > Decimal::ZERO {
                ctx.discount_amount += value;
                ctx.final_price -= value;
                ctx.applied_discount_ids.push(discount.id);
            }
        }

        chain.next(ctx).await
    }
}
