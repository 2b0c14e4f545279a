use async_trait::async_trait;
use std::sync::Arc;

use crate::calc::calculator::{Calculator, Chain};
use crate::calc::context::CalculatorContext;
use crate::errors::CalculationError;

/// Applies the product's special/offer price when its validity window
/// matches the calculation instant. The offer only lowers the working
/// price, never raises it.
pub struct OfferPriceCalculator;

#[async_trait]
impl Calculator for OfferPriceCalculator {
    fn name(&self) -> &'static str {
        "offer_price"
    }

    async fn calculate(
        &self,
        ctx: &mut CalculatorContext,
        chain: Chain<'_>,
    ) -> Result<(), CalculationError> {
        let product = Arc::clone(ctx.product());
        if let Some(offer) = &product.offer {
            if offer.is_active_at(ctx.options().valid_at) {
                ctx.offer_price = Some(offer.price);
                if offer.price < ctx.final_price {
                    ctx.final_price = offer.price;
                }
            }
        }
        chain.next(ctx).await
    }
}
