use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::calc::calculator::{Calculator, Chain};
use crate::calc::context::{AttributePriceAdjustment, CalculatorContext};
use crate::collab::{AttributeMaterializer, SelectedAttributeValue};
use crate::errors::CalculationError;

/// Accumulates the price adjustments of the selected (or preselected)
/// attribute values onto the working price.
///
/// Percent adjustments normally apply against the working price; when a tier
/// price was applied and the calculation opts out of percentage tier
/// interaction, they fall back to the regular price.
pub struct AttributePriceCalculator {
    materializer: Arc<dyn AttributeMaterializer>,
}

impl AttributePriceCalculator {
    pub fn new(materializer: Arc<dyn AttributeMaterializer>) -> Self {
        Self { materializer }
    }

    fn raw_adjustment(value: &SelectedAttributeValue, percent_base: Decimal) -> Decimal {
        if value.adjustment_is_percent {
            percent_base * value.price_adjustment / Decimal::ONE_HUNDRED
        } else {
            value.price_adjustment
        }
    }
}

#[async_trait]
impl Calculator for AttributePriceCalculator {
    fn name(&self) -> &'static str {
        "attribute_price"
    }

    async fn calculate(
        &self,
        ctx: &mut CalculatorContext,
        chain: Chain<'_>,
    ) -> Result<(), CalculationError> {
        let product = Arc::clone(ctx.product());
        let selection = ctx.selected_attribute_values().to_vec();
        let include_preselected = ctx.options().apply_preselected_attributes;

        let values =
            self.materializer.materialize(&product, &selection, include_preselected).await?;
        if !values.is_empty() {
            let percent_base = if ctx.tier_price_applied
                && ctx.options().ignore_percentage_tier_prices_on_attribute_price_adjustments
            {
                ctx.regular_price
            } else {
                ctx.final_price
            };

            let mut total = Decimal::ZERO;
            for value in &values {
                let raw = Self::raw_adjustment(value, percent_base);
                total += raw;
                ctx.attribute_adjustments.push(AttributePriceAdjustment {
                    attribute_id: value.attribute_id.clone(),
                    value_id: value.value_id.clone(),
                    label: value.label.clone(),
                    raw_amount: raw,
                });
            }
            ctx.final_price += total;
        }

        if ctx.options().determine_preselected_price {
            let preselected = self.materializer.materialize(&product, &[], true).await?;
            let total: Decimal = preselected
                .iter()
                .map(|value| Self::raw_adjustment(value, ctx.regular_price))
                .sum();
            ctx.preselected_price = Some(ctx.regular_price + total);
        }

        chain.next(ctx).await
    }
}
