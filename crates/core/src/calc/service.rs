use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::calc::context::CalculatorContext;
use crate::calc::options::CalculationOptions;
use crate::calc::pipeline::CalculatorPipeline;
use crate::collab::{CurrencyService, Tax, TaxRate, TaxService};
use crate::domain::discount::DiscountId;
use crate::domain::money::Money;
use crate::domain::product::{Product, ProductId};
use crate::errors::CalculationError;

/// Input of one top-level price calculation.
pub struct CalculationRequest {
    pub product: Arc<Product>,
    pub quantity: u32,
    pub selected_attribute_values: Vec<String>,
    pub options: CalculationOptions,
}

impl CalculationRequest {
    pub fn new(product: Arc<Product>, quantity: u32, options: CalculationOptions) -> Self {
        Self { product, quantity, selected_attribute_values: Vec::new(), options }
    }

    pub fn with_selected_attributes(mut self, value_ids: Vec<String>) -> Self {
        self.selected_attribute_values = value_ids;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PriceSaving {
    pub has_saving: bool,
    /// The reference price the saving is measured against.
    pub saving_price: Money,
    pub saving_percent: Decimal,
    pub saving_amount: Option<Money>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConvertedAttributeAdjustment {
    pub attribute_id: String,
    pub value_id: String,
    pub label: String,
    pub amount: Money,
}

/// The immutable output of a calculation: every amount tax-adjusted,
/// converted to the target currency and rounded exactly once.
#[derive(Clone, Debug, Serialize)]
pub struct CalculatedPrice {
    pub product_id: ProductId,
    pub quantity: u32,
    pub currency: String,
    pub regular_price: Money,
    pub offer_price: Option<Money>,
    pub preselected_price: Option<Money>,
    pub lowest_price: Option<Money>,
    pub discount_amount: Money,
    pub final_price: Money,
    /// Display text for the final price, tax-annotated and wrapped in the
    /// price-range template when the result represents a range.
    pub final_price_text: Option<String>,
    pub has_price_range: bool,
    pub tax: Option<Tax>,
    pub attribute_adjustments: Vec<ConvertedAttributeAdjustment>,
    pub applied_discount_ids: Vec<DiscountId>,
    pub saving: PriceSaving,
}

struct ConvertedAmount {
    money: Money,
    tax: Option<Tax>,
    text: Option<String>,
}

/// Orchestrates a calculation: builds the context, runs the pipeline, then
/// turns the raw decimal accumulator into a `CalculatedPrice`.
///
/// The finalize step is strictly linear. Raw amounts stay in the primary
/// store currency until here; tax and currency conversion happen exactly
/// once, at this boundary.
pub struct PriceCalculationService {
    pipeline: Arc<CalculatorPipeline>,
    tax: Arc<dyn TaxService>,
    currency: Arc<dyn CurrencyService>,
}

impl PriceCalculationService {
    pub fn new(
        pipeline: Arc<CalculatorPipeline>,
        tax: Arc<dyn TaxService>,
        currency: Arc<dyn CurrencyService>,
    ) -> Self {
        Self { pipeline, tax, currency }
    }

    /// The unit price for the requested quantity.
    pub async fn calculate_price(
        &self,
        request: CalculationRequest,
    ) -> Result<CalculatedPrice, CalculationError> {
        self.calculate(request, false).await
    }

    /// The line subtotal: the rounded unit price multiplied by the quantity.
    ///
    /// Rounding each unit amount before multiplying keeps the subtotal equal
    /// to the sum of the displayed unit prices; the residual mismatch against
    /// a multiply-then-round subtotal is accepted.
    pub async fn calculate_subtotal(
        &self,
        request: CalculationRequest,
    ) -> Result<CalculatedPrice, CalculationError> {
        self.calculate(request, true).await
    }

    async fn calculate(
        &self,
        request: CalculationRequest,
        subtotal: bool,
    ) -> Result<CalculatedPrice, CalculationError> {
        let CalculationRequest { product, quantity, selected_attribute_values, options } = request;
        tracing::debug!(product = %product.id, quantity, subtotal, "calculating price");

        let mut ctx = CalculatorContext::new(product, quantity, options)?
            .with_selected_attributes(selected_attribute_values);
        self.pipeline.calculate(&mut ctx).await?;
        self.finalize(ctx, subtotal).await
    }

    async fn finalize(
        &self,
        mut ctx: CalculatorContext,
        subtotal: bool,
    ) -> Result<CalculatedPrice, CalculationError> {
        let options = ctx.options().clone();

        if subtotal && ctx.quantity() > 1 {
            let quantity = Decimal::from(ctx.quantity());
            ctx.final_price = options.rounding_currency.round(ctx.final_price) * quantity;
            ctx.discount_amount = options.rounding_currency.round(ctx.discount_amount) * quantity;
        }

        let rate = self.tax.get_tax_rate(ctx.product(), &options.customer).await?;

        let regular = self.convert_amount(ctx.regular_price, &rate, &options).await?;
        let offer = self.convert_optional(ctx.offer_price, &rate, &options).await?;
        let preselected = self.convert_optional(ctx.preselected_price, &rate, &options).await?;
        let lowest = self.convert_optional(ctx.lowest_price, &rate, &options).await?;
        let discount = self.convert_amount(ctx.discount_amount, &rate, &options).await?;
        let mut final_converted = self.convert_amount(ctx.final_price, &rate, &options).await?;

        // The tax was computed in the primary currency. Re-exchange only the
        // tax amount instead of re-deriving it from the converted price, so
        // rounding error does not compound.
        let primary_code = self.currency.primary_currency().code.clone();
        if options.target_currency.code != primary_code {
            if let Some(tax) = final_converted.tax.as_mut() {
                tax.amount = self
                    .currency
                    .convert_from_primary(tax.amount, &options.target_currency)
                    .await?
                    .amount;
            }
        }

        let final_price_text = final_converted.text.take().map(|text| {
            if ctx.has_price_range {
                match &options.price_range_format {
                    Some(template) => template.replace("{0}", &text),
                    None => text,
                }
            } else {
                text
            }
        });

        let mut attribute_adjustments = Vec::with_capacity(ctx.attribute_adjustments.len());
        for adjustment in &ctx.attribute_adjustments {
            let converted = self.convert_amount(adjustment.raw_amount, &rate, &options).await?;
            attribute_adjustments.push(ConvertedAttributeAdjustment {
                attribute_id: adjustment.attribute_id.clone(),
                value_id: adjustment.value_id.clone(),
                label: adjustment.label.clone(),
                amount: converted.money,
            });
        }

        let saving = self.compute_saving(&ctx, &final_converted, &discount, &rate, &options).await?;

        Ok(CalculatedPrice {
            product_id: ctx.product().id.clone(),
            quantity: ctx.quantity(),
            currency: options.target_currency.code.clone(),
            regular_price: regular.money,
            offer_price: offer.map(|converted| converted.money),
            preselected_price: preselected.map(|converted| converted.money),
            lowest_price: lowest.map(|converted| converted.money),
            discount_amount: discount.money,
            final_price: final_converted.money,
            final_price_text,
            has_price_range: ctx.has_price_range,
            tax: final_converted.tax,
            attribute_adjustments,
            applied_discount_ids: ctx.applied_discount_ids.clone(),
            saving,
        })
    }

    /// Reconstructs the pre-discount reference price from the converted
    /// final price and discount, falling back to the stored compare-at price
    /// when no discount applied. The reconstruction keeps list and detail
    /// views consistent even when they apply different discount subsets.
    async fn compute_saving(
        &self,
        ctx: &CalculatorContext,
        final_converted: &ConvertedAmount,
        discount: &ConvertedAmount,
        rate: &TaxRate,
        options: &CalculationOptions,
    ) -> Result<PriceSaving, CalculationError> {
        let final_amount = final_converted.money.amount;
        let price_without_discount = final_amount + discount.money.amount;

        let reference = if final_amount < price_without_discount {
            price_without_discount
        } else {
            match ctx.product().old_price {
                Some(old_price) => {
                    self.convert_amount(old_price, rate, options).await?.money.amount
                }
                None => Decimal::ZERO,
            }
        };

        let has_saving = reference > Decimal::ZERO && final_amount < reference;
        let currency_code = options.target_currency.code.clone();
        let saving_percent = if has_saving {
            ((reference - final_amount) / reference * Decimal::ONE_HUNDRED).round_dp(2)
        } else {
            Decimal::ZERO
        };
        let saving_amount =
            has_saving.then(|| Money::new(reference - final_amount, currency_code.clone()));

        Ok(PriceSaving {
            has_saving,
            saving_price: Money::new(reference, currency_code),
            saving_percent,
            saving_amount,
        })
    }

    async fn convert_optional(
        &self,
        amount: Option<Decimal>,
        rate: &TaxRate,
        options: &CalculationOptions,
    ) -> Result<Option<ConvertedAmount>, CalculationError> {
        match amount {
            Some(amount) => Ok(Some(self.convert_amount(amount, rate, options).await?)),
            None => Ok(None),
        }
    }

    /// The single conversion path every amount goes through: clamp to zero,
    /// apply tax from gross or net, convert from the primary currency,
    /// attach tax display formatting.
    async fn convert_amount(
        &self,
        amount: Decimal,
        rate: &TaxRate,
        options: &CalculationOptions,
    ) -> Result<ConvertedAmount, CalculationError> {
        let mut amount = amount.max(Decimal::ZERO);

        let mut tax = None;
        if !amount.is_zero() {
            let computed = if options.gross_prices {
                self.tax.calculate_tax_from_gross(
                    amount,
                    rate,
                    options.tax_inclusive,
                    &options.rounding_currency,
                )
            } else {
                self.tax.calculate_tax_from_net(
                    amount,
                    rate,
                    options.tax_inclusive,
                    &options.rounding_currency,
                )
            };
            amount = computed.price;
            tax = Some(computed);
        }

        let money = self.currency.convert_from_primary(amount, &options.target_currency).await?;
        let text = (!money.amount.is_zero())
            .then(|| self.currency.apply_tax_format(&money, options.tax_inclusive));

        Ok(ConvertedAmount { money, tax, text })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::{CalculationRequest, PriceCalculationService};
    use crate::calc::options::CalculationOptions;
    use crate::calc::pipeline::CalculatorPipeline;
    use crate::collab::{
        CatalogDiscountService, DeterministicTaxService, FixedRateCurrencyService,
        ProductAttributeMaterializer,
    };
    use crate::domain::catalog::Catalog;
    use crate::domain::customer::{Customer, StoreId};
    use crate::domain::money::Currency;
    use crate::domain::product::Product;

    fn eur() -> Currency {
        Currency::new("EUR", 2, Decimal::ONE)
    }

    fn options() -> CalculationOptions {
        CalculationOptions::new(
            Customer::new("c-1"),
            StoreId("main".to_owned()),
            eur(),
            eur(),
            Utc::now(),
        )
    }

    fn service(products: Vec<Product>, tax_percent: Decimal) -> PriceCalculationService {
        let catalog = Arc::new(Catalog::new(products));
        let pipeline = Arc::new(CalculatorPipeline::with_default_calculators(
            catalog,
            Arc::new(CatalogDiscountService::default()),
            Arc::new(ProductAttributeMaterializer),
        ));
        PriceCalculationService::new(
            pipeline,
            Arc::new(DeterministicTaxService::flat(tax_percent)),
            Arc::new(FixedRateCurrencyService::new(eur())),
        )
    }

    #[tokio::test]
    async fn plain_product_keeps_its_list_price() {
        let product = Arc::new(Product::simple("widget", Decimal::from(100)));
        let service = service(vec![], Decimal::ZERO);

        let price = service
            .calculate_price(CalculationRequest::new(product, 1, options()))
            .await
            .unwrap();

        assert_eq!(price.final_price.amount, Decimal::from(100));
        assert!(!price.saving.has_saving);
        assert_eq!(price.saving.saving_percent, Decimal::ZERO);
        assert!(price.saving.saving_amount.is_none());
    }

    #[tokio::test]
    async fn net_price_gains_tax_when_display_is_inclusive() {
        let product = Arc::new(Product::simple("widget", Decimal::from(100)));
        let service = service(vec![], Decimal::from(19));

        let mut options = options();
        options.tax_inclusive = true;
        let price = service
            .calculate_price(CalculationRequest::new(product, 1, options))
            .await
            .unwrap();

        assert_eq!(price.final_price.amount, Decimal::from(119));
        let tax = price.tax.expect("tax attached");
        assert_eq!(tax.amount, Decimal::from(19));
    }

    #[tokio::test]
    async fn gross_price_sheds_tax_when_display_is_exclusive() {
        let product = Arc::new(Product::simple("widget", Decimal::from(119)));
        let service = service(vec![], Decimal::from(19));

        let mut options = options();
        options.gross_prices = true;
        let price = service
            .calculate_price(CalculationRequest::new(product, 1, options))
            .await
            .unwrap();

        assert_eq!(price.final_price.amount, Decimal::from(100));
    }

    #[tokio::test]
    async fn subtotal_multiplies_the_rounded_unit_price() {
        let product = Arc::new(Product::simple("widget", Decimal::new(1999, 2)));
        let service = service(vec![], Decimal::ZERO);

        let subtotal = service
            .calculate_subtotal(CalculationRequest::new(product, 3, options()))
            .await
            .unwrap();

        assert_eq!(subtotal.final_price.amount, Decimal::new(5997, 2));
    }

    #[tokio::test]
    async fn old_price_is_the_saving_reference_without_discounts() {
        let mut product = Product::simple("widget", Decimal::from(100));
        product.old_price = Some(Decimal::from(150));
        let service = service(vec![], Decimal::ZERO);

        let price = service
            .calculate_price(CalculationRequest::new(Arc::new(product), 1, options()))
            .await
            .unwrap();

        assert!(price.saving.has_saving);
        assert_eq!(price.saving.saving_price.amount, Decimal::from(150));
        assert_eq!(price.saving.saving_percent, Decimal::new(3333, 2));
        assert_eq!(price.saving.saving_amount.unwrap().amount, Decimal::from(50));
    }

    #[tokio::test]
    async fn conversion_targets_the_requested_currency() {
        let product = Arc::new(Product::simple("widget", Decimal::from(100)));
        let service = service(vec![], Decimal::ZERO);

        let mut options = options();
        options.target_currency = Currency::new("USD", 2, Decimal::new(110, 2));
        let price = service
            .calculate_price(CalculationRequest::new(product, 1, options))
            .await
            .unwrap();

        assert_eq!(price.currency, "USD");
        assert_eq!(price.final_price.amount, Decimal::from(110));
    }

    #[tokio::test]
    async fn final_price_text_is_tax_annotated() {
        let product = Arc::new(Product::simple("widget", Decimal::from(100)));
        let service = service(vec![], Decimal::ZERO);

        let price = service
            .calculate_price(CalculationRequest::new(product, 1, options()))
            .await
            .unwrap();

        assert_eq!(price.final_price_text.as_deref(), Some("100 EUR excl. tax"));
    }
}
