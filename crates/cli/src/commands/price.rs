use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use clap::Args;

use tally_core::{
    CalculatedPrice, CalculationOptions, CalculationRequest, Customer, ProductId, StoreId,
};

use crate::config::CliConfig;
use crate::fixture::PricingFixture;

#[derive(Debug, Args)]
pub struct PriceArgs {
    #[arg(long, help = "Product id to price")]
    pub product: String,
    #[arg(long, default_value_t = 1, help = "Quantity to price")]
    pub quantity: u32,
    #[arg(long, help = "Target currency code (defaults to the configured currency)")]
    pub currency: Option<String>,
    #[arg(long, help = "Customer id from the fixture (defaults to an anonymous customer)")]
    pub customer: Option<String>,
    #[arg(
        long = "attribute",
        value_name = "VALUE_ID",
        help = "Selected attribute value id (repeatable)"
    )]
    pub attributes: Vec<String>,
    #[arg(long, help = "Calculate the line subtotal instead of the unit price")]
    pub subtotal: bool,
    #[arg(long, help = "Emit machine-readable JSON output")]
    pub json: bool,
}

pub async fn run(
    config: &CliConfig,
    catalog_path: &Path,
    args: PriceArgs,
) -> anyhow::Result<String> {
    let fixture = PricingFixture::load(catalog_path)?;

    let currency_code = args.currency.as_deref().unwrap_or(&config.pricing.currency);
    let target_currency = fixture
        .currency(currency_code)
        .with_context(|| format!("currency `{currency_code}` is not in the fixture"))?;

    let customer = match &args.customer {
        Some(id) => fixture
            .customer(id)
            .with_context(|| format!("customer `{id}` is not in the fixture"))?,
        None => Customer::new("anonymous"),
    };

    let (catalog, service) = fixture.build_service();
    let product_id = ProductId(args.product.clone());
    let product = catalog
        .find(&product_id)
        .with_context(|| format!("product `{product_id}` is not in the fixture"))?;

    let mut options = CalculationOptions::new(
        customer,
        StoreId(config.pricing.store.clone()),
        target_currency,
        fixture.primary_currency.clone(),
        Utc::now(),
    );
    options.gross_prices = config.pricing.gross_prices;
    options.tax_inclusive = config.pricing.tax_inclusive;
    options.apply_preselected_attributes = true;
    options.determine_lowest_price = true;
    options.price_range_format = Some(config.pricing.price_range_format.clone());
    options.batch_catalog = Some(catalog);

    let request = CalculationRequest::new(product, args.quantity, options)
        .with_selected_attributes(args.attributes);

    let price = if args.subtotal {
        service.calculate_subtotal(request).await?
    } else {
        service.calculate_price(request).await?
    };

    if args.json {
        return serde_json::to_string_pretty(&price).context("could not serialize price");
    }

    Ok(render_human(&price))
}

fn render_human(price: &CalculatedPrice) -> String {
    let mut lines = vec![format!("{} x{} ({})", price.product_id, price.quantity, price.currency)];

    lines.push(format!("- regular price: {}", price.regular_price));
    if let Some(offer) = &price.offer_price {
        lines.push(format!("- offer price: {offer}"));
    }
    if let Some(preselected) = &price.preselected_price {
        lines.push(format!("- preselected price: {preselected}"));
    }
    if let Some(lowest) = &price.lowest_price {
        lines.push(format!("- lowest price: {lowest}"));
    }
    for adjustment in &price.attribute_adjustments {
        lines.push(format!("- option {}: {}", adjustment.label, adjustment.amount));
    }
    if !price.discount_amount.amount.is_zero() {
        lines.push(format!("- discount: {}", price.discount_amount));
    }

    match &price.final_price_text {
        Some(text) => lines.push(format!("- final price: {text}")),
        None => lines.push(format!("- final price: {}", price.final_price)),
    }

    if let Some(tax) = &price.tax {
        if !tax.amount.is_zero() {
            lines.push(format!("- tax ({}%): {}", tax.rate.percent, tax.amount));
        }
    }
    if price.saving.has_saving {
        let amount = price
            .saving
            .saving_amount
            .as_ref()
            .map(|amount| format!("{amount} "))
            .unwrap_or_default();
        lines.push(format!(
            "- saving: {}({}% off {})",
            amount, price.saving.saving_percent, price.saving.saving_price
        ));
    }

    lines.join("\n")
}
