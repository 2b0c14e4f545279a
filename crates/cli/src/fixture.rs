use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use rust_decimal::Decimal;
use serde::Deserialize;

use tally_core::{
    Catalog, CatalogDiscountService, CalculatorPipeline, Currency, Customer,
    DeterministicTaxService, Discount, FixedRateCurrencyService, PriceCalculationService, Product,
    ProductAttributeMaterializer,
};

/// A self-contained pricing universe loaded from one JSON document:
/// currencies, tax rates, customers, discounts and the product catalog.
#[derive(Debug, Deserialize)]
pub struct PricingFixture {
    pub primary_currency: Currency,
    /// Additional display currencies with their exchange rates.
    #[serde(default)]
    pub currencies: Vec<Currency>,
    /// Tax percent by tax category.
    #[serde(default)]
    pub tax_rates: HashMap<String, Decimal>,
    #[serde(default)]
    pub fallback_tax_percent: Decimal,
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub discounts: Vec<Discount>,
    pub products: Vec<Product>,
}

impl PricingFixture {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("could not read catalog fixture `{}`", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("could not parse catalog fixture `{}`", path.display()))
    }

    pub fn currency(&self, code: &str) -> Option<Currency> {
        if self.primary_currency.code == code {
            return Some(self.primary_currency.clone());
        }
        self.currencies.iter().find(|currency| currency.code == code).cloned()
    }

    pub fn customer(&self, id: &str) -> Option<Customer> {
        self.customers.iter().find(|customer| customer.id.0 == id).cloned()
    }

    /// Wires the fixture into a ready-to-use calculation service.
    pub fn build_service(&self) -> (Arc<Catalog>, PriceCalculationService) {
        let catalog = Arc::new(Catalog::new(self.products.clone()));
        let pipeline = Arc::new(CalculatorPipeline::with_default_calculators(
            Arc::clone(&catalog),
            Arc::new(CatalogDiscountService::new(self.discounts.clone())),
            Arc::new(ProductAttributeMaterializer),
        ));
        let tax = Arc::new(DeterministicTaxService::new(
            self.tax_rates.clone(),
            self.fallback_tax_percent,
        ));
        let currency = Arc::new(FixedRateCurrencyService::new(self.primary_currency.clone()));
        (catalog, PriceCalculationService::new(pipeline, tax, currency))
    }
}
