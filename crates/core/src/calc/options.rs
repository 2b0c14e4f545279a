use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::catalog::Catalog;
use crate::domain::customer::{Customer, StoreId};
use crate::domain::money::Currency;

/// Immutable per-evaluation configuration, resolved once at the call
/// boundary by the host. Calculators read it, never write it; nested child
/// calculations clone it and may override only the batch catalog.
#[derive(Clone)]
pub struct CalculationOptions {
    pub customer: Customer,
    pub store: StoreId,
    /// Currency of the returned `Money` amounts.
    pub target_currency: Currency,
    /// Currency whose minor-unit precision is applied to intermediate
    /// amounts; distinct from `target_currency` when primary and display
    /// currency differ.
    pub rounding_currency: Currency,
    /// The instant offer and discount validity windows are evaluated
    /// against. Fixed per calculation so results are reproducible.
    pub valid_at: DateTime<Utc>,
    /// Whether stored base prices include tax.
    pub gross_prices: bool,
    /// Whether output amounts must display tax-inclusive.
    pub tax_inclusive: bool,
    pub ignore_discounts: bool,
    pub determine_lowest_price: bool,
    pub determine_preselected_price: bool,
    pub apply_preselected_attributes: bool,
    pub ignore_percentage_discount_on_tier_prices: bool,
    pub ignore_percentage_tier_prices_on_attribute_price_adjustments: bool,
    /// Presentation template for range results, e.g. `"from {0}"`.
    pub price_range_format: Option<String>,
    /// Catalog this context resolves child products from, when preloaded.
    pub batch_catalog: Option<Arc<Catalog>>,
    /// Preloaded catalog handed down to child calculations.
    pub child_batch_catalog: Option<Arc<Catalog>>,
}

impl CalculationOptions {
    pub fn new(
        customer: Customer,
        store: StoreId,
        target_currency: Currency,
        rounding_currency: Currency,
        valid_at: DateTime<Utc>,
    ) -> Self {
        Self {
            customer,
            store,
            target_currency,
            rounding_currency,
            valid_at,
            gross_prices: false,
            tax_inclusive: false,
            ignore_discounts: false,
            determine_lowest_price: false,
            determine_preselected_price: false,
            apply_preselected_attributes: false,
            ignore_percentage_discount_on_tier_prices: false,
            ignore_percentage_tier_prices_on_attribute_price_adjustments: false,
            price_range_format: None,
            batch_catalog: None,
            child_batch_catalog: None,
        }
    }

    /// Options for a nested child calculation: identical except that the
    /// preloaded child catalog, when present, becomes the child's own batch
    /// catalog.
    pub(crate) fn for_child(&self) -> Self {
        let mut options = self.clone();
        if let Some(children) = options.child_batch_catalog.take() {
            options.batch_catalog = Some(children);
        }
        options
    }
}
