use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Product composition type. Drives which calculators participate in a
/// pipeline run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    Simple,
    Grouped,
    Bundle,
}

/// A special/offer price with an optional validity window. Open ends are
/// allowed on either side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferWindow {
    pub price: Decimal,
    #[serde(default)]
    pub begins_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

impl OfferWindow {
    pub fn is_active_at(&self, moment: DateTime<Utc>) -> bool {
        self.begins_at.map_or(true, |begins| begins <= moment)
            && self.ends_at.map_or(true, |ends| moment < ends)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierPriceMethod {
    Fixed,
    Percental,
    #[default]
    Subtract,
}

/// One rung of a quantity-price ladder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierPrice {
    pub quantity: u32,
    pub amount: Decimal,
    #[serde(default)]
    pub method: TierPriceMethod,
}

/// A component of a bundle product, priced per item when the bundle has
/// `bundle_per_item_pricing` set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleItem {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default)]
    pub discount_percent: Option<Decimal>,
}

/// A selectable value of a product attribute, carrying a raw price
/// adjustment. Flat adjustments are amounts in the primary store currency;
/// percent adjustments are applied against the working price at calculation
/// time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValue {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub price_adjustment: Decimal,
    #[serde(default)]
    pub adjustment_is_percent: bool,
    #[serde(default)]
    pub is_preselected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAttribute {
    pub id: String,
    pub name: String,
    pub values: Vec<AttributeValue>,
}

/// A catalog product as materialized for pricing. Persistence, import and
/// localization all happen elsewhere; this struct is the already-loaded input
/// the engine works on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub kind: ProductKind,
    /// List price in the primary store currency.
    pub price: Decimal,
    /// Compare-at price, used as the saving reference of last resort.
    #[serde(default)]
    pub old_price: Option<Decimal>,
    #[serde(default)]
    pub offer: Option<OfferWindow>,
    #[serde(default)]
    pub tier_prices: Vec<TierPrice>,
    #[serde(default)]
    pub attributes: Vec<ProductAttribute>,
    /// Associated products of a grouped product.
    #[serde(default)]
    pub associated: Vec<ProductId>,
    #[serde(default)]
    pub bundle_items: Vec<BundleItem>,
    #[serde(default)]
    pub bundle_per_item_pricing: bool,
    /// The customer names the price; all pricing stages are bypassed.
    #[serde(default)]
    pub customer_enters_price: bool,
    /// Per-product discount opt-out, independent of the calculation option.
    #[serde(default)]
    pub ignore_discounts: bool,
    #[serde(default)]
    pub tax_category: Option<String>,
}

impl Product {
    /// Minimal simple product, the usual starting point of test fixtures.
    pub fn simple(id: impl Into<String>, price: Decimal) -> Self {
        let id = id.into();
        Self {
            sku: id.to_uppercase(),
            name: id.clone(),
            id: ProductId(id),
            kind: ProductKind::Simple,
            price,
            old_price: None,
            offer: None,
            tier_prices: Vec::new(),
            attributes: Vec::new(),
            associated: Vec::new(),
            bundle_items: Vec::new(),
            bundle_per_item_pricing: false,
            customer_enters_price: false,
            ignore_discounts: false,
            tax_category: None,
        }
    }
}
