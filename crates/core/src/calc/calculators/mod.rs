//! Built-in pipeline stages, one pricing concern per file.

pub mod attribute_price;
pub mod bundle;
pub mod clamp;
pub mod customer_entered;
pub mod discount;
pub mod grouped_product;
pub mod lowest_price;
pub mod offer_price;
pub mod tier_price;

pub use attribute_price::AttributePriceCalculator;
pub use bundle::BundleCalculator;
pub use clamp::ClampCalculator;
pub use customer_entered::CustomerEnteredPriceCalculator;
pub use discount::DiscountCalculator;
pub use grouped_product::GroupedProductCalculator;
pub use lowest_price::LowestPriceCalculator;
pub use offer_price::OfferPriceCalculator;
pub use tier_price::TierPriceCalculator;
