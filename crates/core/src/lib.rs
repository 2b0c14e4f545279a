pub mod calc;
pub mod collab;
pub mod domain;
pub mod errors;

pub use calc::{
    CalculatedPrice, CalculationOptions, CalculationRequest, Calculator, CalculatorContext,
    CalculatorPipeline, CalculatorPipelineBuilder, CalculatorTargets, Chain,
    PriceCalculationService, PriceSaving,
};
pub use collab::{
    AttributeMaterializer, CatalogDiscountService, CurrencyService, DeterministicTaxService,
    DiscountService, FixedRateCurrencyService, ProductAttributeMaterializer, Tax, TaxRate,
    TaxService,
};
pub use domain::catalog::Catalog;
pub use domain::customer::{Customer, CustomerId, StoreId};
pub use domain::discount::{Discount, DiscountId, DiscountScope};
pub use domain::money::{Currency, Money};
pub use domain::product::{
    AttributeValue, BundleItem, OfferWindow, Product, ProductAttribute, ProductId, ProductKind,
    TierPrice, TierPriceMethod,
};
pub use errors::CalculationError;
