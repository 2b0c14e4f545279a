pub mod attributes;
pub mod currency;
pub mod discount;
pub mod tax;

pub use attributes::{AttributeMaterializer, ProductAttributeMaterializer, SelectedAttributeValue};
pub use currency::{CurrencyService, FixedRateCurrencyService};
pub use discount::{CatalogDiscountService, DiscountService};
pub use tax::{DeterministicTaxService, Tax, TaxRate, TaxService};
