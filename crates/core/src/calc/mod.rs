//! The price calculation pipeline: a chain of pluggable calculators run
//! over a mutable accumulator, a factory that resolves and orders them per
//! product type, and the service that turns the raw result into tax-aware
//! money amounts.

pub mod calculator;
pub mod calculators;
pub mod context;
pub mod options;
pub mod pipeline;
pub mod service;
pub mod tier;

pub use calculator::{ordering, Calculator, CalculatorTargets, Chain};
pub use context::{AttributePriceAdjustment, CalculatorContext};
pub use options::CalculationOptions;
pub use pipeline::{CalculatorPipeline, CalculatorPipelineBuilder};
pub use service::{
    CalculatedPrice, CalculationRequest, ConvertedAttributeAdjustment, PriceCalculationService,
    PriceSaving,
};
pub use tier::{lowest_tier_price, resolve_tier_price};
