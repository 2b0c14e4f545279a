use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::calc::calculator::{ordering, Calculator, CalculatorTargets, Chain};
use crate::calc::calculators::{
    AttributePriceCalculator, BundleCalculator, ClampCalculator, CustomerEnteredPriceCalculator,
    DiscountCalculator, GroupedProductCalculator, LowestPriceCalculator, OfferPriceCalculator,
    TierPriceCalculator,
};
use crate::calc::context::CalculatorContext;
use crate::collab::{AttributeMaterializer, DiscountService};
use crate::domain::catalog::Catalog;
use crate::domain::product::{ProductId, ProductKind};
use crate::errors::CalculationError;

struct CalculatorRegistration {
    calculator: Arc<dyn Calculator>,
    targets: CalculatorTargets,
    order: i32,
}

/// Everything that can change which calculators do work for a context.
///
/// Deliberately wider than the product type alone: sharing a cached
/// resolution across contexts that differ in any of these switches would
/// hand one context a calculator set tuned for another.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ResolutionFingerprint {
    kind: ProductKind,
    bundle_per_item_pricing: bool,
    ignore_discounts: bool,
    determine_lowest_price: bool,
    determine_preselected_price: bool,
}

impl ResolutionFingerprint {
    fn for_context(ctx: &CalculatorContext) -> Self {
        let options = ctx.options();
        Self {
            kind: ctx.product().kind,
            bundle_per_item_pricing: ctx.product().bundle_per_item_pricing,
            ignore_discounts: options.ignore_discounts,
            determine_lowest_price: options.determine_lowest_price,
            determine_preselected_price: options.determine_preselected_price,
        }
    }
}

/// Builds a pipeline from an explicit registration table. Registration
/// happens once at startup; the finished pipeline is read-only.
pub struct CalculatorPipelineBuilder {
    catalog: Arc<Catalog>,
    registrations: Vec<CalculatorRegistration>,
}

impl CalculatorPipelineBuilder {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog, registrations: Vec::new() }
    }

    pub fn register(
        mut self,
        calculator: Arc<dyn Calculator>,
        targets: CalculatorTargets,
        order: i32,
    ) -> Self {
        self.registrations.push(CalculatorRegistration { calculator, targets, order });
        self
    }

    pub fn build(mut self) -> CalculatorPipeline {
        // Stable sort: equal orders keep their registration sequence.
        self.registrations.sort_by_key(|registration| registration.order);
        CalculatorPipeline {
            registrations: self.registrations,
            catalog: self.catalog,
            cache: RwLock::new(HashMap::new()),
        }
    }
}

/// Resolves the ordered, target-filtered calculator set for a context and
/// drives it as a middleware chain.
pub struct CalculatorPipeline {
    registrations: Vec<CalculatorRegistration>,
    catalog: Arc<Catalog>,
    cache: RwLock<HashMap<ResolutionFingerprint, Arc<[Arc<dyn Calculator>]>>>,
}

impl CalculatorPipeline {
    pub fn builder(catalog: Arc<Catalog>) -> CalculatorPipelineBuilder {
        CalculatorPipelineBuilder::new(catalog)
    }

    /// The standard storefront pipeline with all built-in calculators.
    pub fn with_default_calculators(
        catalog: Arc<Catalog>,
        discounts: Arc<dyn DiscountService>,
        attributes: Arc<dyn AttributeMaterializer>,
    ) -> Self {
        Self::builder(catalog)
            .register(
                Arc::new(CustomerEnteredPriceCalculator),
                CalculatorTargets::ALL,
                ordering::FIRST,
            )
            .register(
                Arc::new(GroupedProductCalculator),
                CalculatorTargets::GROUPED,
                ordering::EARLY - 300,
            )
            .register(
                Arc::new(BundleCalculator),
                CalculatorTargets::BUNDLE,
                ordering::EARLY - 200,
            )
            .register(
                Arc::new(OfferPriceCalculator),
                CalculatorTargets::SIMPLE | CalculatorTargets::BUNDLE,
                ordering::EARLY + 300,
            )
            .register(
                Arc::new(TierPriceCalculator),
                CalculatorTargets::SIMPLE,
                ordering::EARLY + 400,
            )
            .register(
                Arc::new(AttributePriceCalculator::new(attributes)),
                CalculatorTargets::SIMPLE | CalculatorTargets::BUNDLE,
                ordering::DEFAULT,
            )
            .register(
                Arc::new(DiscountCalculator::new(discounts)),
                CalculatorTargets::ALL,
                ordering::DEFAULT + 100,
            )
            .register(
                Arc::new(LowestPriceCalculator),
                CalculatorTargets::SIMPLE | CalculatorTargets::GROUPED,
                ordering::LATE,
            )
            .register(Arc::new(ClampCalculator), CalculatorTargets::ALL, ordering::LAST)
            .build()
    }

    /// Resolves the calculator set for a context.
    ///
    /// An explicit non-empty override on the context takes precedence over
    /// discovery and bypasses the cache entirely.
    pub fn resolve(&self, ctx: &CalculatorContext) -> Arc<[Arc<dyn Calculator>]> {
        if let Some(explicit) = &ctx.calculators {
            if !explicit.is_empty() {
                return Arc::clone(explicit);
            }
        }

        let fingerprint = ResolutionFingerprint::for_context(ctx);
        if let Some(resolved) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&fingerprint)
        {
            return Arc::clone(resolved);
        }

        let resolved: Arc<[Arc<dyn Calculator>]> = self
            .registrations
            .iter()
            .filter(|registration| registration.targets.matches(fingerprint.kind))
            .map(|registration| Arc::clone(&registration.calculator))
            .collect();
        tracing::debug!(
            kind = ?fingerprint.kind,
            calculators = resolved.len(),
            "resolved calculator set"
        );

        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(fingerprint, Arc::clone(&resolved));
        resolved
    }

    /// Runs an explicit calculator list over a context. An empty list leaves
    /// the context untouched.
    pub async fn run(
        &self,
        calculators: &[Arc<dyn Calculator>],
        ctx: &mut CalculatorContext,
    ) -> Result<(), CalculationError> {
        Chain { remaining: calculators, pipeline: self }.next(ctx).await
    }

    /// Resolves and runs in one step.
    pub async fn calculate(&self, ctx: &mut CalculatorContext) -> Result<(), CalculationError> {
        let calculators = self.resolve(ctx);
        self.run(&calculators, ctx).await
    }

    pub(crate) async fn calculate_child(
        &self,
        child_id: &ProductId,
        parent: &CalculatorContext,
        configure: Option<&(dyn Fn(&mut CalculatorContext) + Send + Sync)>,
    ) -> Result<CalculatorContext, CalculationError> {
        let product = parent
            .options()
            .batch_catalog
            .as_ref()
            .and_then(|catalog| catalog.find(child_id))
            .or_else(|| self.catalog.find(child_id))
            .ok_or_else(|| CalculationError::UnknownChildProduct(child_id.clone()))?;

        let mut child = parent.child(product)?;
        if let Some(configure) = configure {
            configure(&mut child);
        }
        self.calculate(&mut child).await?;
        Ok(child)
    }
}
