use std::ops::BitOr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::calc::context::CalculatorContext;
use crate::calc::pipeline::CalculatorPipeline;
use crate::domain::product::{ProductId, ProductKind};
use crate::errors::CalculationError;

/// Well-known slots in the calculator ordering. Ties between calculators
/// with the same order are broken by registration sequence.
pub mod ordering {
    pub const FIRST: i32 = -1000;
    pub const EARLY: i32 = -500;
    pub const DEFAULT: i32 = 0;
    pub const LATE: i32 = 500;
    pub const LAST: i32 = 1000;
}

/// Bitmask over product kinds a calculator applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CalculatorTargets(u8);

impl CalculatorTargets {
    pub const SIMPLE: Self = Self(0b001);
    pub const GROUPED: Self = Self(0b010);
    pub const BUNDLE: Self = Self(0b100);
    pub const ALL: Self = Self(0b111);

    pub const fn from_kind(kind: ProductKind) -> Self {
        match kind {
            ProductKind::Simple => Self::SIMPLE,
            ProductKind::Grouped => Self::GROUPED,
            ProductKind::Bundle => Self::BUNDLE,
        }
    }

    pub const fn matches(self, kind: ProductKind) -> bool {
        self.0 & Self::from_kind(kind).0 != 0
    }
}

impl BitOr for CalculatorTargets {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A single pricing concern in the middleware chain.
///
/// A calculator mutates the context's price fields, then hands control to
/// the remainder of the chain via `chain.next(ctx)`. Skipping that call
/// short-circuits every downstream stage. Work placed after the `next` await
/// runs on the way back out, once all downstream stages have finished.
#[async_trait]
pub trait Calculator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn calculate(
        &self,
        ctx: &mut CalculatorContext,
        chain: Chain<'_>,
    ) -> Result<(), CalculationError>;
}

/// Handle onto the remaining calculators of the current run, plus the
/// pipeline itself for recursive child pricing.
pub struct Chain<'a> {
    pub(crate) remaining: &'a [Arc<dyn Calculator>],
    pub(crate) pipeline: &'a CalculatorPipeline,
}

impl<'a> Chain<'a> {
    /// Runs the rest of the chain. A consumed or empty chain is a no-op.
    ///
    /// Missing collaborator data surfacing from a stage is tagged with that
    /// stage's name; structural errors pass through untouched.
    pub async fn next(self, ctx: &mut CalculatorContext) -> Result<(), CalculationError> {
        if let Some((head, rest)) = self.remaining.split_first() {
            tracing::trace!(calculator = head.name(), "running calculator");
            head.calculate(ctx, Chain { remaining: rest, pipeline: self.pipeline })
                .await
                .map_err(|error| match error {
                    CalculationError::MissingCollaboratorData(reason) => {
                        CalculationError::Calculator { calculator: head.name(), reason }
                    }
                    other => other,
                })?;
        }
        Ok(())
    }

    /// Prices a child product (bundle item or grouped associate) through an
    /// independent nested pipeline and returns its finished context.
    pub async fn calculate_child(
        &self,
        child_id: &ProductId,
        parent: &CalculatorContext,
        configure: Option<&(dyn Fn(&mut CalculatorContext) + Send + Sync)>,
    ) -> Result<CalculatorContext, CalculationError> {
        self.pipeline.calculate_child(child_id, parent, configure).await
    }
}
