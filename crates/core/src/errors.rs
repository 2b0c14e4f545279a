use thiserror::Error;

use crate::domain::product::ProductId;

/// Failure modes of a single price calculation.
///
/// There is no retry and no fallback price: a calculation either completes
/// fully or fails with one of these variants. Empty tier ladders, empty
/// discount sets and empty attribute selections are valid results, not errors.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CalculationError {
    #[error("invalid argument `{argument}`: {reason}")]
    InvalidArgument { argument: &'static str, reason: String },
    #[error("product {0} is priced as its own child")]
    SelfReferencingProduct(ProductId),
    #[error("circular product reference: {path}")]
    CircularProductReference { path: String },
    #[error("child product {0} is not present in the catalog")]
    UnknownChildProduct(ProductId),
    #[error("calculator `{calculator}` failed: {reason}")]
    Calculator { calculator: &'static str, reason: String },
    #[error("collaborator data missing: {0}")]
    MissingCollaboratorData(String),
}
