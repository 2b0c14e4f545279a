use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::product::Product;
use crate::errors::CalculationError;

/// A materialized attribute value, resolved from the customer's selection
/// (or preselection) and ready for price adjustment accumulation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedAttributeValue {
    pub attribute_id: String,
    pub value_id: String,
    pub label: String,
    pub price_adjustment: Decimal,
    pub adjustment_is_percent: bool,
    pub is_preselected: bool,
}

/// Resolves which attribute values participate in a calculation.
#[async_trait]
pub trait AttributeMaterializer: Send + Sync {
    /// Explicitly selected values always win; when `include_preselected` is
    /// set, attributes without an explicit selection contribute their
    /// preselected value instead.
    async fn materialize(
        &self,
        product: &Product,
        selected_value_ids: &[String],
        include_preselected: bool,
    ) -> Result<Vec<SelectedAttributeValue>, CalculationError>;
}

/// Materializes straight from the attribute data carried on the product.
#[derive(Default)]
pub struct ProductAttributeMaterializer;

#[async_trait]
impl AttributeMaterializer for ProductAttributeMaterializer {
    async fn materialize(
        &self,
        product: &Product,
        selected_value_ids: &[String],
        include_preselected: bool,
    ) -> Result<Vec<SelectedAttributeValue>, CalculationError> {
        let mut resolved = Vec::new();
        for attribute in &product.attributes {
            let selected = attribute
                .values
                .iter()
                .filter(|value| selected_value_ids.contains(&value.id))
                .collect::<Vec<_>>();
            let values = if !selected.is_empty() {
                selected
            } else if include_preselected {
                attribute.values.iter().filter(|value| value.is_preselected).collect()
            } else {
                Vec::new()
            };

            for value in values {
                resolved.push(SelectedAttributeValue {
                    attribute_id: attribute.id.clone(),
                    value_id: value.id.clone(),
                    label: value.label.clone(),
                    price_adjustment: value.price_adjustment,
                    adjustment_is_percent: value.adjustment_is_percent,
                    is_preselected: value.is_preselected,
                });
            }
        }
        Ok(resolved)
    }
}
