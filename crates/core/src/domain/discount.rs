use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::customer::Customer;
use crate::domain::product::{Product, ProductId};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscountId(pub String);

impl fmt::Display for DiscountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a discount is assigned to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountScope {
    /// Applies to every product in the catalog.
    Catalog,
    /// Applies only to the listed products.
    Products(Vec<ProductId>),
    /// Applies to customers in any of the listed groups.
    CustomerGroups(Vec<String>),
}

/// A promotional discount, either a percentage of the working price or a
/// flat amount in the primary store currency.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    pub id: DiscountId,
    pub name: String,
    #[serde(default)]
    pub use_percentage: bool,
    pub amount: Decimal,
    #[serde(default)]
    pub begins_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    pub scope: DiscountScope,
}

impl Discount {
    pub fn is_active_at(&self, moment: DateTime<Utc>) -> bool {
        self.begins_at.map_or(true, |begins| begins <= moment)
            && self.ends_at.map_or(true, |ends| moment < ends)
    }

    pub fn applies_to(&self, product: &Product, customer: &Customer) -> bool {
        match &self.scope {
            DiscountScope::Catalog => true,
            DiscountScope::Products(ids) => ids.contains(&product.id),
            DiscountScope::CustomerGroups(groups) => {
                customer.group.as_ref().is_some_and(|group| groups.contains(group))
            }
        }
    }

    /// The discount value against a working price.
    pub fn value_for(&self, base: Decimal) -> Decimal {
        if self.use_percentage {
            base * self.amount / Decimal::ONE_HUNDRED
        } else {
            self.amount
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{Discount, DiscountId, DiscountScope};
    use crate::domain::customer::Customer;
    use crate::domain::product::Product;

    fn percent_off(amount: Decimal, scope: DiscountScope) -> Discount {
        Discount {
            id: DiscountId("d-1".to_owned()),
            name: "test".to_owned(),
            use_percentage: true,
            amount,
            begins_at: None,
            ends_at: None,
            scope,
        }
    }

    #[test]
    fn percentage_discount_value_scales_with_base() {
        let discount = percent_off(Decimal::from(20), DiscountScope::Catalog);
        assert_eq!(discount.value_for(Decimal::from(150)), Decimal::from(30));
    }

    #[test]
    fn product_scope_only_matches_assigned_products() {
        let assigned = Product::simple("widget", Decimal::from(10));
        let other = Product::simple("gadget", Decimal::from(10));
        let discount =
            percent_off(Decimal::TEN, DiscountScope::Products(vec![assigned.id.clone()]));
        let customer = Customer::new("c-1");

        assert!(discount.applies_to(&assigned, &customer));
        assert!(!discount.applies_to(&other, &customer));
    }

    #[test]
    fn group_scope_requires_a_matching_customer_group() {
        let product = Product::simple("widget", Decimal::from(10));
        let discount =
            percent_off(Decimal::TEN, DiscountScope::CustomerGroups(vec!["vip".to_owned()]));

        let mut customer = Customer::new("c-1");
        assert!(!discount.applies_to(&product, &customer));

        customer.group = Some("vip".to_owned());
        assert!(discount.applies_to(&product, &customer));
    }
}
