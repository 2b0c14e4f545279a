use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use tally_core::{
    AttributeValue, BundleItem, CalculationError, CalculationOptions, CalculationRequest, Catalog,
    CatalogDiscountService, CalculatorPipeline, Currency, Customer, DeterministicTaxService,
    Discount, DiscountId, DiscountScope, FixedRateCurrencyService, OfferWindow,
    PriceCalculationService, Product, ProductAttribute, ProductAttributeMaterializer, ProductId,
    ProductKind, StoreId, TierPrice, TierPriceMethod,
};

fn eur() -> Currency {
    Currency::new("EUR", 2, Decimal::ONE)
}

fn options() -> CalculationOptions {
    CalculationOptions::new(
        Customer::new("c-1"),
        StoreId("main".to_owned()),
        eur(),
        eur(),
        Utc::now(),
    )
}

fn storefront(products: Vec<Product>, discounts: Vec<Discount>) -> PriceCalculationService {
    let catalog = Arc::new(Catalog::new(products));
    let pipeline = Arc::new(CalculatorPipeline::with_default_calculators(
        catalog,
        Arc::new(CatalogDiscountService::new(discounts)),
        Arc::new(ProductAttributeMaterializer),
    ));
    PriceCalculationService::new(
        pipeline,
        Arc::new(DeterministicTaxService::untaxed()),
        Arc::new(FixedRateCurrencyService::new(eur())),
    )
}

#[tokio::test]
async fn simple_product_without_adjustments_prices_at_list() {
    let product = Arc::new(Product::simple("widget", Decimal::from(100)));
    let service = storefront(vec![], vec![]);

    let price =
        service.calculate_price(CalculationRequest::new(product, 1, options())).await.unwrap();

    assert_eq!(price.final_price.amount, Decimal::from(100));
    assert_eq!(price.regular_price.amount, Decimal::from(100));
    assert!(!price.saving.has_saving);
}

#[tokio::test]
async fn percental_tier_applies_at_its_threshold_quantity() {
    let mut product = Product::simple("widget", Decimal::from(100));
    product.tier_prices = vec![TierPrice {
        quantity: 10,
        amount: Decimal::from(20),
        method: TierPriceMethod::Percental,
    }];
    let service = storefront(vec![], vec![]);

    let price = service
        .calculate_price(CalculationRequest::new(Arc::new(product), 10, options()))
        .await
        .unwrap();

    assert_eq!(price.final_price.amount, Decimal::from(80));
}

#[tokio::test]
async fn discounted_price_reports_saving_against_the_reconstructed_reference() {
    let mut product = Product::simple("widget", Decimal::from(150));
    product.old_price = Some(Decimal::from(150));
    let discount = Discount {
        id: DiscountId("promo".to_owned()),
        name: "promo".to_owned(),
        use_percentage: false,
        amount: Decimal::from(50),
        begins_at: None,
        ends_at: None,
        scope: DiscountScope::Catalog,
    };
    let service = storefront(vec![], vec![discount]);

    let price = service
        .calculate_price(CalculationRequest::new(Arc::new(product), 1, options()))
        .await
        .unwrap();

    assert_eq!(price.final_price.amount, Decimal::from(100));
    assert_eq!(price.discount_amount.amount, Decimal::from(50));
    assert!(price.saving.has_saving);
    assert_eq!(price.saving.saving_price.amount, Decimal::from(150));
    assert_eq!(price.saving.saving_percent, Decimal::new(3333, 2));
    assert_eq!(price.applied_discount_ids, vec![DiscountId("promo".to_owned())]);
}

#[tokio::test]
async fn bundle_with_per_item_pricing_sums_independent_child_pipelines() {
    let part_a = Product::simple("part-a", Decimal::from(40));
    let part_b = Product::simple("part-b", Decimal::from(60));

    let mut bundle = Product::simple("tool-kit", Decimal::ZERO);
    bundle.kind = ProductKind::Bundle;
    bundle.bundle_per_item_pricing = true;
    bundle.bundle_items = vec![
        BundleItem { product_id: ProductId("part-a".to_owned()), quantity: 1, discount_percent: None },
        BundleItem { product_id: ProductId("part-b".to_owned()), quantity: 1, discount_percent: None },
    ];

    let service = storefront(vec![part_a, part_b], vec![]);
    let price = service
        .calculate_price(CalculationRequest::new(Arc::new(bundle), 1, options()))
        .await
        .unwrap();

    assert_eq!(price.final_price.amount, Decimal::from(100));
}

#[tokio::test]
async fn bundle_item_discount_percent_reduces_that_component_only() {
    let part_a = Product::simple("part-a", Decimal::from(40));
    let part_b = Product::simple("part-b", Decimal::from(60));

    let mut bundle = Product::simple("tool-kit", Decimal::ZERO);
    bundle.kind = ProductKind::Bundle;
    bundle.bundle_per_item_pricing = true;
    bundle.bundle_items = vec![
        BundleItem {
            product_id: ProductId("part-a".to_owned()),
            quantity: 2,
            discount_percent: Some(Decimal::from(50)),
        },
        BundleItem { product_id: ProductId("part-b".to_owned()), quantity: 1, discount_percent: None },
    ];

    let service = storefront(vec![part_a, part_b], vec![]);
    let price = service
        .calculate_price(CalculationRequest::new(Arc::new(bundle), 1, options()))
        .await
        .unwrap();

    // 2 x (40 - 50%) + 60
    assert_eq!(price.final_price.amount, Decimal::from(100));
    assert_eq!(price.discount_amount.amount, Decimal::from(40));
}

#[tokio::test]
async fn grouped_product_prices_from_its_cheapest_associate() {
    let cheap = Product::simple("assoc-cheap", Decimal::from(25));
    let costly = Product::simple("assoc-costly", Decimal::from(75));

    let mut grouped = Product::simple("family", Decimal::ZERO);
    grouped.kind = ProductKind::Grouped;
    grouped.associated =
        vec![ProductId("assoc-cheap".to_owned()), ProductId("assoc-costly".to_owned())];

    let service = storefront(vec![cheap, costly], vec![]);
    let mut opts = options();
    opts.determine_lowest_price = true;
    opts.price_range_format = Some("from {0}".to_owned());

    let price = service
        .calculate_price(CalculationRequest::new(Arc::new(grouped), 1, opts))
        .await
        .unwrap();

    assert_eq!(price.final_price.amount, Decimal::from(25));
    assert_eq!(price.lowest_price.unwrap().amount, Decimal::from(25));
    assert!(price.has_price_range);
    assert_eq!(price.final_price_text.as_deref(), Some("from 25 EUR excl. tax"));
}

#[tokio::test]
async fn self_referencing_bundle_fails_without_recursing() {
    let mut bundle = Product::simple("ouroboros", Decimal::from(10));
    bundle.kind = ProductKind::Bundle;
    bundle.bundle_per_item_pricing = true;
    bundle.bundle_items = vec![BundleItem {
        product_id: ProductId("ouroboros".to_owned()),
        quantity: 1,
        discount_percent: None,
    }];

    let service = storefront(vec![bundle.clone()], vec![]);
    let error = service
        .calculate_price(CalculationRequest::new(Arc::new(bundle), 1, options()))
        .await
        .unwrap_err();

    assert!(matches!(error, CalculationError::SelfReferencingProduct(id) if id.0 == "ouroboros"));
}

#[tokio::test]
async fn indirect_bundle_cycle_is_detected() {
    let mut kit_a = Product::simple("kit-a", Decimal::from(10));
    kit_a.kind = ProductKind::Bundle;
    kit_a.bundle_per_item_pricing = true;
    kit_a.bundle_items = vec![BundleItem {
        product_id: ProductId("kit-b".to_owned()),
        quantity: 1,
        discount_percent: None,
    }];

    let mut kit_b = Product::simple("kit-b", Decimal::from(10));
    kit_b.kind = ProductKind::Bundle;
    kit_b.bundle_per_item_pricing = true;
    kit_b.bundle_items = vec![BundleItem {
        product_id: ProductId("kit-a".to_owned()),
        quantity: 1,
        discount_percent: None,
    }];

    let service = storefront(vec![kit_a.clone(), kit_b], vec![]);
    let error = service
        .calculate_price(CalculationRequest::new(Arc::new(kit_a), 1, options()))
        .await
        .unwrap_err();

    assert!(matches!(error, CalculationError::CircularProductReference { .. }));
}

#[tokio::test]
async fn expired_offer_window_does_not_price() {
    let now = Utc::now();
    let mut product = Product::simple("widget", Decimal::from(100));
    product.offer = Some(OfferWindow {
        price: Decimal::from(70),
        begins_at: Some(now - Duration::days(30)),
        ends_at: Some(now - Duration::days(1)),
    });
    let service = storefront(vec![], vec![]);

    let price = service
        .calculate_price(CalculationRequest::new(Arc::new(product), 1, options()))
        .await
        .unwrap();

    assert_eq!(price.final_price.amount, Decimal::from(100));
    assert!(price.offer_price.is_none());
}

#[tokio::test]
async fn active_offer_window_lowers_the_final_price() {
    let now = Utc::now();
    let mut product = Product::simple("widget", Decimal::from(100));
    product.offer = Some(OfferWindow {
        price: Decimal::from(70),
        begins_at: Some(now - Duration::days(1)),
        ends_at: Some(now + Duration::days(1)),
    });
    let service = storefront(vec![], vec![]);

    let price = service
        .calculate_price(CalculationRequest::new(Arc::new(product), 1, options()))
        .await
        .unwrap();

    assert_eq!(price.final_price.amount, Decimal::from(70));
    assert_eq!(price.offer_price.unwrap().amount, Decimal::from(70));
}

#[tokio::test]
async fn attribute_surcharge_raises_price_and_is_reported_separately() {
    let mut product = Product::simple("shirt", Decimal::from(20));
    product.attributes = vec![ProductAttribute {
        id: "size".to_owned(),
        name: "Size".to_owned(),
        values: vec![AttributeValue {
            id: "size-xl".to_owned(),
            label: "XL".to_owned(),
            price_adjustment: Decimal::from(3),
            adjustment_is_percent: false,
            is_preselected: false,
        }],
    }];
    let service = storefront(vec![], vec![]);

    let request = CalculationRequest::new(Arc::new(product), 1, options())
        .with_selected_attributes(vec!["size-xl".to_owned()]);
    let price = service.calculate_price(request).await.unwrap();

    assert_eq!(price.final_price.amount, Decimal::from(23));
    assert_eq!(price.attribute_adjustments.len(), 1);
    assert_eq!(price.attribute_adjustments[0].amount.amount, Decimal::from(3));
}

#[tokio::test]
async fn preselected_price_is_reported_without_touching_the_final_price() {
    let mut product = Product::simple("shirt", Decimal::from(20));
    product.attributes = vec![ProductAttribute {
        id: "size".to_owned(),
        name: "Size".to_owned(),
        values: vec![AttributeValue {
            id: "size-xl".to_owned(),
            label: "XL".to_owned(),
            price_adjustment: Decimal::from(5),
            adjustment_is_percent: false,
            is_preselected: true,
        }],
    }];
    let service = storefront(vec![], vec![]);

    let mut opts = options();
    opts.determine_preselected_price = true;
    let price = service
        .calculate_price(CalculationRequest::new(Arc::new(product), 1, opts))
        .await
        .unwrap();

    assert_eq!(price.final_price.amount, Decimal::from(20));
    assert_eq!(price.preselected_price.unwrap().amount, Decimal::from(25));
}

#[tokio::test]
async fn percent_attribute_adjustments_fall_back_to_the_regular_price_on_tiers() {
    let mut product = Product::simple("widget", Decimal::from(100));
    product.tier_prices =
        vec![TierPrice { quantity: 5, amount: Decimal::from(80), method: TierPriceMethod::Fixed }];
    product.attributes = vec![ProductAttribute {
        id: "finish".to_owned(),
        name: "Finish".to_owned(),
        values: vec![AttributeValue {
            id: "finish-gloss".to_owned(),
            label: "Gloss".to_owned(),
            price_adjustment: Decimal::from(10),
            adjustment_is_percent: true,
            is_preselected: false,
        }],
    }];
    let service = storefront(vec![], vec![]);

    let mut opts = options();
    opts.ignore_percentage_tier_prices_on_attribute_price_adjustments = true;
    let request = CalculationRequest::new(Arc::new(product.clone()), 5, opts)
        .with_selected_attributes(vec!["finish-gloss".to_owned()]);
    let price = service.calculate_price(request).await.unwrap();

    // 10% of the regular 100, not of the tiered 80.
    assert_eq!(price.final_price.amount, Decimal::from(90));
    assert_eq!(price.attribute_adjustments[0].amount.amount, Decimal::from(10));

    let request = CalculationRequest::new(Arc::new(product), 5, options())
        .with_selected_attributes(vec!["finish-gloss".to_owned()]);
    let price = service.calculate_price(request).await.unwrap();

    assert_eq!(price.final_price.amount, Decimal::from(88));
}

#[tokio::test]
async fn percentage_discount_is_suppressed_on_tier_prices_when_asked() {
    let mut product = Product::simple("widget", Decimal::from(100));
    product.tier_prices = vec![TierPrice {
        quantity: 5,
        amount: Decimal::from(80),
        method: TierPriceMethod::Fixed,
    }];
    let discount = Discount {
        id: DiscountId("promo".to_owned()),
        name: "promo".to_owned(),
        use_percentage: true,
        amount: Decimal::from(10),
        begins_at: None,
        ends_at: None,
        scope: DiscountScope::Catalog,
    };
    let service = storefront(vec![], vec![discount]);

    let mut opts = options();
    opts.ignore_percentage_discount_on_tier_prices = true;
    let price = service
        .calculate_price(CalculationRequest::new(Arc::new(product), 5, opts))
        .await
        .unwrap();

    assert_eq!(price.final_price.amount, Decimal::from(80));
    assert_eq!(price.discount_amount.amount, Decimal::ZERO);
}

#[tokio::test]
async fn customer_entered_price_bypasses_every_stage() {
    let mut product = Product::simple("donation", Decimal::from(5));
    product.customer_enters_price = true;
    let discount = Discount {
        id: DiscountId("promo".to_owned()),
        name: "promo".to_owned(),
        use_percentage: true,
        amount: Decimal::from(50),
        begins_at: None,
        ends_at: None,
        scope: DiscountScope::Catalog,
    };
    let service = storefront(vec![], vec![discount]);

    let price = service
        .calculate_price(CalculationRequest::new(Arc::new(product), 1, options()))
        .await
        .unwrap();

    assert_eq!(price.final_price.amount, Decimal::from(5));
    assert_eq!(price.discount_amount.amount, Decimal::ZERO);
    assert!(price.applied_discount_ids.is_empty());
}

#[tokio::test]
async fn oversized_flat_discount_clamps_the_final_price_to_zero() {
    let product = Product::simple("widget", Decimal::from(10));
    let discount = Discount {
        id: DiscountId("overkill".to_owned()),
        name: "overkill".to_owned(),
        use_percentage: false,
        amount: Decimal::from(25),
        begins_at: None,
        ends_at: None,
        scope: DiscountScope::Catalog,
    };
    let service = storefront(vec![], vec![discount]);

    let price = service
        .calculate_price(CalculationRequest::new(Arc::new(product), 1, options()))
        .await
        .unwrap();

    assert_eq!(price.final_price.amount, Decimal::ZERO);
}

#[tokio::test]
async fn lowest_price_mode_reports_the_best_tier_and_flags_a_range() {
    let mut product = Product::simple("widget", Decimal::from(100));
    product.tier_prices = vec![
        TierPrice { quantity: 5, amount: Decimal::from(90), method: TierPriceMethod::Fixed },
        TierPrice { quantity: 10, amount: Decimal::from(80), method: TierPriceMethod::Fixed },
    ];
    let service = storefront(vec![], vec![]);

    let mut opts = options();
    opts.determine_lowest_price = true;
    let price = service
        .calculate_price(CalculationRequest::new(Arc::new(product), 1, opts))
        .await
        .unwrap();

    assert_eq!(price.final_price.amount, Decimal::from(100));
    assert_eq!(price.lowest_price.unwrap().amount, Decimal::from(80));
    assert!(price.has_price_range);
}
