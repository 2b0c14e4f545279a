use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::domain::product::{TierPrice, TierPriceMethod};

/// Resolves the tier ladder for a requested quantity against a base price.
///
/// The raw tier list is deduplicated by quantity threshold (a later
/// duplicate wins), sorted ascending, then scanned forward: every tier whose
/// threshold is within the requested quantity and not below the previously
/// accepted threshold overwrites the candidate, so the highest qualifying
/// tier decides. Returns `None` when no tier qualifies.
pub fn resolve_tier_price(
    tiers: &[TierPrice],
    quantity: u32,
    base_price: Decimal,
) -> Option<Decimal> {
    if tiers.is_empty() {
        return None;
    }

    let mut accepted: Option<&TierPrice> = None;
    let mut previous_quantity = 0u32;
    for tier in ladder(tiers) {
        if tier.quantity <= quantity && tier.quantity >= previous_quantity {
            previous_quantity = tier.quantity;
            accepted = Some(tier);
        }
    }

    accepted.map(|tier| candidate_price(tier, base_price))
}

/// The lowest price attainable anywhere on the ladder, each tier evaluated
/// at its own threshold quantity. Used for "from X" price determination.
pub fn lowest_tier_price(tiers: &[TierPrice], base_price: Decimal) -> Option<Decimal> {
    ladder(tiers).into_iter().map(|tier| candidate_price(tier, base_price)).min()
}

fn ladder(tiers: &[TierPrice]) -> Vec<&TierPrice> {
    let mut by_quantity: HashMap<u32, &TierPrice> = HashMap::with_capacity(tiers.len());
    for tier in tiers {
        by_quantity.insert(tier.quantity, tier);
    }
    let mut deduplicated: Vec<&TierPrice> = by_quantity.into_values().collect();
    deduplicated.sort_by_key(|tier| tier.quantity);
    deduplicated
}

fn candidate_price(tier: &TierPrice, base_price: Decimal) -> Decimal {
    match tier.method {
        TierPriceMethod::Fixed => tier.amount,
        TierPriceMethod::Percental => {
            base_price - base_price * tier.amount / Decimal::ONE_HUNDRED
        }
        TierPriceMethod::Subtract => base_price - tier.amount,
    }
}
