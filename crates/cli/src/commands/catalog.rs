use std::path::Path;

use serde::Serialize;

use tally_core::ProductKind;

use crate::fixture::PricingFixture;

#[derive(Debug, Serialize)]
struct CatalogEntry<'a> {
    id: &'a str,
    sku: &'a str,
    name: &'a str,
    kind: ProductKind,
    price: String,
    tier_prices: usize,
    bundle_items: usize,
    associated: usize,
}

pub fn run(catalog_path: &Path, json: bool) -> anyhow::Result<String> {
    let fixture = PricingFixture::load(catalog_path)?;

    let entries: Vec<CatalogEntry<'_>> = fixture
        .products
        .iter()
        .map(|product| CatalogEntry {
            id: &product.id.0,
            sku: &product.sku,
            name: &product.name,
            kind: product.kind,
            price: format!("{} {}", product.price, fixture.primary_currency.code),
            tier_prices: product.tier_prices.len(),
            bundle_items: product.bundle_items.len(),
            associated: product.associated.len(),
        })
        .collect();

    if json {
        return Ok(serde_json::to_string_pretty(&entries)?);
    }

    let mut lines = vec![format!("{} products in `{}`:", entries.len(), catalog_path.display())];
    for entry in &entries {
        let kind = match entry.kind {
            ProductKind::Simple => "simple",
            ProductKind::Grouped => "grouped",
            ProductKind::Bundle => "bundle",
        };
        lines.push(format!("- {} [{kind}] {} @ {}", entry.id, entry.name, entry.price));
    }
    Ok(lines.join("\n"))
}
