use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::product::{Product, ProductId};

/// In-memory product lookup used by the pipeline to resolve bundle items and
/// grouped-product associates. Read-only once built, cheap to share.
#[derive(Default)]
pub struct Catalog {
    products: HashMap<ProductId, Arc<Product>>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products: products
                .into_iter()
                .map(|product| (product.id.clone(), Arc::new(product)))
                .collect(),
        }
    }

    pub fn find(&self, product_id: &ProductId) -> Option<Arc<Product>> {
        self.products.get(product_id).map(Arc::clone)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
