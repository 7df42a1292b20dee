//! Product catalog and the category resolver built from it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One catalog row: a product and its GEP denomination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
  pub product:  String,
  pub category: String,
}

impl CatalogEntry {
  pub fn new(product: impl Into<String>, category: impl Into<String>) -> Self {
    Self { product: product.into(), category: category.into() }
  }
}

/// Exact-match lookup from product name to category.
///
/// Keys are the catalog's product names, trimmed. There is no fuzzy
/// matching: a product missing from the catalog simply has no category.
#[derive(Debug, Clone, Default)]
pub struct CategoryResolver {
  by_product: HashMap<String, String>,
}

impl CategoryResolver {
  /// Rows with a blank product or category are skipped. When a product
  /// appears twice, the later row wins.
  pub fn from_entries<I>(entries: I) -> Self
  where
    I: IntoIterator<Item = CatalogEntry>,
  {
    let by_product = entries
      .into_iter()
      .filter_map(|entry| {
        let product = entry.product.trim();
        let category = entry.category.trim();
        (!product.is_empty() && !category.is_empty())
          .then(|| (product.to_owned(), category.to_owned()))
      })
      .collect();
    Self { by_product }
  }

  /// The category for `product`, if the catalog knows it.
  pub fn resolve(&self, product: &str) -> Option<&str> {
    self.by_product.get(product.trim()).map(String::as_str)
  }

  pub fn len(&self) -> usize { self.by_product.len() }

  pub fn is_empty(&self) -> bool { self.by_product.is_empty() }
}

impl FromIterator<CatalogEntry> for CategoryResolver {
  fn from_iter<T: IntoIterator<Item = CatalogEntry>>(iter: T) -> Self {
    Self::from_entries(iter)
  }
}
