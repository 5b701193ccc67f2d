//! Catalog
//!
//! In-memory product catalog loaded from a YAML fixture, standing in for the
//! remote catalog API.

use std::{fs, path::Path};

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;

use crate::products::{Product, ProductId};

/// Catalog Parsing Errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading catalog files
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Two products share an identifier
    #[error("Duplicate product id: {0}")]
    DuplicateProduct(ProductId),

    /// A product has a zero or negative price
    #[error("Product {0} has a non-positive price")]
    InvalidPrice(ProductId),
}

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
struct CatalogFixture {
    products: Vec<Product>,
}

/// Products available to add to a cart, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
    by_id: FxHashMap<ProductId, usize>,
}

impl Catalog {
    /// Build a catalog from products.
    ///
    /// # Errors
    ///
    /// Returns an error if two products share an id or a price is not positive.
    pub fn from_products(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut by_id = FxHashMap::default();

        for (idx, product) in products.iter().enumerate() {
            if product.price <= Decimal::ZERO {
                return Err(CatalogError::InvalidPrice(product.id));
            }

            if by_id.insert(product.id, idx).is_some() {
                return Err(CatalogError::DuplicateProduct(product.id));
            }
        }

        Ok(Self { products, by_id })
    }

    /// Parse a catalog from YAML of the form `products: [...]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or the products are inconsistent.
    pub fn from_yaml_str(contents: &str) -> Result<Self, CatalogError> {
        let fixture: CatalogFixture = serde_norway::from_str(contents)?;

        Self::from_products(fixture.products)
    }

    /// Load a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or is inconsistent.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml_str(&contents)
    }

    /// Look up a product by id.
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.by_id
            .get(&id)
            .and_then(|&idx| self.products.get(idx))
    }

    /// Products in `category`, in catalog order.
    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Product> {
        self.products
            .iter()
            .filter(move |product| product.category == category)
    }

    /// Distinct category names, sorted.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = self
            .products
            .iter()
            .map(|product| product.category.as_str())
            .filter(|category| !category.is_empty())
            .collect();

        categories.sort_unstable();
        categories.dedup();

        categories
    }

    /// Iterate over all products in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    /// Number of products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Check if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    const CATALOG: &str = r#"
products:
  - id: 1
    title: Sneakers
    price: "49.99"
    category: shoes
    thumbnail: https://cdn.example/sneakers.png
  - id: 2
    title: Boots
    price: "89.00"
    category: shoes
  - id: 3
    title: Lipstick
    price: "12.50"
    category: beauty
"#;

    #[test]
    fn loads_products_and_indexes_them() -> TestResult {
        let catalog = Catalog::from_yaml_str(CATALOG)?;

        assert_eq!(catalog.len(), 3);

        let sneakers = catalog.get(ProductId(1)).ok_or("missing sneakers")?;
        assert_eq!(sneakers.title, "Sneakers");
        assert_eq!(sneakers.price, Decimal::new(4999, 2));
        assert_eq!(sneakers.image(), Some("https://cdn.example/sneakers.png"));
        assert!(catalog.get(ProductId(9)).is_none());

        Ok(())
    }

    #[test]
    fn groups_by_category() -> TestResult {
        let catalog = Catalog::from_yaml_str(CATALOG)?;

        assert_eq!(catalog.categories(), ["beauty", "shoes"]);

        let shoes: Vec<&str> = catalog
            .by_category("shoes")
            .map(|product| product.title.as_str())
            .collect();
        assert_eq!(shoes, ["Sneakers", "Boots"]);

        Ok(())
    }

    #[test]
    fn rejects_duplicate_ids() {
        let products = vec![
            Product::new(ProductId(1), "A", Decimal::ONE),
            Product::new(ProductId(1), "B", Decimal::ONE),
        ];

        assert!(matches!(
            Catalog::from_products(products),
            Err(CatalogError::DuplicateProduct(ProductId(1)))
        ));
    }

    #[test]
    fn rejects_non_positive_prices() {
        let products = vec![Product::new(ProductId(5), "Freebie", Decimal::ZERO)];

        assert!(matches!(
            Catalog::from_products(products),
            Err(CatalogError::InvalidPrice(ProductId(5)))
        ));
    }

    #[test]
    fn loads_from_file() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("products.yml");
        fs::write(&path, CATALOG)?;

        assert_eq!(Catalog::load(&path)?.len(), 3);

        Ok(())
    }
}
