//! Product catalogue types (read-only from the service's point of view).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use checkout_core::ProductId;

/// A catalogue product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Optional filters for product listing. Blank values are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub brand: Option<String>,
}

impl ProductFilter {
    #[must_use]
    pub fn new(category: Option<&str>, brand: Option<&str>) -> Self {
        let clean = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };
        Self {
            category: clean(category),
            brand: clean(brand),
        }
    }

    /// Whether `product` passes this filter (case-insensitive match).
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let field_matches = |wanted: &Option<String>, actual: &Option<String>| match wanted {
            None => true,
            Some(w) => actual.as_deref().is_some_and(|a| a.eq_ignore_ascii_case(w)),
        };
        field_matches(&self.category, &product.category) && field_matches(&self.brand, &product.brand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(category: Option<&str>, brand: Option<&str>) -> Product {
        Product {
            id: ProductId::parse("p1").expect("valid key"),
            name: "Shirt".to_string(),
            description: None,
            price: Decimal::new(499, 0),
            image_url: None,
            category: category.map(str::to_owned),
            brand: brand.map(str::to_owned),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_filter_blank_values_are_absent() {
        assert_eq!(ProductFilter::new(Some("  "), None), ProductFilter::default());
    }

    #[test]
    fn test_filter_matches_case_insensitively() {
        let filter = ProductFilter::new(Some("Apparel"), Some("acme"));
        assert!(filter.matches(&product(Some("apparel"), Some("ACME"))));
        assert!(!filter.matches(&product(Some("apparel"), None)));
        assert!(ProductFilter::default().matches(&product(None, None)));
    }
}
