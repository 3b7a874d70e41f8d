//! Seed the product catalogue from a YAML file.
//!
//! ```yaml
//! products:
//!   - id: tee-black-m
//!     name: Black Tee
//!     price: 499.00
//!     category: Apparel
//!     brand: Acme
//!     image_url: https://cdn.example.com/tee.png
//! ```
//!
//! Products are upserted by `id`, so re-running the command is safe.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use checkout_server::db::{self, NewProduct, PgStore};

#[derive(Debug, Deserialize)]
struct Catalogue {
    products: Vec<NewProduct>,
}

/// Check every product before anything is written. Returns one message per
/// problem.
fn validate_catalogue(products: &[NewProduct]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for (index, product) in products.iter().enumerate() {
        let id = product.id.trim();
        if id.is_empty() {
            errors.push(format!("product {index}: id is blank"));
        } else if !seen.insert(id) {
            errors.push(format!("product {index}: duplicate id {id}"));
        }
        if product.name.trim().is_empty() {
            errors.push(format!("product {index}: name is blank"));
        }
        if product.price < Decimal::ZERO {
            errors.push(format!("product {index}: price is negative"));
        }
    }

    errors
}

/// Upsert products from `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, any product is
/// invalid, or a database write fails.
pub async fn products(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalogue");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let catalogue: Catalogue = serde_yaml::from_str(&content)?;

    let errors = validate_catalogue(&catalogue.products);
    if !errors.is_empty() {
        return Err(errors.join("\n").into());
    }

    let database_url = super::database_url()?;
    let store = PgStore::new(db::create_pool(&database_url).await?);

    for product in &catalogue.products {
        store.upsert_product(product).await?;
    }

    info!(products = catalogue.products.len(), "Catalogue seeded");
    Ok(())
}
