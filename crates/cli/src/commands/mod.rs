pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Read the checkout database URL, preferring `CHECKOUT_DATABASE_URL`.
pub fn database_url() -> Result<SecretString, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    std::env::var("CHECKOUT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "CHECKOUT_DATABASE_URL not set".into())
}
