//! Checkout configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CHECKOUT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `RAZORPAY_KEY_ID` - Razorpay API key id
//! - `RAZORPAY_KEY_SECRET` - Razorpay API key secret (also signs checkout callbacks)
//! - `RAZORPAY_WEBHOOK_SECRET` - Shared secret for gateway-initiated webhooks
//!
//! ## Optional
//! - `CHECKOUT_HOST` - Bind address (default: 0.0.0.0)
//! - `CHECKOUT_PORT` - Listen port (default: 5000)
//! - `CHECKOUT_ENV` - `development` or `production` (default: production)
//! - `CORS_ALLOWED_ORIGINS` - Comma-separated list of allowed browser origins
//! - `RAZORPAY_API_BASE` - Gateway API base URL (default: <https://api.razorpay.com/v1>)
//! - `CHECKOUT_MIN_AMOUNT` - Minimum payable amount in rupees (default: anything above zero)
//! - `CHECKOUT_MAX_AMOUNT_PAISE` - Maximum payable amount in paise (default: 10000000)
//! - `CHECKOUT_UPSTREAM_TIMEOUT_SECS` - Deadline for each gateway/database call (default: 5)
//! - `CHECKOUT_LOG_JSON` - Emit JSON logs when set
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use checkout_core::money::DEFAULT_MAX_MINOR_UNITS;
use checkout_core::{AmountPolicy, Currency};
use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";
const DEFAULT_RAZORPAY_API_BASE: &str = "https://api.razorpay.com/v1";
const MAX_UPSTREAM_TIMEOUT_SECS: u64 = 60;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Runtime environment.
///
/// Development relaxes CORS and adds error details to 5xx responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("expected development or production, got {other}")),
        }
    }
}

/// Checkout service configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Runtime environment
    pub environment: Environment,
    /// Browser origins allowed to call the API (ignored in development)
    pub cors_origins: Vec<String>,
    /// Razorpay gateway configuration
    pub razorpay: RazorpayConfig,
    /// Bounds for payable amounts
    pub amounts: AmountPolicy,
    /// Deadline applied to every gateway and database call
    pub upstream_timeout: Duration,
    /// Emit JSON-formatted logs
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Razorpay gateway configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct RazorpayConfig {
    /// API base URL, without trailing slash
    pub api_base: String,
    /// Public key id (safe to hand to the browser checkout widget)
    pub key_id: String,
    /// API key secret; also the HMAC key for checkout payment signatures
    pub key_secret: SecretString,
    /// HMAC key for gateway-initiated webhooks
    pub webhook_secret: SecretString,
}

impl std::fmt::Debug for RazorpayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RazorpayConfig")
            .field("api_base", &self.api_base)
            .field("key_id", &self.key_id)
            .field("key_secret", &"[REDACTED]")
            .field("webhook_secret", &"[REDACTED]")
            .finish()
    }
}

impl CheckoutConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or blank, or
    /// if any variable fails to parse. Missing credentials are fatal.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("CHECKOUT_DATABASE_URL")?;
        let host = parse_env("CHECKOUT_HOST", "0.0.0.0")?;
        let port = parse_env("CHECKOUT_PORT", "5000")?;
        let environment = parse_env("CHECKOUT_ENV", "production")?;
        let cors_origins = parse_origins(
            "CORS_ALLOWED_ORIGINS",
            &get_env_or_default("CORS_ALLOWED_ORIGINS", DEFAULT_CORS_ORIGINS),
        )?;
        let razorpay = RazorpayConfig::from_env()?;
        let amounts = amount_policy_from_env()?;

        let timeout_secs: u64 = parse_env("CHECKOUT_UPSTREAM_TIMEOUT_SECS", "5")?;
        if timeout_secs == 0 || timeout_secs > MAX_UPSTREAM_TIMEOUT_SECS {
            return Err(ConfigError::InvalidEnvVar(
                "CHECKOUT_UPSTREAM_TIMEOUT_SECS".to_string(),
                format!("must be between 1 and {MAX_UPSTREAM_TIMEOUT_SECS}"),
            ));
        }

        Ok(Self {
            database_url,
            host,
            port,
            environment,
            cors_origins,
            razorpay,
            amounts,
            upstream_timeout: Duration::from_secs(timeout_secs),
            log_json: get_optional_env("CHECKOUT_LOG_JSON").is_some(),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl RazorpayConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_base = get_env_or_default("RAZORPAY_API_BASE", DEFAULT_RAZORPAY_API_BASE);
        Url::parse(&api_base).map_err(|e| {
            ConfigError::InvalidEnvVar("RAZORPAY_API_BASE".to_string(), e.to_string())
        })?;

        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            key_id: get_required_env("RAZORPAY_KEY_ID")?,
            key_secret: get_required_secret("RAZORPAY_KEY_SECRET")?,
            webhook_secret: get_required_secret("RAZORPAY_WEBHOOK_SECRET")?,
        })
    }
}

fn amount_policy_from_env() -> Result<AmountPolicy, ConfigError> {
    let min_major = get_optional_env("CHECKOUT_MIN_AMOUNT")
        .map(|raw| {
            Decimal::from_str(raw.trim())
                .ok()
                .filter(|min| *min > Decimal::ZERO)
                .ok_or_else(|| {
                    ConfigError::InvalidEnvVar(
                        "CHECKOUT_MIN_AMOUNT".to_string(),
                        format!("expected a positive decimal, got {raw}"),
                    )
                })
        })
        .transpose()?;

    let max_minor: i64 = parse_env(
        "CHECKOUT_MAX_AMOUNT_PAISE",
        &DEFAULT_MAX_MINOR_UNITS.to_string(),
    )?;
    if max_minor <= 0 {
        return Err(ConfigError::InvalidEnvVar(
            "CHECKOUT_MAX_AMOUNT_PAISE".to_string(),
            "must be positive".to_string(),
        ));
    }

    Ok(AmountPolicy {
        min_major,
        max_minor,
        currency: Currency::Inr,
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required, non-blank environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    get_required_env(key).map(SecretString::from)
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    get_required_secret(primary_key)
        .or_else(|_| get_required_secret("DATABASE_URL"))
        .map_err(|_| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional, non-blank environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a comma-separated origin list, requiring each entry to be an
/// http(s) origin without a path.
fn parse_origins(key: &str, raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            let url = Url::parse(origin)
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), format!("{origin}: {e}")))?;
            if !matches!(url.scheme(), "http" | "https") || url.path() != "/" {
                return Err(ConfigError::InvalidEnvVar(
                    key.to_string(),
                    format!("{origin}: expected scheme://host[:port]"),
                ));
            }
            Ok(origin.trim_end_matches('/').to_string())
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parse() {
        assert_eq!(
            "development".parse::<Environment>().unwrap(),
            Environment::Development
        );
        assert_eq!(
            "PROD".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert!("staging".parse::<Environment>().is_err());
        assert!(Environment::Development.is_development());
        assert!(!Environment::default().is_development());
    }

    #[test]
    fn test_parse_origins_accepts_list() {
        let origins = parse_origins(
            "TEST",
            "https://shop.example.in, http://localhost:5173/ ,,",
        )
        .unwrap();
        assert_eq!(
            origins,
            vec![
                "https://shop.example.in".to_string(),
                "http://localhost:5173".to_string()
            ]
        );
    }

    #[test]
    fn test_parse_origins_rejects_paths_and_schemes() {
        assert!(parse_origins("TEST", "https://shop.example.in/checkout").is_err());
        assert!(parse_origins("TEST", "ftp://shop.example.in").is_err());
        assert!(parse_origins("TEST", "not a url").is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = CheckoutConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 5000,
            environment: Environment::Production,
            cors_origins: Vec::new(),
            razorpay: RazorpayConfig {
                api_base: DEFAULT_RAZORPAY_API_BASE.to_string(),
                key_id: "rzp_test_key".to_string(),
                key_secret: SecretString::from("key_secret"),
                webhook_secret: SecretString::from("webhook_secret"),
            },
            amounts: AmountPolicy::default(),
            upstream_timeout: Duration::from_secs(5),
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 5000);
    }

    #[test]
    fn test_razorpay_config_debug_redacts_secrets() {
        let config = RazorpayConfig {
            api_base: DEFAULT_RAZORPAY_API_BASE.to_string(),
            key_id: "rzp_test_visible".to_string(),
            key_secret: SecretString::from("super_secret_key_secret"),
            webhook_secret: SecretString::from("super_secret_webhook"),
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("rzp_test_visible"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_key_secret"));
        assert!(!debug_output.contains("super_secret_webhook"));
    }
}
