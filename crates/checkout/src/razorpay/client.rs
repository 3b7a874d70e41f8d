//! Razorpay Orders API client.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument, warn};

use super::error::RazorpayError;
use super::types::{CreateOrderRequest, ErrorEnvelope, GatewayOrder};
use super::PaymentGateway;
use crate::config::RazorpayConfig;

/// HTTP client for the Razorpay REST API.
#[derive(Clone)]
pub struct RazorpayClient {
    client: reqwest::Client,
    api_base: String,
    key_id: String,
    key_secret: SecretString,
}

impl std::fmt::Debug for RazorpayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RazorpayClient")
            .field("api_base", &self.api_base)
            .field("key_id", &self.key_id)
            .field("key_secret", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl RazorpayClient {
    /// Create a client from configuration.
    ///
    /// `timeout` bounds every request, connect included.
    ///
    /// # Errors
    ///
    /// Returns `RazorpayError::Config` if the key id or secret is blank, or
    /// `RazorpayError::Request` if the HTTP client fails to build.
    pub fn new(config: &RazorpayConfig, timeout: Duration) -> Result<Self, RazorpayError> {
        if config.key_id.trim().is_empty() {
            return Err(RazorpayError::Config("key id is empty".to_string()));
        }
        if config.key_secret.expose_secret().trim().is_empty() {
            return Err(RazorpayError::Config("key secret is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.api_base)
    }

    /// Turn a non-2xx response into `RazorpayError::Api`.
    async fn api_error(response: reqwest::Response) -> RazorpayError {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();

        match serde_json::from_str::<ErrorEnvelope>(&text) {
            Ok(envelope) => RazorpayError::Api {
                status,
                code: envelope.error.code.unwrap_or_default(),
                description: envelope
                    .error
                    .description
                    .unwrap_or_else(|| format!("HTTP {status}")),
            },
            Err(_) => RazorpayError::Api {
                status,
                code: String::new(),
                description: if text.is_empty() {
                    format!("HTTP {status}")
                } else {
                    text
                },
            },
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayClient {
    #[instrument(skip(self, request), fields(amount = request.amount.as_i64(), receipt = %request.receipt))]
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<GatewayOrder, RazorpayError> {
        let response = self
            .client
            .post(self.url("orders"))
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error = Self::api_error(response).await;
            warn!(error = %error, "Razorpay rejected order creation");
            return Err(error);
        }

        let order: GatewayOrder = response
            .json()
            .await
            .map_err(|e| RazorpayError::Response(e.to_string()))?;

        debug!(razorpay_order_id = %order.id, "Razorpay order created");
        Ok(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(key_id: &str, key_secret: &str) -> RazorpayConfig {
        RazorpayConfig {
            api_base: "https://api.razorpay.com/v1/".to_string(),
            key_id: key_id.to_string(),
            key_secret: SecretString::from(key_secret.to_string()),
            webhook_secret: SecretString::from("whsec".to_string()),
        }
    }

    #[test]
    fn test_new_rejects_blank_credentials() {
        let err = RazorpayClient::new(&config(" ", "secret"), Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, RazorpayError::Config(_)));

        let err = RazorpayClient::new(&config("rzp_test_1", ""), Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, RazorpayError::Config(_)));
    }

    #[test]
    fn test_url_strips_trailing_slash() {
        let client = RazorpayClient::new(&config("rzp_test_1", "secret"), Duration::from_secs(5))
            .expect("client builds");
        assert_eq!(client.url("orders"), "https://api.razorpay.com/v1/orders");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let client = RazorpayClient::new(&config("rzp_test_1", "hunter2"), Duration::from_secs(5))
            .expect("client builds");
        let debug = format!("{client:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("rzp_test_1"));
    }
}
