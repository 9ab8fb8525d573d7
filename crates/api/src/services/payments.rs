//! Payment gateway abstraction for deposit handling.
//!
//! The gateway sits behind a trait so the deposit coordinator can be tested
//! without network access. Providers: `stripe` (over reqwest) and `mock`
//! (logs every call, for development and tests).

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::PaymentsConfig;

/// Errors from the payment gateway. All map to `ApiError::ExternalService`.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("payment gateway request failed: {0}")]
    Request(String),

    #[error("payment gateway returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("payment gateway response missing field: {0}")]
    MalformedResponse(String),
}

/// A created (uncaptured) payment intent.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub id: String,
}

/// Gateway operations the deposit coordinator needs. Amounts are in the
/// currency's minor unit (cents).
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates an authorization hold for a deposit. Capture is manual.
    async fn create_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        booking_reference: &str,
    ) -> Result<PaymentIntent, GatewayError>;

    async fn capture(&self, intent_id: &str) -> Result<(), GatewayError>;

    async fn cancel(&self, intent_id: &str) -> Result<(), GatewayError>;

    async fn refund(&self, intent_id: &str, amount_cents: i64) -> Result<(), GatewayError>;
}

/// Builds the configured gateway.
pub fn gateway_from_config(config: &PaymentsConfig) -> Arc<dyn PaymentGateway> {
    match config.provider.as_str() {
        "stripe" => Arc::new(StripeGateway::new(config.stripe_secret_key.clone())),
        _ => Arc::new(MockGateway),
    }
}

/// Stripe implementation using the PaymentIntents API.
pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
}

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

impl StripeGateway {
    pub fn new(secret_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key,
        }
    }

    async fn post_form(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<serde_json::Value, GatewayError> {
        let response = self
            .client
            .post(format!("{}{}", STRIPE_API_BASE, path))
            .basic_auth(&self.secret_key, Option::<&str>::None)
            .form(form)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        if !status.is_success() {
            error!(status = status.as_u16(), body = %body, "Stripe API error");
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| GatewayError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        booking_reference: &str,
    ) -> Result<PaymentIntent, GatewayError> {
        let body = self
            .post_form(
                "/payment_intents",
                &[
                    ("amount", amount_cents.to_string()),
                    ("currency", currency.to_string()),
                    ("capture_method", "manual".to_string()),
                    (
                        "metadata[booking_reference]",
                        booking_reference.to_string(),
                    ),
                ],
            )
            .await?;

        let id = body["id"]
            .as_str()
            .ok_or_else(|| GatewayError::MalformedResponse("id".to_string()))?
            .to_string();

        info!(intent_id = %id, amount_cents, "Created payment intent");
        Ok(PaymentIntent { id })
    }

    async fn capture(&self, intent_id: &str) -> Result<(), GatewayError> {
        self.post_form(&format!("/payment_intents/{}/capture", intent_id), &[])
            .await?;
        info!(intent_id = %intent_id, "Captured payment intent");
        Ok(())
    }

    async fn cancel(&self, intent_id: &str) -> Result<(), GatewayError> {
        self.post_form(&format!("/payment_intents/{}/cancel", intent_id), &[])
            .await?;
        info!(intent_id = %intent_id, "Cancelled payment intent");
        Ok(())
    }

    async fn refund(&self, intent_id: &str, amount_cents: i64) -> Result<(), GatewayError> {
        self.post_form(
            "/refunds",
            &[
                ("payment_intent", intent_id.to_string()),
                ("amount", amount_cents.to_string()),
            ],
        )
        .await?;
        info!(intent_id = %intent_id, amount_cents, "Refunded payment intent");
        Ok(())
    }
}

/// Development gateway: every operation succeeds and is logged.
pub struct MockGateway;

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        booking_reference: &str,
    ) -> Result<PaymentIntent, GatewayError> {
        let id = format!("mock_pi_{}", Uuid::new_v4().simple());
        info!(
            intent_id = %id,
            amount_cents,
            currency,
            booking_reference,
            "Mock gateway: created payment intent"
        );
        Ok(PaymentIntent { id })
    }

    async fn capture(&self, intent_id: &str) -> Result<(), GatewayError> {
        info!(intent_id = %intent_id, "Mock gateway: captured");
        Ok(())
    }

    async fn cancel(&self, intent_id: &str) -> Result<(), GatewayError> {
        info!(intent_id = %intent_id, "Mock gateway: cancelled");
        Ok(())
    }

    async fn refund(&self, intent_id: &str, amount_cents: i64) -> Result<(), GatewayError> {
        info!(intent_id = %intent_id, amount_cents, "Mock gateway: refunded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_gateway_creates_distinct_intents() {
        let gateway = MockGateway;
        let a = gateway.create_intent(5000, "eur", "TB-AAAAAA").await.unwrap();
        let b = gateway.create_intent(5000, "eur", "TB-BBBBBB").await.unwrap();
        assert!(a.id.starts_with("mock_pi_"));
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_mock_gateway_operations_succeed() {
        let gateway = MockGateway;
        assert!(gateway.capture("mock_pi_x").await.is_ok());
        assert!(gateway.cancel("mock_pi_x").await.is_ok());
        assert!(gateway.refund("mock_pi_x", 2500).await.is_ok());
    }

    #[test]
    fn test_gateway_from_config_defaults_to_mock() {
        let config = PaymentsConfig::default();
        // Building the gateway must not require network access.
        let _gateway = gateway_from_config(&config);
    }
}
