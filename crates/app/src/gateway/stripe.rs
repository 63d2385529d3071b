//! Stripe payment intents client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::gateway::{
    CreateIntent, GatewayError, GatewayEvent, PaymentGateway, PaymentIntent, WebhookVerifier,
};

/// Production API origin.
pub const STRIPE_API_BASE: &str = "https://api.stripe.com";

/// Default bound on a single gateway request.
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the Stripe gateway.
#[derive(Clone)]
pub struct StripeConfig {
    /// API origin, overridable for test doubles.
    pub api_base: String,

    /// Secret API key sent as the bearer credential.
    pub secret_key: String,

    /// Endpoint secret used to sign webhook deliveries.
    pub webhook_secret: String,

    pub timeout: Duration,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("api_base", &self.api_base)
            .field("secret_key", &"**redacted**")
            .field("webhook_secret", &"**redacted**")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Clone)]
pub struct StripeGateway {
    http: Client,
    api_base: String,
    secret_key: Zeroizing<String>,
    verifier: WebhookVerifier,
}

impl std::fmt::Debug for StripeGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeGateway")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Result<Self, GatewayError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            secret_key: Zeroizing::new(config.secret_key),
            verifier: WebhookVerifier::new(&config.webhook_secret)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct IntentResponse {
    id: String,
    client_secret: String,
    #[serde(default)]
    status: String,
}

/// Form fields for a payment intent request, metadata flattened Stripe style.
fn intent_form(intent: &CreateIntent) -> Vec<(String, String)> {
    let mut form = vec![
        ("amount".to_string(), intent.amount.to_string()),
        ("currency".to_string(), intent.currency.clone()),
        ("description".to_string(), intent.description.clone()),
    ];

    form.extend(
        intent
            .metadata
            .iter()
            .map(|(key, value)| (format!("metadata[{key}]"), value.clone())),
    );

    form
}

/// Best message available from an error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[tracing::instrument(
        name = "gateway.stripe.create_intent",
        skip(self, intent),
        fields(amount = intent.amount, currency = %intent.currency),
        err
    )]
    async fn create_intent(&self, intent: CreateIntent) -> Result<PaymentIntent, GatewayError> {
        let url = format!("{}/v1/payment_intents", self.api_base);

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.secret_key.as_str())
            .form(&intent_form(&intent))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(&body);

            warn!(status = status.as_u16(), %message, "payment intent rejected");

            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let raw: Value = serde_json::from_str(&body).map_err(GatewayError::InvalidResponse)?;

        let parsed =
            IntentResponse::deserialize(&raw).map_err(GatewayError::InvalidResponse)?;

        info!(transaction_id = %parsed.id, status = %parsed.status, "payment intent created");

        Ok(PaymentIntent {
            transaction_id: parsed.id,
            client_secret: parsed.client_secret,
            status: parsed.status,
            raw,
        })
    }

    fn construct_event(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<GatewayEvent, GatewayError> {
        self.verifier.verify(payload, signature)?;

        GatewayEvent::from_slice(payload).map_err(GatewayError::InvalidPayload)
    }
}
