//! Payments Config

use std::time::Duration;

use clap::Args;

use storefront_app::{
    domain::payments::DEFAULT_CURRENCY,
    gateway::{STRIPE_API_BASE, StripeConfig},
};

/// Payment gateway settings.
#[derive(Debug, Args)]
pub struct PaymentsConfig {
    /// Stripe secret API key
    #[arg(long, env = "STRIPE_SECRET_KEY", hide_env_values = true)]
    pub stripe_secret_key: String,

    /// Shared secret used to sign Stripe webhook deliveries
    #[arg(long, env = "STRIPE_WEBHOOK_SECRET", hide_env_values = true)]
    pub stripe_webhook_secret: String,

    /// Stripe API base URL
    #[arg(long, env = "STRIPE_API_BASE", default_value = STRIPE_API_BASE)]
    pub stripe_api_base: String,

    /// ISO currency code charged for orders
    #[arg(long, env = "PAYMENT_CURRENCY", default_value = DEFAULT_CURRENCY)]
    pub currency: String,

    /// Gateway request timeout in seconds
    #[arg(long, env = "PAYMENT_GATEWAY_TIMEOUT_SECONDS", default_value_t = 10_u64)]
    pub gateway_timeout_seconds: u64,
}

impl PaymentsConfig {
    /// Stripe client settings.
    #[must_use]
    pub fn stripe_config(&self) -> StripeConfig {
        StripeConfig {
            api_base: self.stripe_api_base.clone(),
            secret_key: self.stripe_secret_key.clone(),
            webhook_secret: self.stripe_webhook_secret.clone(),
            timeout: Duration::from_secs(self.gateway_timeout_seconds),
        }
    }
}
