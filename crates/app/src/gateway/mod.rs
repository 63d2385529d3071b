//! Payment gateway

use async_trait::async_trait;
use mockall::automock;
use serde_json::Value;

mod errors;
mod events;
mod signature;
mod stripe;

pub use errors::GatewayError;
pub use events::*;
pub use signature::*;
pub use stripe::*;

/// A request to open a chargeable intent with the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIntent {
    /// Amount in the currency's minor unit.
    pub amount: i64,
    pub currency: String,
    pub description: String,
    pub metadata: Vec<(String, String)>,
}

/// The gateway's answer to [`CreateIntent`].
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntent {
    pub transaction_id: String,
    pub client_secret: String,
    pub status: String,
    pub raw: Value,
}

#[automock]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent.
    async fn create_intent(&self, intent: CreateIntent) -> Result<PaymentIntent, GatewayError>;

    /// Authenticate and decode a webhook delivery.
    fn construct_event(&self, payload: &[u8], signature: &str)
    -> Result<GatewayEvent, GatewayError>;
}
