//! Webhook reconciliation errors.

use thiserror::Error;

use crate::gateway::{EventKind, GatewayError, SignatureError};

#[derive(Debug, Error)]
pub enum WebhooksServiceError {
    #[error("invalid webhook signature")]
    SignatureInvalid(#[source] SignatureError),

    #[error("invalid webhook payload")]
    InvalidPayload(#[source] serde_json::Error),

    #[error("{0} event carries no payment")]
    MissingPayment(EventKind),

    #[error("payment provider error")]
    Gateway(#[source] GatewayError),

    #[error("storage error")]
    Sql(#[from] sqlx::Error),
}

impl From<GatewayError> for WebhooksServiceError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::SignatureInvalid(error) => Self::SignatureInvalid(error),
            GatewayError::InvalidPayload(error) => Self::InvalidPayload(error),
            error => Self::Gateway(error),
        }
    }
}
