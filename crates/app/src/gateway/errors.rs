//! Gateway errors.

use thiserror::Error;

use crate::gateway::SignatureError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("gateway request timed out")]
    Timeout,

    #[error("gateway http error")]
    Http(#[source] reqwest::Error),

    #[error("unexpected gateway response")]
    InvalidResponse(#[source] serde_json::Error),

    #[error("invalid webhook signature")]
    SignatureInvalid(#[from] SignatureError),

    #[error("invalid webhook payload")]
    InvalidPayload(#[source] serde_json::Error),
}

impl From<reqwest::Error> for GatewayError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::Timeout;
        }

        Self::Http(error)
    }
}
