//! Webhooks

pub mod errors;
pub mod service;
pub mod stock;

pub use errors::WebhooksServiceError;
pub use service::*;
