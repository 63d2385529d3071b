//! Payment Errors

use salvo::http::StatusError;
use tracing::{error, warn};

use storefront_app::domain::{payments::PaymentsServiceError, webhooks::WebhooksServiceError};

pub(crate) fn into_status_error(error: PaymentsServiceError) -> StatusError {
    match error {
        PaymentsServiceError::AlreadyExists => {
            StatusError::conflict().brief("A payment already exists for this order")
        }
        PaymentsServiceError::OrderNotPending(_) => StatusError::conflict().brief(error.to_string()),
        PaymentsServiceError::NotFound => StatusError::not_found().brief("Payment not found"),
        PaymentsServiceError::OrderNotFound => StatusError::not_found().brief("Order not found"),
        PaymentsServiceError::UnsupportedProvider(_) | PaymentsServiceError::InvalidAmount => {
            StatusError::bad_request().brief(error.to_string())
        }
        PaymentsServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid payment payload")
        }
        PaymentsServiceError::Gateway(source) => {
            error!(error = %source, "payment provider request failed");

            StatusError::bad_gateway().brief("Payment provider error")
        }
        PaymentsServiceError::Sql(source) => {
            error!("payment storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}

pub(crate) fn webhook_status_error(error: WebhooksServiceError) -> StatusError {
    match error {
        WebhooksServiceError::SignatureInvalid(source) => {
            warn!(error = %source, "rejected webhook with invalid signature");

            StatusError::bad_request().brief("Invalid webhook signature")
        }
        WebhooksServiceError::InvalidPayload(source) => {
            warn!(error = %source, "rejected malformed webhook payload");

            StatusError::bad_request().brief("Invalid webhook payload")
        }
        WebhooksServiceError::MissingPayment(_) => {
            StatusError::bad_request().brief(error.to_string())
        }
        WebhooksServiceError::Gateway(source) => {
            error!(error = %source, "webhook could not be decoded");

            StatusError::internal_server_error()
        }
        WebhooksServiceError::Sql(source) => {
            error!("webhook storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}
