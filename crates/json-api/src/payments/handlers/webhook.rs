//! Stripe Webhook Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::info;

use storefront_app::domain::webhooks::WebhooksServiceError;

use crate::{
    extensions::*, observability::record_webhook_event, payments::errors::webhook_status_error,
    state::State,
};

const SIGNATURE_HEADER: &str = "stripe-signature";

/// Webhook Acknowledgement
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct WebhookAck {
    pub received: bool,

    /// Event kind as understood by the server
    pub kind: String,

    /// `applied`, `already_applied`, `unknown_payment` or `ignored`
    pub outcome: String,
}

/// Stripe Webhook Handler
///
/// Verifies the `Stripe-Signature` header against the raw body before applying the event.
/// Redeliveries are acknowledged without repeating their effects.
#[endpoint(
    tags("payments"),
    summary = "Stripe Webhook",
    responses(
        (status_code = StatusCode::OK, description = "Event acknowledged"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid signature or payload"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<WebhookAck>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let signature = req.header::<String>(SIGNATURE_HEADER).unwrap_or_default();

    let payload = req
        .payload()
        .await
        .map_err(|error| StatusError::bad_request().brief(error.to_string()))?;

    let outcome = match state.app.webhooks.handle_event(payload, &signature).await {
        Ok(outcome) => outcome,
        Err(error) => {
            record_webhook_event("unverified", rejection_label(&error));

            return Err(webhook_status_error(error));
        }
    };

    let kind = outcome.kind().to_string();

    info!(kind = %kind, outcome = outcome.label(), "webhook processed");
    record_webhook_event(&kind, outcome.label());

    Ok(Json(WebhookAck {
        received: true,
        kind,
        outcome: outcome.label().to_string(),
    }))
}

fn rejection_label(error: &WebhooksServiceError) -> &'static str {
    match error {
        WebhooksServiceError::SignatureInvalid(_) => "invalid_signature",
        WebhooksServiceError::InvalidPayload(_) | WebhooksServiceError::MissingPayment(_) => {
            "invalid_payload"
        }
        WebhooksServiceError::Gateway(_) | WebhooksServiceError::Sql(_) => "error",
    }
}
