//! Create Payment Intent Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::payments::{
    data::{IssuedPaymentIntent, NewPaymentIntent},
    records::{PaymentProvider, PaymentUuid},
};

use crate::{extensions::*, payments::errors::into_status_error, state::State};

/// Create Payment Intent Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreatePaymentRequest {
    /// Optional client-chosen payment identifier; generated when omitted
    #[serde(default)]
    pub uuid: Option<Uuid>,

    /// The pending order to pay for
    pub order_uuid: Uuid,

    /// `stripe` (default) or `bkash`
    #[serde(default = "default_provider")]
    pub provider: String,
}

fn default_provider() -> String {
    PaymentProvider::Stripe.to_string()
}

/// Payment Intent Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PaymentIntentResponse {
    /// Local payment identifier
    pub payment_uuid: Uuid,

    pub order_uuid: Uuid,

    /// Gateway-assigned transaction id
    pub transaction_id: String,

    /// Secret the client uses to confirm the payment with the gateway
    pub client_secret: String,

    /// Amount charged in major units, as a decimal string
    pub amount: String,

    pub currency: String,

    pub status: String,
}

impl From<IssuedPaymentIntent> for PaymentIntentResponse {
    fn from(issued: IssuedPaymentIntent) -> Self {
        PaymentIntentResponse {
            payment_uuid: issued.payment.uuid.into(),
            order_uuid: issued.payment.order_uuid.into(),
            transaction_id: issued.transaction_id,
            client_secret: issued.client_secret,
            amount: issued.amount.to_string(),
            currency: issued.currency,
            status: issued.payment.status.to_string(),
        }
    }
}

/// Create Payment Intent Handler
///
/// Opens a gateway intent for a pending order owned by the caller.
#[endpoint(
    tags("payments"),
    summary = "Create Payment Intent",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Payment intent created"),
        (status_code = StatusCode::BAD_REQUEST, description = "Unsupported provider"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::CONFLICT, description = "Order already has a payment or is not pending"),
        (status_code = StatusCode::BAD_GATEWAY, description = "Payment provider error"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CreatePaymentRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<PaymentIntentResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let principal = depot.principal_or_401()?;

    let request = json.into_inner();

    let provider = request
        .provider
        .parse::<PaymentProvider>()
        .map_err(|error| StatusError::bad_request().brief(error.to_string()))?;

    let issued = state
        .app
        .payments
        .create_payment_intent(
            principal,
            NewPaymentIntent {
                uuid: request.uuid.map_or_else(PaymentUuid::new, PaymentUuid::from),
                order: request.order_uuid.into(),
                provider,
            },
        )
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/payments/{}", issued.payment.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(issued.into()))
}
