//! Get Payment Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use storefront_app::domain::payments::records::PaymentRecord;

use crate::{extensions::*, payments::errors::into_status_error, state::State};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PaymentResponse {
    pub uuid: Uuid,

    pub order_uuid: Uuid,

    /// Owner of the paid order
    pub user_uuid: Uuid,

    /// `stripe` or `bkash`
    pub provider: String,

    /// Gateway-assigned transaction id
    pub transaction_id: String,

    /// One of `pending`, `success`, `failed`, `refunded` or `canceled`
    pub status: String,

    /// Last gateway payload recorded for this payment
    pub raw_response: Option<Value>,

    pub created_at: String,

    pub updated_at: String,
}

impl From<PaymentRecord> for PaymentResponse {
    fn from(payment: PaymentRecord) -> Self {
        PaymentResponse {
            uuid: payment.uuid.into(),
            order_uuid: payment.order_uuid.into(),
            user_uuid: payment.user_uuid.into(),
            provider: payment.provider.to_string(),
            transaction_id: payment.transaction_id,
            status: payment.status.to_string(),
            raw_response: payment.raw_response,
            created_at: payment.created_at.to_string(),
            updated_at: payment.updated_at.to_string(),
        }
    }
}

/// Get Payment Handler
#[endpoint(
    tags("payments"),
    summary = "Get Payment",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Payment found"),
        (status_code = StatusCode::NOT_FOUND, description = "Payment not found"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    payment: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<PaymentResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let principal = depot.principal_or_401()?;

    let payment = state
        .app
        .payments
        .get_payment(principal, payment.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(payment.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use storefront_app::domain::{
        orders::records::OrderUuid,
        payments::{MockPaymentsService, PaymentsServiceError, records::PaymentUuid},
    };

    use crate::test_helpers::{TEST_USER_UUID, make_payment, payments_service};

    use super::*;

    fn make_service(payments: MockPaymentsService) -> Service {
        payments_service(payments, Router::with_path("payments/{payment}").get(handler))
    }

    #[tokio::test]
    async fn test_get_returns_payment() -> TestResult {
        let uuid = PaymentUuid::new();
        let order = OrderUuid::new();
        let payment = make_payment(uuid, order);

        let mut payments = MockPaymentsService::new();

        payments
            .expect_get_payment()
            .once()
            .withf(move |principal, p| principal.user == TEST_USER_UUID && *p == uuid)
            .return_once(move |_, _| Ok(payment));

        let mut res = TestClient::get(format!("http://example.com/payments/{uuid}"))
            .send(&make_service(payments))
            .await;

        let body: PaymentResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.uuid, uuid.into_uuid());
        assert_eq!(body.order_uuid, order.into_uuid());
        assert_eq!(body.provider, "stripe");
        assert_eq!(body.status, "pending");

        Ok(())
    }

    #[tokio::test]
    async fn test_get_missing_payment_returns_404() -> TestResult {
        let mut payments = MockPaymentsService::new();

        payments
            .expect_get_payment()
            .once()
            .return_once(|_, _| Err(PaymentsServiceError::NotFound));

        let res = TestClient::get(format!("http://example.com/payments/{}", PaymentUuid::new()))
            .send(&make_service(payments))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
