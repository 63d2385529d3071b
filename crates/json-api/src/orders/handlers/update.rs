//! Update Order Status Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::orders::records::OrderStatus;

use crate::{
    extensions::*,
    orders::{errors::into_status_error, get::OrderResponse},
    state::State,
};

/// Update Order Status Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdateOrderRequest {
    /// One of `pending`, `paid` or `cancelled`
    pub status: String,
}

/// Update Order Status Handler
///
/// Administrators only.
#[endpoint(
    tags("orders"),
    summary = "Update Order Status",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order updated"),
        (status_code = StatusCode::BAD_REQUEST, description = "Unknown status"),
        (status_code = StatusCode::FORBIDDEN, description = "Caller is not an administrator"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    json: JsonBody<UpdateOrderRequest>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let principal = depot.principal_or_401()?;

    let status = json
        .into_inner()
        .status
        .parse::<OrderStatus>()
        .map_err(|error| StatusError::bad_request().brief(error.to_string()))?;

    let order = state
        .app
        .orders
        .update_order_status(principal, order.into_inner().into(), status)
        .await
        .map_err(into_status_error)?;

    Ok(Json(order.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use storefront_app::domain::{
        orders::{MockOrdersService, OrdersServiceError, records::OrderUuid},
        products::records::ProductUuid,
    };

    use crate::test_helpers::{TEST_ADMIN_UUID, admin_orders_service, make_order, orders_service};

    use super::*;

    fn route() -> Router {
        Router::with_path("orders/{order}").put(handler)
    }

    #[tokio::test]
    async fn test_admin_can_mark_order_paid() -> TestResult {
        let uuid = OrderUuid::new();
        let mut order = make_order(uuid, ProductUuid::new());
        order.status = OrderStatus::Paid;

        let mut orders = MockOrdersService::new();

        orders
            .expect_update_order_status()
            .once()
            .withf(move |principal, o, status| {
                principal.user == TEST_ADMIN_UUID && *o == uuid && *status == OrderStatus::Paid
            })
            .return_once(move |_, _, _| Ok(order));

        let mut res = TestClient::put(format!("http://example.com/orders/{uuid}"))
            .json(&json!({ "status": "paid" }))
            .send(&admin_orders_service(orders, route()))
            .await;

        let body: OrderResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.status, "paid");

        Ok(())
    }

    #[tokio::test]
    async fn test_non_admin_update_returns_403() -> TestResult {
        let uuid = OrderUuid::new();

        let mut orders = MockOrdersService::new();

        orders
            .expect_update_order_status()
            .once()
            .return_once(|_, _, _| Err(OrdersServiceError::Forbidden));

        let res = TestClient::put(format!("http://example.com/orders/{uuid}"))
            .json(&json!({ "status": "cancelled" }))
            .send(&orders_service(orders, route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_status_returns_400_without_calling_service() -> TestResult {
        let uuid = OrderUuid::new();

        let mut orders = MockOrdersService::new();

        orders.expect_update_order_status().never();

        let res = TestClient::put(format!("http://example.com/orders/{uuid}"))
            .json(&json!({ "status": "shipped" }))
            .send(&admin_orders_service(orders, route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
