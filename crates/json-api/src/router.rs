//! App Router

use salvo::Router;

use crate::{auth, healthcheck, observability, orders, payments};

/// Routes that require a bearer token.
fn authenticated_router() -> Router {
    Router::new()
        .hoop(auth::middleware::handler)
        .push(
            Router::with_path("orders")
                .get(orders::index::handler)
                .post(orders::create::handler)
                .push(
                    Router::with_path("{order}")
                        .get(orders::get::handler)
                        .put(orders::update::handler),
                ),
        )
        .push(
            Router::with_path("payments")
                .get(payments::index::handler)
                .post(payments::create::handler)
                .push(Router::with_path("{payment}").get(payments::get::handler)),
        )
}

pub(crate) fn app_router() -> Router {
    Router::new()
        .push(Router::with_path("healthcheck").get(healthcheck::handler))
        .push(Router::with_path("metrics").get(observability::metrics_handler))
        .push(Router::with_path("payments/webhook/stripe").post(payments::webhook::handler))
        .push(authenticated_router())
}
