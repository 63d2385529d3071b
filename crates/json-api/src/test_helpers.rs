//! Test helpers.

use std::sync::Arc;

use jiff::Timestamp;
use rust_decimal::Decimal;
use salvo::{affix_state::inject, prelude::*};
use uuid::Uuid;

use storefront_app::{
    auth::{MockAuthService, Principal},
    context::AppContext,
    domain::{
        orders::{
            MockOrdersService,
            records::{OrderItemRecord, OrderItemUuid, OrderRecord, OrderStatus, OrderUuid},
        },
        payments::{
            MockPaymentsService,
            records::{PaymentProvider, PaymentRecord, PaymentStatus, PaymentUuid},
        },
        products::records::ProductUuid,
        users::records::UserUuid,
        webhooks::MockWebhooksService,
    },
};

use crate::{extensions::*, state::State};

pub(crate) const TEST_USER_UUID: UserUuid = UserUuid::from_uuid(Uuid::nil());
pub(crate) const TEST_ADMIN_UUID: UserUuid = UserUuid::from_uuid(Uuid::max());

#[salvo::handler]
pub(crate) async fn inject_user(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_principal(Principal {
        user: TEST_USER_UUID,
        is_admin: false,
    });
    ctrl.call_next(req, depot, res).await;
}

#[salvo::handler]
pub(crate) async fn inject_admin(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_principal(Principal {
        user: TEST_ADMIN_UUID,
        is_admin: true,
    });
    ctrl.call_next(req, depot, res).await;
}

fn strict_auth_mock() -> MockAuthService {
    let mut auth = MockAuthService::new();

    auth.expect_authenticate_bearer().never();

    auth
}

fn strict_orders_mock() -> MockOrdersService {
    let mut orders = MockOrdersService::new();

    orders.expect_create_order().never();
    orders.expect_list_orders().never();
    orders.expect_get_order().never();
    orders.expect_update_order_status().never();

    orders
}

fn strict_payments_mock() -> MockPaymentsService {
    let mut payments = MockPaymentsService::new();

    payments.expect_create_payment_intent().never();
    payments.expect_list_payments().never();
    payments.expect_get_payment().never();

    payments
}

fn strict_webhooks_mock() -> MockWebhooksService {
    let mut webhooks = MockWebhooksService::new();

    webhooks.expect_handle_event().never();

    webhooks
}

fn state(
    orders: MockOrdersService,
    payments: MockPaymentsService,
    webhooks: MockWebhooksService,
    auth: MockAuthService,
) -> Arc<State> {
    State::from_app_context(AppContext {
        orders: Arc::new(orders),
        payments: Arc::new(payments),
        webhooks: Arc::new(webhooks),
        auth: Arc::new(auth),
    })
}

pub(crate) fn state_with_auth(auth: MockAuthService) -> Arc<State> {
    state(
        strict_orders_mock(),
        strict_payments_mock(),
        strict_webhooks_mock(),
        auth,
    )
}

pub(crate) fn state_with_webhooks(
    webhooks: MockWebhooksService,
    auth: MockAuthService,
) -> Arc<State> {
    state(strict_orders_mock(), strict_payments_mock(), webhooks, auth)
}

pub(crate) fn orders_service(orders: MockOrdersService, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(state(
                orders,
                strict_payments_mock(),
                strict_webhooks_mock(),
                strict_auth_mock(),
            )))
            .hoop(inject_user)
            .push(route),
    )
}

pub(crate) fn admin_orders_service(orders: MockOrdersService, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(state(
                orders,
                strict_payments_mock(),
                strict_webhooks_mock(),
                strict_auth_mock(),
            )))
            .hoop(inject_admin)
            .push(route),
    )
}

pub(crate) fn payments_service(payments: MockPaymentsService, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(state(
                strict_orders_mock(),
                payments,
                strict_webhooks_mock(),
                strict_auth_mock(),
            )))
            .hoop(inject_user)
            .push(route),
    )
}

/// Webhook deliveries carry no bearer token, so no principal is injected.
pub(crate) fn webhooks_service(webhooks: MockWebhooksService, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(state(
                strict_orders_mock(),
                strict_payments_mock(),
                webhooks,
                strict_auth_mock(),
            )))
            .push(route),
    )
}

pub(crate) fn make_order(uuid: OrderUuid, product: ProductUuid) -> OrderRecord {
    OrderRecord {
        uuid,
        user_uuid: TEST_USER_UUID,
        total_amount: Decimal::new(2500, 2),
        status: OrderStatus::Pending,
        items: vec![OrderItemRecord {
            uuid: OrderItemUuid::from_uuid(Uuid::nil()),
            order_uuid: uuid,
            product_uuid: product,
            product_name: "Widget".to_string(),
            quantity: 2,
            price: Decimal::new(1250, 2),
            subtotal: Decimal::new(2500, 2),
            created_at: Timestamp::UNIX_EPOCH,
        }],
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}

pub(crate) fn make_payment(uuid: PaymentUuid, order: OrderUuid) -> PaymentRecord {
    PaymentRecord {
        uuid,
        order_uuid: order,
        user_uuid: TEST_USER_UUID,
        provider: PaymentProvider::Stripe,
        transaction_id: "pi_test".to_string(),
        status: PaymentStatus::Pending,
        raw_response: None,
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}
