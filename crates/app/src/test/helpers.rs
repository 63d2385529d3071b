//! Test Helpers

use rust_decimal::Decimal;
use serde_json::json;

use crate::{
    auth::Principal,
    domain::{
        orders::{
            OrdersService,
            data::{NewOrder, NewOrderItem},
            records::{OrderRecord, OrderUuid},
        },
        payments::{
            PaymentsService,
            data::NewPaymentIntent,
            records::{PaymentProvider, PaymentRecord, PaymentUuid},
        },
        products::{
            ProductsService,
            data::NewProduct,
            records::{ProductRecord, ProductStatus, ProductUuid},
        },
        users::{
            UsersService,
            data::NewUser,
            records::{UserRecord, UserUuid},
        },
    },
    gateway::{MockPaymentGateway, PaymentIntent},
    test::TestContext,
};

pub(crate) async fn create_user(ctx: &TestContext, email: &str, is_admin: bool) -> UserRecord {
    ctx.users
        .create_user(NewUser {
            uuid: UserUuid::new(),
            email: email.to_string(),
            name: "Test User".to_string(),
            is_admin,
        })
        .await
        .expect("Failed to create test user")
}

pub(crate) async fn create_product(
    ctx: &TestContext,
    sku: &str,
    price: Decimal,
    stock: i32,
) -> ProductRecord {
    ctx.products
        .create_product(NewProduct {
            uuid: ProductUuid::new(),
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            price,
            stock,
            status: ProductStatus::Active,
        })
        .await
        .expect("Failed to create test product")
}

pub(crate) fn principal(user: &UserRecord) -> Principal {
    Principal {
        user: user.uuid,
        is_admin: user.is_admin,
    }
}

pub(crate) async fn place_order(
    ctx: &TestContext,
    user: &UserRecord,
    items: &[(ProductUuid, i64)],
) -> OrderRecord {
    ctx.orders
        .create_order(
            principal(user),
            NewOrder {
                uuid: OrderUuid::new(),
                items: items
                    .iter()
                    .map(|&(product, quantity)| NewOrderItem { product, quantity })
                    .collect(),
            },
        )
        .await
        .expect("Failed to place test order")
}

/// Record a pending Stripe payment for `order` under the given gateway transaction id.
pub(crate) async fn issue_payment(
    ctx: &TestContext,
    user: &UserRecord,
    order: OrderUuid,
    transaction_id: &'static str,
) -> PaymentRecord {
    let mut gateway = MockPaymentGateway::new();

    gateway.expect_create_intent().once().returning(move |_| {
        Ok(PaymentIntent {
            transaction_id: transaction_id.to_string(),
            client_secret: format!("{transaction_id}_secret"),
            status: "requires_payment_method".to_string(),
            raw: json!({"id": transaction_id}),
        })
    });

    ctx.payments(gateway)
        .create_payment_intent(
            principal(user),
            NewPaymentIntent {
                uuid: PaymentUuid::new(),
                order,
                provider: PaymentProvider::Stripe,
            },
        )
        .await
        .expect("Failed to issue test payment")
        .payment
}
