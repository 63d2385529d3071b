//! Payments service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use tracing::{error, info};

use crate::{
    auth::Principal,
    database::Db,
    domain::{
        orders::{records::OrderStatus, repositories::PgOrdersRepository},
        payments::{
            data::{IssuedPaymentIntent, NewPayment, NewPaymentIntent, minor_units},
            errors::PaymentsServiceError,
            records::{PaymentProvider, PaymentRecord, PaymentUuid},
            repository::PgPaymentsRepository,
        },
    },
    gateway::{CreateIntent, PaymentGateway},
};

/// Currency used when none is configured.
pub const DEFAULT_CURRENCY: &str = "bdt";

#[derive(Clone)]
pub struct PgPaymentsService {
    db: Db,
    repository: PgPaymentsRepository,
    orders_repository: PgOrdersRepository,
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
}

impl std::fmt::Debug for PgPaymentsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgPaymentsService")
            .field("db", &self.db)
            .field("currency", &self.currency)
            .finish_non_exhaustive()
    }
}

impl PgPaymentsService {
    #[must_use]
    pub fn new(db: Db, gateway: Arc<dyn PaymentGateway>, currency: impl Into<String>) -> Self {
        Self {
            db,
            repository: PgPaymentsRepository::new(),
            orders_repository: PgOrdersRepository::new(),
            gateway,
            currency: currency.into(),
        }
    }
}

#[async_trait]
impl PaymentsService for PgPaymentsService {
    async fn create_payment_intent(
        &self,
        principal: Principal,
        intent: NewPaymentIntent,
    ) -> Result<IssuedPaymentIntent, PaymentsServiceError> {
        if intent.provider != PaymentProvider::Stripe {
            return Err(PaymentsServiceError::UnsupportedProvider(intent.provider));
        }

        let mut tx = self.db.begin().await?;

        let order = self
            .orders_repository
            .get_order(&mut tx, intent.order)
            .await
            .map_err(|error| match error {
                sqlx::Error::RowNotFound => PaymentsServiceError::OrderNotFound,
                error => PaymentsServiceError::from(error),
            })?;

        if order.user_uuid != principal.user {
            return Err(PaymentsServiceError::OrderNotFound);
        }

        if order.status != OrderStatus::Pending {
            return Err(PaymentsServiceError::OrderNotPending(order.status));
        }

        if self
            .repository
            .find_payment_for_order(&mut tx, order.uuid)
            .await?
            .is_some()
        {
            return Err(PaymentsServiceError::AlreadyExists);
        }

        tx.commit().await?;

        let amount = minor_units(order.total_amount).ok_or(PaymentsServiceError::InvalidAmount)?;

        let created = self
            .gateway
            .create_intent(CreateIntent {
                amount,
                currency: self.currency.clone(),
                description: format!("Payment for Order #{}", order.uuid),
                metadata: vec![
                    ("order_id".to_string(), order.uuid.to_string()),
                    ("user_id".to_string(), principal.user.to_string()),
                ],
            })
            .await?;

        let mut tx = self.db.begin().await?;

        let payment = self
            .repository
            .create_payment(
                &mut tx,
                NewPayment {
                    uuid: intent.uuid,
                    order: order.uuid,
                    provider: intent.provider,
                    transaction_id: created.transaction_id.clone(),
                    raw_response: created.raw,
                },
            )
            .await
            .inspect_err(|error| {
                error!(
                    %error,
                    order = %order.uuid,
                    transaction_id = %created.transaction_id,
                    "payment intent created but not recorded"
                );
            })?;

        tx.commit().await?;

        info!(
            payment = %payment.uuid,
            order = %order.uuid,
            transaction_id = %payment.transaction_id,
            "payment intent issued"
        );

        Ok(IssuedPaymentIntent {
            payment,
            client_secret: created.client_secret,
            transaction_id: created.transaction_id,
            amount: order.total_amount,
            currency: self.currency.clone(),
        })
    }

    async fn list_payments(
        &self,
        principal: Principal,
    ) -> Result<Vec<PaymentRecord>, PaymentsServiceError> {
        let owner = (!principal.is_admin).then_some(principal.user);

        let mut tx = self.db.begin().await?;

        let payments = self.repository.list_payments(&mut tx, owner).await?;

        tx.commit().await?;

        Ok(payments)
    }

    async fn get_payment(
        &self,
        principal: Principal,
        payment: PaymentUuid,
    ) -> Result<PaymentRecord, PaymentsServiceError> {
        let mut tx = self.db.begin().await?;

        let payment = self.repository.get_payment(&mut tx, payment).await?;

        tx.commit().await?;

        if !principal.can_access(payment.user_uuid) {
            return Err(PaymentsServiceError::NotFound);
        }

        Ok(payment)
    }
}

#[automock]
#[async_trait]
pub trait PaymentsService: Send + Sync {
    /// Open a gateway intent for a pending order owned by the principal.
    ///
    /// Nothing is stored when the gateway fails.
    async fn create_payment_intent(
        &self,
        principal: Principal,
        intent: NewPaymentIntent,
    ) -> Result<IssuedPaymentIntent, PaymentsServiceError>;

    /// Payments visible to the principal, newest first.
    async fn list_payments(
        &self,
        principal: Principal,
    ) -> Result<Vec<PaymentRecord>, PaymentsServiceError>;

    /// Retrieve a single payment.
    async fn get_payment(
        &self,
        principal: Principal,
        payment: PaymentUuid,
    ) -> Result<PaymentRecord, PaymentsServiceError>;
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;
    use serde_json::json;
    use sqlx::{PgPool, query_scalar};
    use testresult::TestResult;

    use crate::{
        domain::{
            orders::{OrdersService, records::OrderUuid},
            payments::records::PaymentStatus,
            users::records::UserUuid,
        },
        gateway::{GatewayError, MockPaymentGateway, PaymentIntent},
        test::{
            TestContext,
            helpers::{create_product, create_user, place_order, principal},
        },
    };

    use super::*;

    fn intent_for(order: OrderUuid) -> NewPaymentIntent {
        NewPaymentIntent {
            uuid: PaymentUuid::new(),
            order,
            provider: PaymentProvider::Stripe,
        }
    }

    fn accepting_gateway(transaction_id: &'static str) -> MockPaymentGateway {
        let mut gateway = MockPaymentGateway::new();

        gateway
            .expect_create_intent()
            .once()
            .withf(|intent| intent.amount == 2500 && intent.currency == "bdt")
            .returning(move |_| {
                Ok(PaymentIntent {
                    transaction_id: transaction_id.to_string(),
                    client_secret: format!("{transaction_id}_secret"),
                    status: "requires_payment_method".to_string(),
                    raw: json!({"id": transaction_id}),
                })
            });

        gateway
    }

    async fn payment_rows(ctx: &TestContext) -> TestResult<i64> {
        Ok(query_scalar::<_, i64>("SELECT count(*) FROM payments")
            .fetch_one(ctx.db.pool())
            .await?)
    }

    #[tokio::test]
    async fn unsupported_provider_is_rejected_before_storage() -> TestResult {
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_intent().never();

        let service = PgPaymentsService::new(
            Db::new(PgPool::connect_lazy("postgres://localhost/unused")?),
            Arc::new(gateway),
            DEFAULT_CURRENCY,
        );

        let result = service
            .create_payment_intent(
                Principal {
                    user: UserUuid::new(),
                    is_admin: false,
                },
                NewPaymentIntent {
                    provider: PaymentProvider::Bkash,
                    ..intent_for(OrderUuid::new())
                },
            )
            .await;

        assert!(
            matches!(
                result,
                Err(PaymentsServiceError::UnsupportedProvider(
                    PaymentProvider::Bkash
                ))
            ),
            "expected UnsupportedProvider, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn create_payment_intent_records_pending_payment() -> TestResult {
        let ctx = TestContext::new().await;
        let user = create_user(&ctx, "buyer@example.com", false).await;
        let product = create_product(&ctx, "A", dec!(12.50), 5).await;
        let order = place_order(&ctx, &user, &[(product.uuid, 2)]).await;

        let service = ctx.payments(accepting_gateway("pi_1"));

        let issued = service
            .create_payment_intent(principal(&user), intent_for(order.uuid))
            .await?;

        assert_eq!(issued.transaction_id, "pi_1");
        assert_eq!(issued.client_secret, "pi_1_secret");
        assert_eq!(issued.amount, dec!(25.00));
        assert_eq!(issued.currency, "bdt");
        assert_eq!(issued.payment.status, PaymentStatus::Pending);
        assert_eq!(issued.payment.order_uuid, order.uuid);
        assert_eq!(issued.payment.raw_response, Some(json!({"id": "pi_1"})));

        let fetched = service
            .get_payment(principal(&user), issued.payment.uuid)
            .await?;

        assert_eq!(fetched.transaction_id, "pi_1");

        Ok(())
    }

    #[tokio::test]
    async fn second_intent_for_order_conflicts_without_calling_gateway() -> TestResult {
        let ctx = TestContext::new().await;
        let user = create_user(&ctx, "buyer@example.com", false).await;
        let product = create_product(&ctx, "A", dec!(25.00), 5).await;
        let order = place_order(&ctx, &user, &[(product.uuid, 1)]).await;

        ctx.payments(accepting_gateway("pi_1"))
            .create_payment_intent(principal(&user), intent_for(order.uuid))
            .await?;

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_intent().never();

        let result = ctx
            .payments(gateway)
            .create_payment_intent(principal(&user), intent_for(order.uuid))
            .await;

        assert!(
            matches!(result, Err(PaymentsServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        assert_eq!(payment_rows(&ctx).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn gateway_failure_stores_nothing() -> TestResult {
        let ctx = TestContext::new().await;
        let user = create_user(&ctx, "buyer@example.com", false).await;
        let product = create_product(&ctx, "A", dec!(25.00), 5).await;
        let order = place_order(&ctx, &user, &[(product.uuid, 1)]).await;

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_create_intent()
            .once()
            .returning(|_| Err(GatewayError::Timeout));

        let result = ctx
            .payments(gateway)
            .create_payment_intent(principal(&user), intent_for(order.uuid))
            .await;

        assert!(
            matches!(
                result,
                Err(PaymentsServiceError::Gateway(GatewayError::Timeout))
            ),
            "expected Gateway(Timeout), got {result:?}"
        );

        assert_eq!(payment_rows(&ctx).await?, 0);

        let order = ctx.orders.get_order(principal(&user), order.uuid).await?;

        assert_eq!(order.status, OrderStatus::Pending);

        Ok(())
    }

    #[tokio::test]
    async fn other_users_orders_are_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = create_user(&ctx, "owner@example.com", false).await;
        let admin = create_user(&ctx, "admin@example.com", true).await;
        let product = create_product(&ctx, "A", dec!(25.00), 5).await;
        let order = place_order(&ctx, &owner, &[(product.uuid, 1)]).await;

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_intent().never();

        let result = ctx
            .payments(gateway)
            .create_payment_intent(principal(&admin), intent_for(order.uuid))
            .await;

        assert!(
            matches!(result, Err(PaymentsServiceError::OrderNotFound)),
            "expected OrderNotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn non_pending_orders_conflict() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = create_user(&ctx, "owner@example.com", false).await;
        let admin = create_user(&ctx, "admin@example.com", true).await;
        let product = create_product(&ctx, "A", dec!(25.00), 5).await;
        let order = place_order(&ctx, &owner, &[(product.uuid, 1)]).await;

        ctx.orders
            .update_order_status(principal(&admin), order.uuid, OrderStatus::Cancelled)
            .await?;

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_intent().never();

        let result = ctx
            .payments(gateway)
            .create_payment_intent(principal(&owner), intent_for(order.uuid))
            .await;

        assert!(
            matches!(
                result,
                Err(PaymentsServiceError::OrderNotPending(OrderStatus::Cancelled))
            ),
            "expected OrderNotPending, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn payments_are_only_visible_to_owner_and_admins() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = create_user(&ctx, "owner@example.com", false).await;
        let other = create_user(&ctx, "other@example.com", false).await;
        let admin = create_user(&ctx, "admin@example.com", true).await;
        let product = create_product(&ctx, "A", dec!(25.00), 5).await;
        let order = place_order(&ctx, &owner, &[(product.uuid, 1)]).await;

        let service = ctx.payments(accepting_gateway("pi_vis"));

        let issued = service
            .create_payment_intent(principal(&owner), intent_for(order.uuid))
            .await?;

        let hidden = service
            .get_payment(principal(&other), issued.payment.uuid)
            .await;

        assert!(
            matches!(hidden, Err(PaymentsServiceError::NotFound)),
            "expected NotFound, got {hidden:?}"
        );

        assert!(service.list_payments(principal(&other)).await?.is_empty());
        assert_eq!(service.list_payments(principal(&owner)).await?.len(), 1);
        assert_eq!(service.list_payments(principal(&admin)).await?.len(), 1);

        Ok(())
    }
}
