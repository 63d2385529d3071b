//! Orders service.

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashMap;
use tracing::info;

use crate::{
    auth::Principal,
    database::Db,
    domain::{
        orders::{
            data::NewOrder,
            errors::OrdersServiceError,
            pricing::{price_items, validate_items},
            records::{OrderItemRecord, OrderRecord, OrderStatus, OrderUuid},
            repositories::{PgOrderItemsRepository, PgOrdersRepository},
        },
        products::{records::ProductUuid, repository::PgProductsRepository},
    },
};

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    orders_repository: PgOrdersRepository,
    items_repository: PgOrderItemsRepository,
    products_repository: PgProductsRepository,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            orders_repository: PgOrdersRepository::new(),
            items_repository: PgOrderItemsRepository::new(),
            products_repository: PgProductsRepository::new(),
        }
    }
}

/// Distribute `items` onto their orders, keeping each order's item order.
fn attach_items(orders: &mut [OrderRecord], items: Vec<OrderItemRecord>) {
    let mut by_order: FxHashMap<OrderUuid, Vec<OrderItemRecord>> = FxHashMap::default();

    for item in items {
        by_order.entry(item.order_uuid).or_default().push(item);
    }

    for order in orders {
        if let Some(items) = by_order.remove(&order.uuid) {
            order.items = items;
        }
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    async fn create_order(
        &self,
        principal: Principal,
        order: NewOrder,
    ) -> Result<OrderRecord, OrdersServiceError> {
        validate_items(&order.items)?;

        let mut product_uuids: Vec<ProductUuid> =
            order.items.iter().map(|item| item.product).collect();

        product_uuids.sort_unstable();
        product_uuids.dedup();

        let mut tx = self.db.begin().await?;

        let catalog: FxHashMap<_, _> = self
            .products_repository
            .get_products(&mut tx, &product_uuids)
            .await?
            .into_iter()
            .map(|product| (product.uuid, product))
            .collect();

        let priced = price_items(&order.items, &catalog)?;

        let mut created = self
            .orders_repository
            .create_order(&mut tx, order.uuid, principal.user, priced.total)
            .await?;

        created.items = self
            .items_repository
            .create_order_items(&mut tx, created.uuid, &priced.items)
            .await?;

        tx.commit().await?;

        info!(
            order = %created.uuid,
            user = %principal.user,
            total = %created.total_amount,
            items = created.items.len(),
            "created order"
        );

        Ok(created)
    }

    async fn list_orders(
        &self,
        principal: Principal,
    ) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let owner = (!principal.is_admin).then_some(principal.user);

        let mut tx = self.db.begin().await?;

        let mut orders = self.orders_repository.list_orders(&mut tx, owner).await?;

        let uuids: Vec<OrderUuid> = orders.iter().map(|order| order.uuid).collect();

        let items = self
            .items_repository
            .get_order_items(&mut tx, &uuids)
            .await?;

        tx.commit().await?;

        attach_items(&mut orders, items);

        Ok(orders)
    }

    async fn get_order(
        &self,
        principal: Principal,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let mut record = self.orders_repository.get_order(&mut tx, order).await?;

        if !principal.can_access(record.user_uuid) {
            return Err(OrdersServiceError::NotFound);
        }

        record.items = self
            .items_repository
            .get_order_items(&mut tx, &[order])
            .await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn update_order_status(
        &self,
        principal: Principal,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<OrderRecord, OrdersServiceError> {
        if !principal.is_admin {
            return Err(OrdersServiceError::Forbidden);
        }

        let mut tx = self.db.begin().await?;

        let mut updated = self
            .orders_repository
            .update_order_status(&mut tx, order, status)
            .await?;

        updated.items = self
            .items_repository
            .get_order_items(&mut tx, &[order])
            .await?;

        tx.commit().await?;

        info!(order = %order, %status, admin = %principal.user, "updated order status");

        Ok(updated)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Validate the requested items, price them, and persist the order.
    ///
    /// Either the order and every item are stored or nothing is.
    async fn create_order(
        &self,
        principal: Principal,
        order: NewOrder,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Orders visible to the principal, newest first.
    async fn list_orders(&self, principal: Principal)
    -> Result<Vec<OrderRecord>, OrdersServiceError>;

    /// Retrieve a single order with its items.
    async fn get_order(
        &self,
        principal: Principal,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Administrators only.
    async fn update_order_status(
        &self,
        principal: Principal,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<OrderRecord, OrdersServiceError>;
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;
    use sqlx::{PgPool, query_scalar};
    use testresult::TestResult;

    use crate::{
        domain::orders::{OrderValidationError, data::NewOrderItem},
        test::{
            TestContext,
            helpers::{create_product, create_user, principal},
        },
    };

    use super::*;

    async fn count(ctx: &TestContext, table: &str) -> TestResult<i64> {
        Ok(
            query_scalar::<_, i64>(&format!("SELECT count(*) FROM {table}"))
                .fetch_one(ctx.db.pool())
                .await?,
        )
    }

    #[tokio::test]
    async fn empty_order_is_rejected_before_storage() -> TestResult {
        let service = PgOrdersService::new(Db::new(PgPool::connect_lazy(
            "postgres://localhost/unused",
        )?));

        let result = service
            .create_order(
                Principal {
                    user: crate::domain::users::records::UserUuid::new(),
                    is_admin: false,
                },
                NewOrder {
                    uuid: OrderUuid::new(),
                    items: Vec::new(),
                },
            )
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::Validation(OrderValidationError::Empty))
            ),
            "expected Validation(Empty), got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn create_order_totals_items_and_snapshots_prices() -> TestResult {
        let ctx = TestContext::new().await;
        let user = create_user(&ctx, "buyer@example.com", false).await;
        let a = create_product(&ctx, "A", dec!(10.00), 5).await;
        let b = create_product(&ctx, "B", dec!(5.00), 5).await;

        let order = ctx
            .orders
            .create_order(
                principal(&user),
                NewOrder {
                    uuid: OrderUuid::new(),
                    items: vec![
                        NewOrderItem {
                            product: a.uuid,
                            quantity: 2,
                        },
                        NewOrderItem {
                            product: b.uuid,
                            quantity: 1,
                        },
                    ],
                },
            )
            .await?;

        assert_eq!(order.total_amount, dec!(25.00));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.user_uuid, user.uuid);

        let lines: Vec<_> = order
            .items
            .iter()
            .map(|item| (item.product_uuid, item.quantity, item.price, item.subtotal))
            .collect();

        assert_eq!(
            lines,
            vec![
                (a.uuid, 2, dec!(10.00), dec!(20.00)),
                (b.uuid, 1, dec!(5.00), dec!(5.00)),
            ]
        );

        let fetched = ctx.orders.get_order(principal(&user), order.uuid).await?;

        assert_eq!(fetched.items.len(), 2);
        assert_eq!(fetched.items[0].product_name, a.name);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_product_creates_nothing() -> TestResult {
        let ctx = TestContext::new().await;
        let user = create_user(&ctx, "buyer@example.com", false).await;
        let a = create_product(&ctx, "A", dec!(10.00), 5).await;
        let missing = ProductUuid::new();

        let result = ctx
            .orders
            .create_order(
                principal(&user),
                NewOrder {
                    uuid: OrderUuid::new(),
                    items: vec![
                        NewOrderItem {
                            product: a.uuid,
                            quantity: 1,
                        },
                        NewOrderItem {
                            product: missing,
                            quantity: 1,
                        },
                    ],
                },
            )
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::Validation(
                    OrderValidationError::UnknownProduct { index: 1, product }
                )) if product == missing
            ),
            "expected UnknownProduct, got {result:?}"
        );

        assert_eq!(count(&ctx, "orders").await?, 0);
        assert_eq!(count(&ctx, "order_items").await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn non_positive_quantity_creates_nothing() -> TestResult {
        let ctx = TestContext::new().await;
        let user = create_user(&ctx, "buyer@example.com", false).await;
        let a = create_product(&ctx, "A", dec!(10.00), 5).await;

        let result = ctx
            .orders
            .create_order(
                principal(&user),
                NewOrder {
                    uuid: OrderUuid::new(),
                    items: vec![NewOrderItem {
                        product: a.uuid,
                        quantity: -3,
                    }],
                },
            )
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::Validation(
                    OrderValidationError::InvalidQuantity { index: 0 }
                ))
            ),
            "expected InvalidQuantity, got {result:?}"
        );

        assert_eq!(count(&ctx, "orders").await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn orders_are_only_visible_to_owner_and_admins() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = create_user(&ctx, "owner@example.com", false).await;
        let other = create_user(&ctx, "other@example.com", false).await;
        let admin = create_user(&ctx, "admin@example.com", true).await;
        let a = create_product(&ctx, "A", dec!(1.00), 5).await;

        let order = ctx
            .orders
            .create_order(
                principal(&owner),
                NewOrder {
                    uuid: OrderUuid::new(),
                    items: vec![NewOrderItem {
                        product: a.uuid,
                        quantity: 1,
                    }],
                },
            )
            .await?;

        let hidden = ctx.orders.get_order(principal(&other), order.uuid).await;

        assert!(
            matches!(hidden, Err(OrdersServiceError::NotFound)),
            "expected NotFound, got {hidden:?}"
        );

        assert!(ctx.orders.list_orders(principal(&other)).await?.is_empty());
        assert_eq!(ctx.orders.list_orders(principal(&owner)).await?.len(), 1);

        let all = ctx.orders.list_orders(principal(&admin)).await?;

        assert_eq!(all.len(), 1);
        assert_eq!(all[0].items.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn only_admins_update_status() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = create_user(&ctx, "owner@example.com", false).await;
        let admin = create_user(&ctx, "admin@example.com", true).await;
        let a = create_product(&ctx, "A", dec!(1.00), 5).await;

        let order = ctx
            .orders
            .create_order(
                principal(&owner),
                NewOrder {
                    uuid: OrderUuid::new(),
                    items: vec![NewOrderItem {
                        product: a.uuid,
                        quantity: 1,
                    }],
                },
            )
            .await?;

        let denied = ctx
            .orders
            .update_order_status(principal(&owner), order.uuid, OrderStatus::Cancelled)
            .await;

        assert!(
            matches!(denied, Err(OrdersServiceError::Forbidden)),
            "expected Forbidden, got {denied:?}"
        );

        let updated = ctx
            .orders
            .update_order_status(principal(&admin), order.uuid, OrderStatus::Cancelled)
            .await?;

        assert_eq!(updated.status, OrderStatus::Cancelled);
        assert_eq!(updated.items.len(), 1);

        Ok(())
    }
}
