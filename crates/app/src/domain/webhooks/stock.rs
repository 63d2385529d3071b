//! Stock reduction for paid orders.

use smallvec::SmallVec;
use tracing::{info, warn};

use crate::{
    database::Db,
    domain::{
        orders::{records::OrderUuid, repositories::PgOrderItemsRepository},
        products::{records::ProductUuid, repository::PgProductsRepository},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockLineOutcome {
    Reduced { remaining: i32 },
    Insufficient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLine {
    pub product: ProductUuid,
    pub quantity: i32,
    pub outcome: StockLineOutcome,
}

/// One entry per order line, ordered by product.
pub type StockReport = SmallVec<[StockLine; 4]>;

#[derive(Debug, Clone)]
pub struct StockReducer {
    db: Db,
    items_repository: PgOrderItemsRepository,
    products_repository: PgProductsRepository,
}

impl StockReducer {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            items_repository: PgOrderItemsRepository::new(),
            products_repository: PgProductsRepository::new(),
        }
    }

    /// Decrement stock for every line of `order`.
    ///
    /// Lines whose product holds too little stock are skipped, never driving
    /// stock below zero. Product rows are locked in uuid order so concurrent
    /// reductions for orders sharing products cannot deadlock.
    #[tracing::instrument(name = "webhooks.stock.reduce_for_order", skip(self), err)]
    pub async fn reduce_for_order(&self, order: OrderUuid) -> Result<StockReport, sqlx::Error> {
        let mut tx = self.db.begin().await?;

        let mut items = self
            .items_repository
            .get_order_items(&mut tx, &[order])
            .await?;

        items.sort_by_key(|item| item.product_uuid);

        let mut report = StockReport::new();

        for item in items {
            let remaining = self
                .products_repository
                .reduce_stock(&mut tx, item.product_uuid, item.quantity)
                .await?;

            let outcome = if let Some(remaining) = remaining {
                info!(
                    product = %item.product_uuid,
                    quantity = item.quantity,
                    remaining,
                    "stock reduced"
                );

                StockLineOutcome::Reduced { remaining }
            } else {
                warn!(
                    product = %item.product_uuid,
                    quantity = item.quantity,
                    "insufficient stock, line skipped"
                );

                StockLineOutcome::Insufficient
            };

            report.push(StockLine {
                product: item.product_uuid,
                quantity: item.quantity,
                outcome,
            });
        }

        tx.commit().await?;

        info!(lines = report.len(), "stock reduction completed");

        Ok(report)
    }
}
