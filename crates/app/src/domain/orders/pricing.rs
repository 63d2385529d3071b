//! Order pricing.
//!
//! Validation and totals are computed here without touching storage so the
//! builder can refuse a request before opening a transaction.

use rust_decimal::{Decimal, dec};
use rustc_hash::FxHashMap;

use crate::domain::{
    orders::{data::NewOrderItem, errors::OrderValidationError, records::OrderItemUuid},
    products::records::{ProductRecord, ProductUuid},
};

/// Largest amount a `NUMERIC(10, 2)` money column holds.
pub const MAX_AMOUNT: Decimal = dec!(99999999.99);

/// A validated line with its price snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedItem {
    pub uuid: OrderItemUuid,
    pub product: ProductUuid,
    pub quantity: i32,
    pub price: Decimal,
    pub subtotal: Decimal,
}

/// Lines in request order plus their sum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrder {
    pub items: Vec<PricedItem>,
    pub total: Decimal,
}

/// Checks that don't need the catalog: a non-empty list of positive quantities.
pub fn validate_items(items: &[NewOrderItem]) -> Result<(), OrderValidationError> {
    if items.is_empty() {
        return Err(OrderValidationError::Empty);
    }

    for (index, item) in items.iter().enumerate() {
        if item.quantity <= 0 {
            return Err(OrderValidationError::InvalidQuantity { index });
        }

        if i32::try_from(item.quantity).is_err() {
            return Err(OrderValidationError::QuantityTooLarge { index });
        }
    }

    Ok(())
}

/// Price every line against `catalog`, failing on the first unknown product.
pub fn price_items(
    items: &[NewOrderItem],
    catalog: &FxHashMap<ProductUuid, ProductRecord>,
) -> Result<PricedOrder, OrderValidationError> {
    validate_items(items)?;

    let mut priced = Vec::with_capacity(items.len());
    let mut total = Decimal::ZERO;

    for (index, item) in items.iter().enumerate() {
        let product = catalog
            .get(&item.product)
            .ok_or(OrderValidationError::UnknownProduct {
                index,
                product: item.product,
            })?;

        let quantity = i32::try_from(item.quantity)
            .map_err(|_ignored| OrderValidationError::QuantityTooLarge { index })?;

        let subtotal = product
            .price
            .checked_mul(Decimal::from(quantity))
            .filter(|subtotal| *subtotal <= MAX_AMOUNT)
            .ok_or(OrderValidationError::SubtotalTooLarge { index })?;

        total += subtotal;

        if total > MAX_AMOUNT {
            return Err(OrderValidationError::TotalTooLarge);
        }

        priced.push(PricedItem {
            uuid: OrderItemUuid::new(),
            product: item.product,
            quantity,
            price: product.price,
            subtotal,
        });
    }

    Ok(PricedOrder {
        items: priced,
        total,
    })
}
