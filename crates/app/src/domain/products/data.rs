//! Products Data

use rust_decimal::Decimal;

use crate::domain::products::records::{ProductStatus, ProductUuid};

/// New Product Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub uuid: ProductUuid,
    pub sku: String,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub status: ProductStatus,
}
