//! Orders service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::products::records::ProductUuid;

/// Why a requested item list was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderValidationError {
    #[error("order must contain at least one item")]
    Empty,

    #[error("item {index}: quantity must be greater than 0")]
    InvalidQuantity { index: usize },

    #[error("item {index}: quantity is too large")]
    QuantityTooLarge { index: usize },

    #[error("item {index}: product with id {product} does not exist")]
    UnknownProduct { index: usize, product: ProductUuid },

    #[error("item {index}: subtotal exceeds the maximum order amount")]
    SubtotalTooLarge { index: usize },

    #[error("order total exceeds the maximum order amount")]
    TotalTooLarge,
}

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("order already exists")]
    AlreadyExists,

    #[error("order not found")]
    NotFound,

    #[error("only administrators may change order status")]
    Forbidden,

    #[error("invalid order: {0}")]
    Validation(#[from] OrderValidationError),

    #[error("related resource not found")]
    InvalidReference,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for OrdersServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::NotNullViolation | ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}
