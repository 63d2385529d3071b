//! Payments service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::{
    domain::{orders::records::OrderStatus, payments::records::PaymentProvider},
    gateway::GatewayError,
};

#[derive(Debug, Error)]
pub enum PaymentsServiceError {
    #[error("a payment already exists for this order")]
    AlreadyExists,

    #[error("payment not found")]
    NotFound,

    #[error("order not found")]
    OrderNotFound,

    #[error("order is {0}, not pending")]
    OrderNotPending(OrderStatus),

    #[error("payment provider {0} not yet implemented")]
    UnsupportedProvider(PaymentProvider),

    #[error("order total can't be expressed in minor units")]
    InvalidAmount,

    #[error("payment provider error")]
    Gateway(#[from] GatewayError),

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for PaymentsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::OrderNotFound,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::NotNullViolation | ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}
