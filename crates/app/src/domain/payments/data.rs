//! Payments Data

use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde_json::Value;

use crate::domain::{
    orders::records::OrderUuid,
    payments::records::{PaymentProvider, PaymentRecord, PaymentUuid},
};

/// Request to open a payment for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewPaymentIntent {
    pub uuid: PaymentUuid,
    pub order: OrderUuid,
    pub provider: PaymentProvider,
}

/// Payment row written once the gateway accepted an intent.
#[derive(Debug, Clone)]
pub(crate) struct NewPayment {
    pub uuid: PaymentUuid,
    pub order: OrderUuid,
    pub provider: PaymentProvider,
    pub transaction_id: String,
    pub raw_response: Value,
}

/// What a client needs to complete the charge.
#[derive(Debug, Clone)]
pub struct IssuedPaymentIntent {
    pub payment: PaymentRecord,
    pub client_secret: String,
    pub transaction_id: String,
    pub amount: Decimal,
    pub currency: String,
}

/// Convert a major-unit amount to the gateway's minor units.
#[must_use]
pub fn minor_units(amount: Decimal) -> Option<i64> {
    (amount * Decimal::ONE_HUNDRED).round().to_i64()
}
