//! Payment Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde_json::Value;
use thiserror::Error;

use crate::{
    domain::{orders::records::OrderUuid, users::records::UserUuid},
    uuids::TypedUuid,
};

/// Payment UUID
pub type PaymentUuid = TypedUuid<PaymentRecord>;

/// Payment state.
///
/// `pending -> {success, failed}`, `failed -> success`; `success` is terminal.
///
/// `failed` is deliberately not terminal: the gateway intent stays open after a
/// decline, so a client completing it with the same secret later moves the
/// payment to `success`. A failure arriving after success is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Success,
    Failed,
    Refunded,
    Canceled,
}

#[derive(Debug, Error)]
#[error("unknown payment status: {0}")]
pub struct UnknownPaymentStatus(pub String);

impl PaymentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
            Self::Canceled => "canceled",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownPaymentStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "success" | "completed" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            "canceled" => Ok(Self::Canceled),
            other => Err(UnknownPaymentStatus(other.to_string())),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment providers a client may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentProvider {
    Stripe,
    Bkash,
}

#[derive(Debug, Error)]
#[error("unknown payment provider: {0}")]
pub struct UnknownPaymentProvider(pub String);

impl PaymentProvider {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::Bkash => "bkash",
        }
    }
}

impl FromStr for PaymentProvider {
    type Err = UnknownPaymentProvider;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "stripe" => Ok(Self::Stripe),
            "bkash" => Ok(Self::Bkash),
            other => Err(UnknownPaymentProvider(other.to_string())),
        }
    }
}

impl fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment Record
#[derive(Debug, Clone)]
pub struct PaymentRecord {
    pub uuid: PaymentUuid,
    pub order_uuid: OrderUuid,
    /// Owner of the paid order.
    pub user_uuid: UserUuid,
    pub provider: PaymentProvider,
    pub transaction_id: String,
    pub status: PaymentStatus,
    pub raw_response: Option<Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_is_an_alias_for_success() {
        assert_eq!(
            "completed".parse::<PaymentStatus>().ok(),
            Some(PaymentStatus::Success)
        );
        assert_eq!(PaymentStatus::Success.as_str(), "success");
    }

    #[test]
    fn providers_parse() {
        assert_eq!(
            "stripe".parse::<PaymentProvider>().ok(),
            Some(PaymentProvider::Stripe)
        );
        assert_eq!(
            "bkash".parse::<PaymentProvider>().ok(),
            Some(PaymentProvider::Bkash)
        );
        assert!("paypal".parse::<PaymentProvider>().is_err());
    }
}
