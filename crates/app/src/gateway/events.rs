//! Webhook event payloads.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};

/// The event kinds the reconciler acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Succeeded,
    Failed,
    Canceled,
    Other(String),
}

impl EventKind {
    #[must_use]
    pub fn parse(kind: &str) -> Self {
        match kind {
            "payment.succeeded" | "payment_intent.succeeded" => Self::Succeeded,
            "payment.failed" | "payment_intent.payment_failed" => Self::Failed,
            "payment.canceled" | "payment_intent.canceled" => Self::Canceled,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Succeeded => "payment.succeeded",
            Self::Failed => "payment.failed",
            Self::Canceled => "payment.canceled",
            Self::Other(kind) => kind,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(|kind| Self::parse(&kind))
    }
}

/// A decoded webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayEvent {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub kind: EventKind,

    data: EventData,
}

/// Events arrive either as `data: {...}` or wrapped as `data: {object: {...}}`.
///
/// Event kinds that aren't about a payment may carry anything.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum EventData {
    Wrapped { object: EventPayment },
    Flat(EventPayment),
    Unrecognised(Value),
}

impl GatewayEvent {
    pub fn from_slice(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// The payment this event refers to, if its data describes one.
    #[must_use]
    pub fn payment(&self) -> Option<&EventPayment> {
        match &self.data {
            EventData::Wrapped { object } | EventData::Flat(object) => Some(object),
            EventData::Unrecognised(_) => None,
        }
    }
}

/// The payment intent an event refers to.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPayment {
    /// Gateway transaction id.
    pub id: String,

    #[serde(default)]
    pub status: Option<String>,

    /// Amount in minor units.
    #[serde(default)]
    pub amount: Option<i64>,

    #[serde(default)]
    pub currency: Option<String>,

    #[serde(default, alias = "last_error")]
    pub last_payment_error: Option<PaymentError>,

    #[serde(default)]
    pub latest_charge: Option<String>,

    #[serde(default)]
    pub charges: Option<ChargeList>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentError {
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChargeList {
    #[serde(default)]
    pub data: Vec<ChargeRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChargeRef {
    pub id: String,
}

impl EventPayment {
    /// Charge ids, from the expanded list or the latest charge.
    #[must_use]
    pub fn charge_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .charges
            .iter()
            .flat_map(|charges| charges.data.iter().map(|charge| charge.id.clone()))
            .collect();

        if let Some(latest) = &self.latest_charge
            && !ids.contains(latest)
        {
            ids.push(latest.clone());
        }

        ids
    }

    /// Amount in major units.
    #[must_use]
    pub fn major_amount(&self) -> Option<Decimal> {
        self.amount.map(|minor| Decimal::new(minor, 2))
    }

    /// Details stored on a payment that succeeded.
    #[must_use]
    pub fn success_details(&self) -> Value {
        json!({
            "gateway_status": self.status,
            "amount": self.major_amount().map(|amount| amount.to_string()),
            "currency": self.currency,
            "charges": self.charge_ids(),
        })
    }

    /// Details stored on a payment that failed.
    #[must_use]
    pub fn failure_details(&self) -> Value {
        let error = self.last_payment_error.as_ref();

        json!({
            "gateway_status": self.status,
            "error": error
                .and_then(|error| error.message.as_deref())
                .unwrap_or("Unknown error"),
            "error_code": error.and_then(|error| error.code.as_deref()),
        })
    }

    /// Details stored on a payment the customer abandoned.
    #[must_use]
    pub fn cancel_details(&self) -> Value {
        json!({
            "gateway_status": self.status,
            "error": "Payment was canceled",
        })
    }
}
