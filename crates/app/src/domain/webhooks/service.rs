//! Webhook reconciliation service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::{
    database::Db,
    domain::{
        orders::{records::OrderStatus, repositories::PgOrdersRepository},
        payments::{
            records::{PaymentStatus, PaymentUuid},
            repository::PgPaymentsRepository,
        },
        webhooks::{
            errors::WebhooksServiceError,
            stock::{StockReducer, StockReport},
        },
    },
    gateway::{EventKind, PaymentGateway},
};

/// What a delivery did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The payment moved to `status`.
    Applied {
        kind: EventKind,
        payment: PaymentUuid,
        status: PaymentStatus,
        stock: StockReport,
    },

    /// The payment was no longer eligible, typically a redelivery.
    AlreadyApplied {
        kind: EventKind,
        payment: PaymentUuid,
        status: PaymentStatus,
    },

    /// No payment carries the event's transaction id.
    UnknownPayment {
        kind: EventKind,
        transaction_id: String,
    },

    /// Event kinds the reconciler doesn't act on.
    Ignored { kind: EventKind },
}

impl WebhookOutcome {
    #[must_use]
    pub fn kind(&self) -> &EventKind {
        match self {
            Self::Applied { kind, .. }
            | Self::AlreadyApplied { kind, .. }
            | Self::UnknownPayment { kind, .. }
            | Self::Ignored { kind } => kind,
        }
    }

    /// Short label used in logs and metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Applied { .. } => "applied",
            Self::AlreadyApplied { .. } => "already_applied",
            Self::UnknownPayment { .. } => "unknown_payment",
            Self::Ignored { .. } => "ignored",
        }
    }
}

#[derive(Clone)]
pub struct PgWebhooksService {
    db: Db,
    payments_repository: PgPaymentsRepository,
    orders_repository: PgOrdersRepository,
    gateway: Arc<dyn PaymentGateway>,
    stock: StockReducer,
}

impl std::fmt::Debug for PgWebhooksService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgWebhooksService")
            .field("db", &self.db)
            .finish_non_exhaustive()
    }
}

impl PgWebhooksService {
    #[must_use]
    pub fn new(db: Db, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            stock: StockReducer::new(db.clone()),
            db,
            payments_repository: PgPaymentsRepository::new(),
            orders_repository: PgOrdersRepository::new(),
            gateway,
        }
    }

    async fn apply_success(
        &self,
        kind: EventKind,
        transaction_id: &str,
        details: Value,
    ) -> Result<WebhookOutcome, WebhooksServiceError> {
        let mut tx = self.db.begin().await?;

        let Some(payment) = self
            .payments_repository
            .mark_payment_succeeded(&mut tx, transaction_id, details)
            .await?
        else {
            let outcome = self.not_applied(&mut tx, kind, transaction_id).await?;

            tx.commit().await?;

            return Ok(outcome);
        };

        self.orders_repository
            .update_order_status(&mut tx, payment.order_uuid, OrderStatus::Paid)
            .await?;

        tx.commit().await?;

        info!(
            payment = %payment.uuid,
            order = %payment.order_uuid,
            "payment succeeded, order marked as paid"
        );

        let stock = match self.stock.reduce_for_order(payment.order_uuid).await {
            Ok(report) => report,
            Err(error) => {
                error!(%error, payment = %payment.uuid, "failed to reduce stock");

                StockReport::new()
            }
        };

        Ok(WebhookOutcome::Applied {
            kind,
            payment: payment.uuid,
            status: payment.status,
            stock,
        })
    }

    async fn apply_failure(
        &self,
        kind: EventKind,
        transaction_id: &str,
        details: Value,
    ) -> Result<WebhookOutcome, WebhooksServiceError> {
        let mut tx = self.db.begin().await?;

        let Some(payment) = self
            .payments_repository
            .mark_payment_failed(&mut tx, transaction_id, details)
            .await?
        else {
            let outcome = self.not_applied(&mut tx, kind, transaction_id).await?;

            tx.commit().await?;

            return Ok(outcome);
        };

        tx.commit().await?;

        warn!(
            payment = %payment.uuid,
            order = %payment.order_uuid,
            %kind,
            error = payment
                .raw_response
                .as_ref()
                .and_then(|raw| raw.get("error"))
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default(),
            "payment failed"
        );

        Ok(WebhookOutcome::Applied {
            kind,
            payment: payment.uuid,
            status: payment.status,
            stock: StockReport::new(),
        })
    }

    /// Tell apart a redelivery from an event for a payment we never issued.
    async fn not_applied(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        kind: EventKind,
        transaction_id: &str,
    ) -> Result<WebhookOutcome, WebhooksServiceError> {
        let existing = self
            .payments_repository
            .find_payment_by_transaction(tx, transaction_id)
            .await?;

        if let Some(payment) = existing {
            info!(
                payment = %payment.uuid,
                status = %payment.status,
                %kind,
                "payment not eligible, event already applied"
            );

            return Ok(WebhookOutcome::AlreadyApplied {
                kind,
                payment: payment.uuid,
                status: payment.status,
            });
        }

        warn!(%transaction_id, %kind, "payment record not found for event");

        Ok(WebhookOutcome::UnknownPayment {
            kind,
            transaction_id: transaction_id.to_string(),
        })
    }
}

#[async_trait]
impl WebhooksService for PgWebhooksService {
    async fn handle_event(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookOutcome, WebhooksServiceError> {
        let event = self.gateway.construct_event(payload, signature)?;

        info!(kind = %event.kind, id = ?event.id, "webhook event received");

        if let EventKind::Other(_) = event.kind {
            info!(kind = %event.kind, "unhandled webhook event type");

            return Ok(WebhookOutcome::Ignored { kind: event.kind });
        }

        let payment = event
            .payment()
            .ok_or_else(|| WebhooksServiceError::MissingPayment(event.kind.clone()))?;

        match &event.kind {
            EventKind::Succeeded => {
                self.apply_success(event.kind.clone(), &payment.id, payment.success_details())
                    .await
            }
            EventKind::Failed => {
                self.apply_failure(event.kind.clone(), &payment.id, payment.failure_details())
                    .await
            }
            EventKind::Canceled => {
                self.apply_failure(event.kind.clone(), &payment.id, payment.cancel_details())
                    .await
            }
            EventKind::Other(_) => Ok(WebhookOutcome::Ignored {
                kind: event.kind.clone(),
            }),
        }
    }
}

#[automock]
#[async_trait]
pub trait WebhooksService: Send + Sync {
    /// Verify, decode and apply one gateway delivery.
    ///
    /// Replaying a delivery never repeats its effects.
    async fn handle_event(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookOutcome, WebhooksServiceError>;
}
