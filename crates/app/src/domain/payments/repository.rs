//! Payments Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use serde_json::Value;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, types::Json};

use crate::domain::{
    orders::records::OrderUuid,
    payments::{
        data::NewPayment,
        records::{PaymentProvider, PaymentRecord, PaymentStatus, PaymentUuid},
    },
    users::records::UserUuid,
};

const CREATE_PAYMENT_SQL: &str = include_str!("sql/create_payment.sql");
const GET_PAYMENT_SQL: &str = include_str!("sql/get_payment.sql");
const FIND_PAYMENT_FOR_ORDER_SQL: &str = include_str!("sql/find_payment_for_order.sql");
const FIND_PAYMENT_BY_TRANSACTION_SQL: &str = include_str!("sql/find_payment_by_transaction.sql");
const LIST_PAYMENTS_SQL: &str = include_str!("sql/list_payments.sql");
const MARK_PAYMENT_SUCCEEDED_SQL: &str = include_str!("sql/mark_payment_succeeded.sql");
const MARK_PAYMENT_FAILED_SQL: &str = include_str!("sql/mark_payment_failed.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgPaymentsRepository;

impl PgPaymentsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_payment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payment: NewPayment,
    ) -> Result<PaymentRecord, sqlx::Error> {
        query_as::<Postgres, PaymentRecord>(CREATE_PAYMENT_SQL)
            .bind(payment.uuid.into_uuid())
            .bind(payment.order.into_uuid())
            .bind(payment.provider.as_str())
            .bind(payment.transaction_id)
            .bind(Json(payment.raw_response))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_payment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payment: PaymentUuid,
    ) -> Result<PaymentRecord, sqlx::Error> {
        query_as::<Postgres, PaymentRecord>(GET_PAYMENT_SQL)
            .bind(payment.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn find_payment_for_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Option<PaymentRecord>, sqlx::Error> {
        query_as::<Postgres, PaymentRecord>(FIND_PAYMENT_FOR_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn find_payment_by_transaction(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        transaction_id: &str,
    ) -> Result<Option<PaymentRecord>, sqlx::Error> {
        query_as::<Postgres, PaymentRecord>(FIND_PAYMENT_BY_TRANSACTION_SQL)
            .bind(transaction_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Newest first; `owner` of `None` lists every payment.
    pub(crate) async fn list_payments(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: Option<UserUuid>,
    ) -> Result<Vec<PaymentRecord>, sqlx::Error> {
        query_as::<Postgres, PaymentRecord>(LIST_PAYMENTS_SQL)
            .bind(owner.map(UserUuid::into_uuid))
            .fetch_all(&mut **tx)
            .await
    }

    /// Move a pending or failed payment to success.
    ///
    /// Returns `None` when no payment with `transaction_id` is eligible, which
    /// includes one that already succeeded.
    #[tracing::instrument(
        name = "payments.repository.mark_payment_succeeded",
        skip(self, tx, raw_response),
        err
    )]
    pub(crate) async fn mark_payment_succeeded(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        transaction_id: &str,
        raw_response: Value,
    ) -> Result<Option<PaymentRecord>, sqlx::Error> {
        query_as::<Postgres, PaymentRecord>(MARK_PAYMENT_SUCCEEDED_SQL)
            .bind(transaction_id)
            .bind(Json(raw_response))
            .fetch_optional(&mut **tx)
            .await
    }

    /// Move a pending payment to failed; `None` when it isn't pending.
    #[tracing::instrument(
        name = "payments.repository.mark_payment_failed",
        skip(self, tx, raw_response),
        err
    )]
    pub(crate) async fn mark_payment_failed(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        transaction_id: &str,
        raw_response: Value,
    ) -> Result<Option<PaymentRecord>, sqlx::Error> {
        query_as::<Postgres, PaymentRecord>(MARK_PAYMENT_FAILED_SQL)
            .bind(transaction_id)
            .bind(Json(raw_response))
            .fetch_optional(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for PaymentRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status = row
            .try_get::<String, _>("status")?
            .parse::<PaymentStatus>()
            .map_err(|error| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: Box::new(error),
            })?;

        let provider = row
            .try_get::<String, _>("provider")?
            .parse::<PaymentProvider>()
            .map_err(|error| sqlx::Error::ColumnDecode {
                index: "provider".to_string(),
                source: Box::new(error),
            })?;

        Ok(Self {
            uuid: PaymentUuid::from_uuid(row.try_get("uuid")?),
            order_uuid: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            provider,
            transaction_id: row.try_get("transaction_id")?,
            status,
            raw_response: row
                .try_get::<Option<Json<Value>>, _>("raw_response")?
                .map(|json| json.0),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
