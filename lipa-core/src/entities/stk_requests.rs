use crate::entities::{StkPurpose, StkStatus};
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use sqlx::PgExecutor;
use uuid::Uuid;

/// A push-payment prompt the gateway accepted, keyed by its
/// `CheckoutRequestID`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StkRequestRecord {
    pub checkout_request_id: String,
    pub merchant_request_id: Option<String>,
    pub user_id: Option<Uuid>,
    pub phone: String,
    pub amount: Decimal,
    pub purpose: StkPurpose,
    pub status: StkStatus,
    pub result_code: Option<i64>,
    pub result_desc: Option<String>,
    pub receipt_number: Option<String>,
    pub created_at: time::OffsetDateTime,
    pub updated_at: time::OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewStkRequest {
    pub checkout_request_id: String,
    pub merchant_request_id: Option<String>,
    pub user_id: Option<Uuid>,
    pub phone: String,
    pub amount: Decimal,
    pub purpose: StkPurpose,
}

const COLUMNS: &str = "checkout_request_id, merchant_request_id, user_id, phone, amount, purpose, \
    status, result_code, result_desc, receipt_number, created_at, updated_at";

impl StkRequestRecord {
    pub async fn insert<'e>(
        executor: impl PgExecutor<'e>,
        new: NewStkRequest,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO stk_requests \
             (checkout_request_id, merchant_request_id, user_id, phone, amount, purpose) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(new.checkout_request_id)
        .bind(new.merchant_request_id)
        .bind(new.user_id)
        .bind(new.phone)
        .bind(new.amount)
        .bind(new.purpose)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn lock<'e>(
        executor: impl PgExecutor<'e>,
        checkout_request_id: &str,
    ) -> Result<Option<StkRequestRecord>, sqlx::Error> {
        sqlx::query_as::<_, StkRequestRecord>(&format!(
            "SELECT {COLUMNS} FROM stk_requests WHERE checkout_request_id = $1 FOR UPDATE"
        ))
        .bind(checkout_request_id)
        .fetch_optional(executor)
        .await
    }

    /// Record the gateway's verdict on a request that is still open
    /// (`pending` or `expired`). Returns whether the request was open.
    pub async fn finish<'e>(
        executor: impl PgExecutor<'e>,
        checkout_request_id: &str,
        status: StkStatus,
        result_code: i64,
        result_desc: Option<&str>,
        receipt_number: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE stk_requests SET status = $2, result_code = $3, result_desc = $4, \
             receipt_number = $5, updated_at = now() \
             WHERE checkout_request_id = $1 AND status IN ('pending', 'expired')",
        )
        .bind(checkout_request_id)
        .bind(status)
        .bind(result_code)
        .bind(result_desc)
        .bind(receipt_number)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark requests that have waited longer than `cutoff` as expired and
    /// return their ids.
    pub async fn expire_older_than<'e>(
        executor: impl PgExecutor<'e>,
        cutoff: time::OffsetDateTime,
        limit: i64,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE stk_requests SET status = 'expired', updated_at = now() \
             WHERE checkout_request_id IN ( \
                 SELECT checkout_request_id FROM stk_requests \
                 WHERE status = 'pending' AND created_at < $1 \
                 ORDER BY created_at LIMIT $2 FOR UPDATE SKIP LOCKED) \
             RETURNING checkout_request_id",
        )
        .bind(cutoff)
        .bind(limit)
        .fetch_all(executor)
        .await
    }
}

#[derive(Debug, Clone)]
pub struct InsertStkRequest(pub NewStkRequest);

impl Processor<InsertStkRequest> for DatabaseProcessor {
    type Output = ();
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertStkRequest")]
    async fn process(&self, insert: InsertStkRequest) -> Result<(), sqlx::Error> {
        StkRequestRecord::insert(&self.pool, insert.0).await
    }
}
