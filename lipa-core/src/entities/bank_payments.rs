use crate::entities::{BankPaymentStatus, BookingType, unix};
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use lipa_sdk::objects::admin::BankPaymentResponse;
use rust_decimal::Decimal;
use sqlx::PgExecutor;
use uuid::Uuid;

/// A manual bank transfer awaiting staff confirmation.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct BankPaymentRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub bank: String,
    pub account_number: String,
    pub status: BankPaymentStatus,
    pub booking_type: BookingType,
    pub ride_id: Option<Uuid>,
    pub created_at: time::OffsetDateTime,
    pub updated_at: time::OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewBankPayment {
    pub user_id: Uuid,
    pub amount: Decimal,
    pub bank: String,
    pub account_number: String,
    pub booking_type: BookingType,
}

const COLUMNS: &str = "id, user_id, amount, bank, account_number, status, booking_type, ride_id, \
    created_at, updated_at";

impl BankPaymentRecord {
    pub async fn insert<'e>(
        executor: impl PgExecutor<'e>,
        new: NewBankPayment,
    ) -> Result<BankPaymentRecord, sqlx::Error> {
        sqlx::query_as::<_, BankPaymentRecord>(&format!(
            "INSERT INTO bank_payments (id, user_id, amount, bank, account_number, booking_type) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {COLUMNS}"
        ))
        .bind(Uuid::now_v7())
        .bind(new.user_id)
        .bind(new.amount)
        .bind(new.bank)
        .bind(new.account_number)
        .bind(new.booking_type)
        .fetch_one(executor)
        .await
    }

    pub async fn attach_ride<'e>(
        executor: impl PgExecutor<'e>,
        bank_payment_id: Uuid,
        ride_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE bank_payments SET ride_id = $2, updated_at = now() WHERE id = $1")
            .bind(bank_payment_id)
            .bind(ride_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Confirm a pending bank payment. Returns `None` if it is missing or
    /// no longer pending.
    pub async fn confirm<'e>(
        executor: impl PgExecutor<'e>,
        bank_payment_id: Uuid,
    ) -> Result<Option<BankPaymentRecord>, sqlx::Error> {
        sqlx::query_as::<_, BankPaymentRecord>(&format!(
            "UPDATE bank_payments SET status = 'confirmed', updated_at = now() \
             WHERE id = $1 AND status = 'pending' RETURNING {COLUMNS}"
        ))
        .bind(bank_payment_id)
        .fetch_optional(executor)
        .await
    }
}

#[derive(Debug, Clone)]
pub struct GetBankPaymentById {
    pub bank_payment_id: Uuid,
}

impl Processor<GetBankPaymentById> for DatabaseProcessor {
    type Output = Option<BankPaymentRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetBankPaymentById")]
    async fn process(
        &self,
        query: GetBankPaymentById,
    ) -> Result<Option<BankPaymentRecord>, sqlx::Error> {
        sqlx::query_as::<_, BankPaymentRecord>(&format!(
            "SELECT {COLUMNS} FROM bank_payments WHERE id = $1"
        ))
        .bind(query.bank_payment_id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
pub struct ListBankPayments {
    pub status: Option<BankPaymentStatus>,
    pub limit: i64,
    pub offset: i64,
}

impl Processor<ListBankPayments> for DatabaseProcessor {
    type Output = (Vec<BankPaymentRecord>, i64);
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListBankPayments")]
    async fn process(
        &self,
        query: ListBankPayments,
    ) -> Result<(Vec<BankPaymentRecord>, i64), sqlx::Error> {
        let payments = sqlx::query_as::<_, BankPaymentRecord>(&format!(
            "SELECT {COLUMNS} FROM bank_payments \
             WHERE ($1::bank_payment_status IS NULL OR status = $1) \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(query.status)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bank_payments \
             WHERE ($1::bank_payment_status IS NULL OR status = $1)",
        )
        .bind(query.status)
        .fetch_one(&self.pool)
        .await?;

        Ok((payments, total))
    }
}

impl From<BankPaymentRecord> for BankPaymentResponse {
    fn from(payment: BankPaymentRecord) -> Self {
        Self {
            id: payment.id,
            user_id: payment.user_id,
            amount: payment.amount,
            bank: payment.bank,
            account_number: payment.account_number,
            status: payment.status.into(),
            ride_id: payment.ride_id,
            created_at: unix(payment.created_at),
        }
    }
}
