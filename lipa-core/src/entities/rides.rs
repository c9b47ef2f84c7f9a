use crate::entities::{PaymentMethod, PaymentStatus, RideStatus, unix};
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use lipa_sdk::objects::ride::RideResponse;
use rust_decimal::Decimal;
use sqlx::PgExecutor;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RideRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub vehicle_class: String,
    pub vehicle_id: Uuid,
    pub price: Decimal,
    pub status: RideStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub checkout_request_id: Option<String>,
    pub created_at: time::OffsetDateTime,
    pub updated_at: time::OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewRide {
    pub user_id: Uuid,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub vehicle_class: String,
    pub vehicle_id: Uuid,
    pub price: Decimal,
    pub status: RideStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub checkout_request_id: Option<String>,
}

const COLUMNS: &str = "id, user_id, pickup_location, dropoff_location, vehicle_class, vehicle_id, \
    price, status, payment_method, payment_status, checkout_request_id, created_at, updated_at";

impl RideRecord {
    pub async fn insert<'e>(
        executor: impl PgExecutor<'e>,
        new: NewRide,
    ) -> Result<RideRecord, sqlx::Error> {
        sqlx::query_as::<_, RideRecord>(&format!(
            "INSERT INTO rides (id, user_id, pickup_location, dropoff_location, vehicle_class, \
             vehicle_id, price, status, payment_method, payment_status, checkout_request_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {COLUMNS}"
        ))
        .bind(Uuid::now_v7())
        .bind(new.user_id)
        .bind(new.pickup_location)
        .bind(new.dropoff_location)
        .bind(new.vehicle_class)
        .bind(new.vehicle_id)
        .bind(new.price)
        .bind(new.status)
        .bind(new.payment_method)
        .bind(new.payment_status)
        .bind(new.checkout_request_id)
        .fetch_one(executor)
        .await
    }

    /// Find and lock the ride an M-Pesa callback pays for.
    ///
    /// A ride linked to the checkout request wins. With `allow_unlinked`,
    /// the user's newest unlinked `pending_payment` M-Pesa ride is taken
    /// otherwise. Rides priced above `paid` are never returned. Rows already
    /// locked by a concurrent reconciliation are skipped.
    pub async fn lock_pending_for_callback<'e>(
        executor: impl PgExecutor<'e>,
        checkout_request_id: &str,
        user_id: Uuid,
        allow_unlinked: bool,
        paid: Decimal,
    ) -> Result<Option<RideRecord>, sqlx::Error> {
        sqlx::query_as::<_, RideRecord>(&format!(
            "SELECT {COLUMNS} FROM rides \
             WHERE status = 'pending_payment' AND payment_method = 'mpesa' AND price <= $4 \
               AND (checkout_request_id = $1 \
                    OR ($3 AND checkout_request_id IS NULL AND user_id = $2)) \
             ORDER BY (checkout_request_id = $1) DESC NULLS LAST, created_at DESC \
             LIMIT 1 FOR UPDATE SKIP LOCKED"
        ))
        .bind(checkout_request_id)
        .bind(user_id)
        .bind(allow_unlinked)
        .bind(paid)
        .fetch_optional(executor)
        .await
    }

    /// Move a ride out of `from`. Returns `None` when the ride is not in
    /// `from` any more.
    pub async fn transition<'e>(
        executor: impl PgExecutor<'e>,
        ride_id: Uuid,
        from: RideStatus,
        status: RideStatus,
        payment_status: PaymentStatus,
    ) -> Result<Option<RideRecord>, sqlx::Error> {
        sqlx::query_as::<_, RideRecord>(&format!(
            "UPDATE rides SET status = $3, payment_status = $4, updated_at = now() \
             WHERE id = $1 AND status = $2 RETURNING {COLUMNS}"
        ))
        .bind(ride_id)
        .bind(from)
        .bind(status)
        .bind(payment_status)
        .fetch_optional(executor)
        .await
    }

    /// Cancel rides still waiting on a failed or expired STK request.
    pub async fn cancel_pending_for_checkout<'e>(
        executor: impl PgExecutor<'e>,
        checkout_request_id: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE rides SET status = 'cancelled', payment_status = 'failed', updated_at = now() \
             WHERE checkout_request_id = $1 AND status = 'pending_payment'",
        )
        .bind(checkout_request_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone)]
pub struct GetRideById {
    pub ride_id: Uuid,
}

impl Processor<GetRideById> for DatabaseProcessor {
    type Output = Option<RideRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetRideById")]
    async fn process(&self, query: GetRideById) -> Result<Option<RideRecord>, sqlx::Error> {
        sqlx::query_as::<_, RideRecord>(&format!("SELECT {COLUMNS} FROM rides WHERE id = $1"))
            .bind(query.ride_id)
            .fetch_optional(&self.pool)
            .await
    }
}

impl From<RideRecord> for RideResponse {
    fn from(ride: RideRecord) -> Self {
        Self {
            ride_id: ride.id,
            user_id: ride.user_id,
            pickup: ride.pickup_location,
            dropoff: ride.dropoff_location,
            vehicle_class: ride.vehicle_class,
            vehicle_id: ride.vehicle_id,
            price: ride.price,
            status: ride.status.into(),
            payment_method: ride.payment_method.into(),
            payment_status: ride.payment_status.into(),
            checkout_request_id: ride.checkout_request_id,
            created_at: unix(ride.created_at),
        }
    }
}
