use crate::entities::{OrderStatus, PaymentMethod, unix};
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use lipa_sdk::objects::admin::AdminOrderResponse;
use lipa_sdk::objects::checkout::OrderResponse;
use rust_decimal::Decimal;
use sqlx::PgExecutor;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct OrderRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Option<Uuid>,
    pub quantity: i32,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub confirmation_code: Option<String>,
    pub checkout_request_id: Option<String>,
    pub bank_payment_id: Option<Uuid>,
    pub created_at: time::OffsetDateTime,
    pub updated_at: time::OffsetDateTime,
}

/// Data for inserting a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub product_id: Option<Uuid>,
    pub quantity: i32,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub confirmation_code: Option<String>,
    pub checkout_request_id: Option<String>,
    pub bank_payment_id: Option<Uuid>,
}

const COLUMNS: &str = "id, user_id, product_id, quantity, total_amount, status, payment_method, \
    confirmation_code, checkout_request_id, bank_payment_id, created_at, updated_at";

impl OrderRecord {
    pub async fn insert<'e>(
        executor: impl PgExecutor<'e>,
        new: NewOrder,
    ) -> Result<OrderRecord, sqlx::Error> {
        sqlx::query_as::<_, OrderRecord>(&format!(
            "INSERT INTO orders (id, user_id, product_id, quantity, total_amount, status, \
             payment_method, confirmation_code, checkout_request_id, bank_payment_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {COLUMNS}"
        ))
        .bind(Uuid::now_v7())
        .bind(new.user_id)
        .bind(new.product_id)
        .bind(new.quantity)
        .bind(new.total_amount)
        .bind(new.status)
        .bind(new.payment_method)
        .bind(new.confirmation_code)
        .bind(new.checkout_request_id)
        .bind(new.bank_payment_id)
        .fetch_one(executor)
        .await
    }

    /// Lock an order row for the rest of the transaction.
    pub async fn lock_by_id<'e>(
        executor: impl PgExecutor<'e>,
        order_id: Uuid,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        sqlx::query_as::<_, OrderRecord>(&format!(
            "SELECT {COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(order_id)
        .fetch_optional(executor)
        .await
    }

    pub async fn set_status<'e>(
        executor: impl PgExecutor<'e>,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        sqlx::query_as::<_, OrderRecord>(&format!(
            "UPDATE orders SET status = $2, updated_at = now() WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(order_id)
        .bind(status)
        .fetch_optional(executor)
        .await
    }

    /// Complete an approved manual top-up with the verified amount.
    pub async fn complete_with_amount<'e>(
        executor: impl PgExecutor<'e>,
        order_id: Uuid,
        amount: Decimal,
    ) -> Result<OrderRecord, sqlx::Error> {
        sqlx::query_as::<_, OrderRecord>(&format!(
            "UPDATE orders SET status = 'completed', total_amount = $2, updated_at = now() \
             WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(order_id)
        .bind(amount)
        .fetch_one(executor)
        .await
    }

    /// Move every `pending_payment` order paid by this STK request to `status`.
    pub async fn settle_for_checkout<'e>(
        executor: impl PgExecutor<'e>,
        checkout_request_id: &str,
        status: OrderStatus,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        sqlx::query_as::<_, OrderRecord>(&format!(
            "UPDATE orders SET status = $2, updated_at = now() \
             WHERE checkout_request_id = $1 AND status = 'pending_payment' RETURNING {COLUMNS}"
        ))
        .bind(checkout_request_id)
        .bind(status)
        .fetch_all(executor)
        .await
    }

    /// Complete every pending order covered by a confirmed bank payment.
    pub async fn complete_for_bank_payment<'e>(
        executor: impl PgExecutor<'e>,
        bank_payment_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE orders SET status = 'completed', updated_at = now() \
             WHERE bank_payment_id = $1 AND status = 'pending'",
        )
        .bind(bank_payment_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone)]
pub struct GetOrderById {
    pub order_id: Uuid,
}

impl Processor<GetOrderById> for DatabaseProcessor {
    type Output = Option<OrderRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetOrderById")]
    async fn process(&self, query: GetOrderById) -> Result<Option<OrderRecord>, sqlx::Error> {
        sqlx::query_as::<_, OrderRecord>(&format!("SELECT {COLUMNS} FROM orders WHERE id = $1"))
            .bind(query.order_id)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
pub struct InsertOrder(pub NewOrder);

impl Processor<InsertOrder> for DatabaseProcessor {
    type Output = OrderRecord;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertOrder")]
    async fn process(&self, insert: InsertOrder) -> Result<OrderRecord, sqlx::Error> {
        OrderRecord::insert(&self.pool, insert.0).await
    }
}

#[derive(Debug, Clone)]
pub struct UpdateOrderStatus {
    pub order_id: Uuid,
    pub status: OrderStatus,
}

impl Processor<UpdateOrderStatus> for DatabaseProcessor {
    type Output = Option<OrderRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:UpdateOrderStatus")]
    async fn process(&self, update: UpdateOrderStatus) -> Result<Option<OrderRecord>, sqlx::Error> {
        OrderRecord::set_status(&self.pool, update.order_id, update.status).await
    }
}

#[derive(Debug, Clone)]
/// One page of orders, newest first, optionally filtered by status.
pub struct ListOrders {
    pub status: Option<OrderStatus>,
    pub limit: i64,
    pub offset: i64,
}

impl Processor<ListOrders> for DatabaseProcessor {
    type Output = (Vec<OrderRecord>, i64);
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListOrders")]
    async fn process(&self, query: ListOrders) -> Result<(Vec<OrderRecord>, i64), sqlx::Error> {
        let orders = sqlx::query_as::<_, OrderRecord>(&format!(
            "SELECT {COLUMNS} FROM orders \
             WHERE ($1::order_status IS NULL OR status = $1) \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(query.status)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE ($1::order_status IS NULL OR status = $1)",
        )
        .bind(query.status)
        .fetch_one(&self.pool)
        .await?;

        Ok((orders, total))
    }
}

impl From<OrderRecord> for OrderResponse {
    fn from(order: OrderRecord) -> Self {
        Self {
            order_id: order.id,
            user_id: order.user_id,
            product_id: order.product_id,
            quantity: order.quantity,
            total_amount: order.total_amount,
            status: order.status.into(),
            payment_method: order.payment_method.into(),
            confirmation_code: order.confirmation_code,
            created_at: unix(order.created_at),
        }
    }
}

impl From<OrderRecord> for AdminOrderResponse {
    fn from(order: OrderRecord) -> Self {
        Self {
            order_id: order.id,
            user_id: order.user_id,
            product_id: order.product_id,
            quantity: order.quantity,
            total_amount: order.total_amount,
            status: order.status.into(),
            payment_method: order.payment_method.into(),
            confirmation_code: order.confirmation_code,
            checkout_request_id: order.checkout_request_id,
            bank_payment_id: order.bank_payment_id,
            created_at: unix(order.created_at),
            updated_at: unix(order.updated_at),
        }
    }
}
