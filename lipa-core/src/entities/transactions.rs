use crate::entities::{TransactionKind, unix};
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use lipa_sdk::objects::admin::TransactionResponse;
use rust_decimal::Decimal;
use sqlx::PgExecutor;
use uuid::Uuid;

/// Append-only ledger row.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub status: String,
    pub reference: String,
    pub created_at: time::OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: Uuid,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub reference: String,
}

impl TransactionRecord {
    /// Insert a completed ledger row unless one with the same
    /// `(reference, kind)` already exists.
    ///
    /// Returns `false` when the row was a duplicate. The unique constraint
    /// makes this safe under concurrent callback redelivery.
    pub async fn insert_unique<'e>(
        executor: impl PgExecutor<'e>,
        new: NewTransaction,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO transactions (id, user_id, kind, amount, status, reference) \
             VALUES ($1, $2, $3, $4, 'completed', $5) \
             ON CONFLICT (reference, kind) DO NOTHING",
        )
        .bind(Uuid::now_v7())
        .bind(new.user_id)
        .bind(new.kind)
        .bind(new.amount)
        .bind(new.reference)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[derive(Debug, Clone)]
pub struct ListRecentTransactions {
    pub user_id: Uuid,
    pub limit: i64,
}

impl Processor<ListRecentTransactions> for DatabaseProcessor {
    type Output = Vec<TransactionRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListRecentTransactions")]
    async fn process(
        &self,
        query: ListRecentTransactions,
    ) -> Result<Vec<TransactionRecord>, sqlx::Error> {
        sqlx::query_as::<_, TransactionRecord>(
            "SELECT id, user_id, kind, amount, status, reference, created_at \
             FROM transactions WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(query.user_id)
        .bind(query.limit)
        .fetch_all(&self.pool)
        .await
    }
}

impl From<TransactionRecord> for TransactionResponse {
    fn from(transaction: TransactionRecord) -> Self {
        Self {
            id: transaction.id,
            kind: transaction.kind.into(),
            amount: transaction.amount,
            reference: transaction.reference,
            created_at: unix(transaction.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    #[sqlx::test(migrations = "../migrations")]
    async fn test_same_reference_and_kind_is_inserted_once(pool: PgPool) {
        let user_id = Uuid::new_v4();
        let deposit = |kind| NewTransaction {
            user_id,
            kind,
            amount: Decimal::from(100),
            reference: "ws_CO_191220191020363925".to_string(),
        };

        assert!(TransactionRecord::insert_unique(&pool, deposit(TransactionKind::Deposit)).await.unwrap());
        assert!(!TransactionRecord::insert_unique(&pool, deposit(TransactionKind::Deposit)).await.unwrap());
        // The same reference may carry one row per kind.
        assert!(TransactionRecord::insert_unique(&pool, deposit(TransactionKind::OrderPayment)).await.unwrap());

        let rows: i64 = sqlx::query_scalar("SELECT count(*) FROM transactions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 2);
    }
}
